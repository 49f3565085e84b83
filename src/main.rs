//! coffee-fund server binary.
//!
//! Loads configuration from `COFFEE_FUND__*` environment variables, wires the
//! Stripe, Postgres and Resend adapters into the donation router, and serves it.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coffee_fund::adapters::email::{ResendConfig, ResendEmailSender};
use coffee_fund::adapters::http::{donation_router, with_middleware, DonationAppState};
use coffee_fund::adapters::postgres::{
    PostgresDonationRepository, PostgresWebhookEventRepository,
};
use coffee_fund::adapters::runtime::TokioSleeper;
use coffee_fund::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use coffee_fund::config::AppConfig;
use coffee_fund::domain::donation::RetryPolicy;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let addr = config.server.socket_addr()?;

    // Connections are opened on first use so the counter can fall back while
    // the database is unreachable.
    let pool = config
        .database
        .pool_options()
        .connect_lazy(&config.database.url)?;
    tracing::info!(database = %config.database.redacted_url(), "Database pool configured");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let state = DonationAppState {
        payment_provider: Arc::new(StripePaymentAdapter::new(StripeConfig::from_payment_config(
            &config.payment,
        ))),
        donation_repository: Arc::new(PostgresDonationRepository::new(pool.clone())),
        email_sender: Arc::new(ResendEmailSender::new(ResendConfig::from_email_config(
            &config.email,
        ))),
        webhook_event_repository: Arc::new(PostgresWebhookEventRepository::new(pool)),
        sleeper: Arc::new(TokioSleeper),
        checkout: config.checkout.clone(),
        retry_policy: RetryPolicy::default(),
        expose_error_details: config.expose_error_details(),
    };

    let app = with_middleware(donation_router().with_state(state), &config.server);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "coffee-fund listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() || config.features.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
