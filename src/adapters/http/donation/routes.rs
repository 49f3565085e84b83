//! Axum router configuration for donation endpoints.

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use super::handlers::{
    create_checkout_redirect_get, create_checkout_redirect_post, create_checkout_session,
    get_donation_count, handle_stripe_webhook, health, method_not_allowed, DonationAppState,
};

/// Create the donation API router, mounted at `/api`.
///
/// # Routes
/// - `POST /stripe-webhook` - Stripe webhook deliveries (signature verified)
/// - `POST /create-checkout-session` - Start checkout, JSON `{ url }`
/// - `GET|POST /create-checkout-redirect` - Start checkout, 302 to Stripe
/// - `GET /donation-count` - Public counter
///
/// Any other method on these paths gets 405.
pub fn donation_routes() -> Router<DonationAppState> {
    Router::new()
        .route(
            "/stripe-webhook",
            post(handle_stripe_webhook).fallback(method_not_allowed),
        )
        .route(
            "/create-checkout-session",
            post(create_checkout_session).fallback(method_not_allowed),
        )
        .route(
            "/create-checkout-redirect",
            get(create_checkout_redirect_get)
                .post(create_checkout_redirect_post)
                .fallback(method_not_allowed),
        )
        .route(
            "/donation-count",
            get(get_donation_count).fallback(method_not_allowed),
        )
}

/// Create the complete router: `/api/*` plus `/health`.
///
/// # Example
///
/// ```ignore
/// let app = donation_router().with_state(app_state);
/// ```
pub fn donation_router() -> Router<DonationAppState> {
    Router::new()
        .nest("/api", donation_routes())
        .route("/health", get(health))
}

/// Wrap the router with request tracing, the overall request timeout, and CORS.
///
/// With no configured origins any origin is allowed.
pub fn with_middleware(router: Router, server: &ServerConfig) -> Router {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let cors = if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    };

    router
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
