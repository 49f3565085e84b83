//! CreateCheckoutHandler - Command handler for starting a donation checkout.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::CheckoutConfig;
use crate::domain::donation::{CheckoutAmount, DonationError};
use crate::ports::{CreateCheckoutRequest, PaymentError, PaymentProvider};

/// Metadata `type` attached to every session.
pub const CHECKOUT_METADATA_TYPE: &str = "coffee_support";

/// Command to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    /// Amount in major units as the payer sent it.
    pub amount: String,
}

/// A session the payer can be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutResult {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateCheckoutError {
    #[error(transparent)]
    InvalidAmount(#[from] DonationError),

    #[error("Failed to create checkout session: {0}")]
    Provider(#[from] PaymentError),
}

pub struct CreateCheckoutHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    config: CheckoutConfig,
}

impl CreateCheckoutHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, config: CheckoutConfig) -> Self {
        Self {
            payment_provider,
            config,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, CreateCheckoutError> {
        // 1. Validate amount
        let amount =
            CheckoutAmount::parse(&cmd.amount, self.config.min_amount, self.config.max_amount)?;

        // 2. Build a single-line-item session
        let mut metadata = BTreeMap::new();
        metadata.insert("amount".to_string(), amount.to_string());
        metadata.insert("type".to_string(), CHECKOUT_METADATA_TYPE.to_string());

        let request = CreateCheckoutRequest {
            unit_amount: amount.unit_amount(),
            currency: self.config.currency.clone(),
            product_name: self.config.product_name.clone(),
            product_description: self.config.product_description.clone(),
            success_url: self.config.success_url(),
            cancel_url: self.config.cancel_url(),
            metadata,
        };

        // 3. Ask the provider for a hosted page
        let session = self
            .payment_provider
            .create_checkout_session(request)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, amount = %amount, "Checkout session creation failed");
                e
            })?;

        tracing::info!(session_id = %session.id, amount = %amount, "Checkout session created");

        Ok(CreateCheckoutResult {
            session_id: session.id,
            url: session.url,
        })
    }
}
