//! HandleDonationWebhookHandler - Command handler for Stripe webhook deliveries.
//!
//! Verifies the delivery, then turns a completed checkout into a stored
//! donation and a thank-you email. Once amount validation has passed, nothing
//! downstream can fail the request: insert exhaustion, lookup errors, and
//! email errors are reported as outcome values and the event is still
//! acknowledged, since Stripe redelivers on any non-2xx response.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::donation::{
    DonationAmount, DonationRecord, NewDonation, PersistOutcome, RetryPolicy, ThankYouEmail,
    ThankYouTemplate, WebhookError,
};
use crate::domain::foundation::DonationId;
use crate::ports::{
    CheckoutCompleted, DonationRepository, EmailSender, InsertOutcome, PaymentProvider, Sleeper,
    WebhookEvent, WebhookEventData, WebhookEventRecord, WebhookEventRepository, WebhookEventType,
};

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleDonationWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if the request carried one.
    pub signature: Option<String>,
}

/// What happened to the thank-you email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent(ThankYouTemplate),
    SkippedNoEmail,
    SkippedDuplicate,
    Failed(String),
}

impl NotificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationOutcome::Sent(_) => "sent",
            NotificationOutcome::SkippedNoEmail => "skipped_no_email",
            NotificationOutcome::SkippedDuplicate => "skipped_duplicate",
            NotificationOutcome::Failed(_) => "failed",
        }
    }
}

/// The donation a checkout event described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationSummary {
    pub stripe_id: String,
    /// Major units
    pub amount: Decimal,
    pub donor_name: String,
    pub has_email: bool,
    /// Set when this delivery wrote the row.
    pub donation_id: Option<DonationId>,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleDonationWebhookResult {
    /// Completed checkout processed.
    DonationRecorded {
        event_id: String,
        event_type: String,
        donation: DonationSummary,
        persist: PersistOutcome,
        notification: NotificationOutcome,
    },
    /// Known event kind with nothing to do.
    Acknowledged { event_id: String, event_type: String },
    /// Unknown event kind.
    Ignored { event_id: String, event_type: String },
    /// The ledger already holds a successful run for this event.
    AlreadyProcessed { event_id: String, event_type: String },
}

impl HandleDonationWebhookResult {
    pub fn event_id(&self) -> &str {
        match self {
            HandleDonationWebhookResult::DonationRecorded { event_id, .. }
            | HandleDonationWebhookResult::Acknowledged { event_id, .. }
            | HandleDonationWebhookResult::Ignored { event_id, .. }
            | HandleDonationWebhookResult::AlreadyProcessed { event_id, .. } => event_id,
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            HandleDonationWebhookResult::DonationRecorded { event_type, .. }
            | HandleDonationWebhookResult::Acknowledged { event_type, .. }
            | HandleDonationWebhookResult::Ignored { event_type, .. }
            | HandleDonationWebhookResult::AlreadyProcessed { event_type, .. } => event_type,
        }
    }
}

/// Handler for Stripe webhook deliveries.
pub struct HandleDonationWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    donations: Arc<dyn DonationRepository>,
    email_sender: Arc<dyn EmailSender>,
    webhook_events: Arc<dyn WebhookEventRepository>,
    sleeper: Arc<dyn Sleeper>,
    retry_policy: RetryPolicy,
}

impl HandleDonationWebhookHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        donations: Arc<dyn DonationRepository>,
        email_sender: Arc<dyn EmailSender>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            payment_provider,
            donations,
            email_sender,
            webhook_events,
            sleeper,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub async fn handle(
        &self,
        cmd: HandleDonationWebhookCommand,
    ) -> Result<HandleDonationWebhookResult, WebhookError> {
        // 1. Verify webhook signature and parse event
        let signature = cmd
            .signature
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let event = self
            .payment_provider
            .verify_webhook(&cmd.payload, &signature)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook verification failed");
                WebhookError::InvalidSignature(e.message)
            })?;

        // 2. Dispatch on event type
        match &event.event_type {
            WebhookEventType::CheckoutSessionCompleted => self.handle_checkout_completed(&event).await,
            WebhookEventType::PaymentIntentFailed => {
                if let WebhookEventData::PaymentFailed {
                    payment_intent_id,
                    failure_message,
                } = &event.data
                {
                    tracing::warn!(
                        event_id = %event.id,
                        payment_intent_id = %payment_intent_id,
                        failure_message = failure_message.as_deref().unwrap_or("unknown"),
                        "Payment failed"
                    );
                }
                self.record(WebhookEventRecord::ignored(
                    &event.id,
                    event.event_type.as_str(),
                    "payment failure acknowledged",
                    event_payload(&event),
                ))
                .await;
                Ok(HandleDonationWebhookResult::Acknowledged {
                    event_id: event.id.clone(),
                    event_type: event.event_type.to_string(),
                })
            }
            WebhookEventType::Unknown(kind) => {
                tracing::debug!(event_id = %event.id, event_type = %kind, "Unhandled event type");
                Ok(HandleDonationWebhookResult::Ignored {
                    event_id: event.id.clone(),
                    event_type: kind.clone(),
                })
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event: &WebhookEvent,
    ) -> Result<HandleDonationWebhookResult, WebhookError> {
        let checkout = match &event.data {
            WebhookEventData::Checkout(checkout) => checkout,
            _ => {
                return Err(WebhookError::Infrastructure(
                    "Unexpected webhook data type for checkout.session.completed".to_string(),
                ))
            }
        };
        let event_type = event.event_type.to_string();

        // 3. Skip events the ledger already marks as done
        match self.webhook_events.find_by_event_id(&event.id).await {
            Ok(Some(existing)) if existing.is_final() => {
                tracing::info!(event_id = %event.id, "Webhook event already processed");
                return Ok(HandleDonationWebhookResult::AlreadyProcessed {
                    event_id: event.id.clone(),
                    event_type,
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Webhook ledger lookup failed");
            }
        }

        // 4. Validate amount and donor fields
        let donation = Self::new_donation(checkout).map_err(|e| {
            tracing::warn!(event_id = %event.id, error = %e, "Rejected checkout event");
            e
        })?;

        // 5. Prior donations decide which thank-you template to use
        let prior_count = match donation.customer_email() {
            Some(email) => match self.donations.count_by_email(email).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!(event_id = %event.id, error = %e, "Repeat donor lookup failed");
                    0
                }
            },
            None => 0,
        };

        // 6. Insert with retry
        let (persist, record) = self.insert_with_retry(&event.id, &donation).await;

        // 7. Thank the donor
        let notification = self.notify(&event.id, &donation, prior_count, &persist).await;

        // 8. Record the outcome
        let ledger_entry = match &persist {
            PersistOutcome::Failed { last_error, .. } => WebhookEventRecord::failed(
                &event.id,
                &event_type,
                last_error.clone(),
                event_payload(event),
            ),
            _ => WebhookEventRecord::success(&event.id, &event_type, event_payload(event)),
        };
        self.record(ledger_entry).await;

        tracing::info!(
            event_id = %event.id,
            stripe_id = %donation.stripe_id(),
            amount = %donation.amount(),
            amount_minor = donation.amount().minor_units(),
            anonymous = donation.customer_name().is_placeholder(),
            persist = persist.as_str(),
            stored = persist.is_stored(),
            notification = notification.as_str(),
            "Checkout donation processed"
        );

        Ok(HandleDonationWebhookResult::DonationRecorded {
            event_id: event.id.clone(),
            event_type,
            donation: DonationSummary {
                stripe_id: donation.stripe_id().to_string(),
                amount: donation.amount().to_major_units(),
                donor_name: donation.customer_name().as_str().to_string(),
                has_email: donation.customer_email().is_some(),
                donation_id: record.map(|r| r.id),
            },
            persist,
            notification,
        })
    }

    fn new_donation(checkout: &CheckoutCompleted) -> Result<NewDonation, WebhookError> {
        let amount = DonationAmount::from_provider_total(checkout.amount_total)?;
        let donation = NewDonation::new(
            checkout.session_id.clone(),
            amount,
            checkout.customer_email.as_deref(),
            checkout.customer_name.as_deref(),
        )?;
        Ok(donation)
    }

    /// Runs the insert under the retry policy, sleeping after every failed attempt.
    async fn insert_with_retry(
        &self,
        event_id: &str,
        donation: &NewDonation,
    ) -> (PersistOutcome, Option<DonationRecord>) {
        let max_attempts = self.retry_policy.max_attempts();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.donations.insert(donation).await {
                Ok(InsertOutcome::Inserted(record)) => {
                    let outcome = if attempt == 1 {
                        PersistOutcome::Persisted
                    } else {
                        PersistOutcome::PersistedAfterRetry { attempts: attempt }
                    };
                    return (outcome, Some(record));
                }
                Ok(InsertOutcome::Duplicate) => {
                    tracing::info!(
                        event_id = %event_id,
                        stripe_id = %donation.stripe_id(),
                        "Donation already stored"
                    );
                    return (PersistOutcome::Duplicate, None);
                }
                Err(e) => {
                    let delay = self.retry_policy.delay_after(attempt);
                    tracing::warn!(
                        event_id = %event_id,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Donation insert failed"
                    );
                    last_error = e.to_string();
                    self.sleeper.sleep(delay).await;
                }
            }
        }

        tracing::error!(
            event_id = %event_id,
            stripe_id = %donation.stripe_id(),
            attempts = max_attempts,
            waited_ms = self.retry_policy.total_backoff().as_millis() as u64,
            error = %last_error,
            "Donation insert gave up"
        );

        (
            PersistOutcome::Failed {
                attempts: max_attempts,
                last_error,
            },
            None,
        )
    }

    async fn notify(
        &self,
        event_id: &str,
        donation: &NewDonation,
        prior_count: i64,
        persist: &PersistOutcome,
    ) -> NotificationOutcome {
        if !persist.should_notify() {
            return NotificationOutcome::SkippedDuplicate;
        }
        let Some(to) = donation.customer_email() else {
            return NotificationOutcome::SkippedNoEmail;
        };

        let template = ThankYouTemplate::for_prior_count(prior_count);
        let email = ThankYouEmail::new(
            to,
            donation.customer_name().first_name(),
            donation.amount().to_major_units(),
            template,
        );

        match self.email_sender.send_thank_you(&email).await {
            Ok(_) => NotificationOutcome::Sent(template),
            Err(e) => {
                tracing::error!(
                    event_id = %event_id,
                    template = %template,
                    error = %e,
                    "Thank-you email failed"
                );
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }

    async fn record(&self, entry: WebhookEventRecord) {
        let event_id = entry.event_id.clone();
        if let Err(e) = self.webhook_events.save(entry).await {
            tracing::warn!(event_id = %event_id, error = %e, "Failed to record webhook event");
        }
    }
}

fn event_payload(event: &WebhookEvent) -> serde_json::Value {
    serde_json::to_value(event).unwrap_or(serde_json::Value::Null)
}
