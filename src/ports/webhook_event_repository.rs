//! WebhookEventRepository port - Ledger of processed Stripe webhook events.
//!
//! Stripe may deliver the same event more than once: after a network timeout,
//! after a 5xx from this service, or when our 200 never reached Stripe. The
//! ledger lets the webhook handler skip events it has already applied, on top
//! of the `UNIQUE(stripe_id)` guard on the donations table.
//!
//! A `failed` entry does not block redelivery: saving a later outcome for the
//! same event replaces it. Only a `success` entry is final.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::foundation::DomainError;

/// Processing result stored for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventStatus {
    Success,
    Ignored,
    Failed,
}

impl WebhookEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventStatus::Success => "success",
            WebhookEventStatus::Ignored => "ignored",
            WebhookEventStatus::Failed => "failed",
        }
    }

    /// Parses the stored column value. Unknown values read as `Failed` so the
    /// event stays eligible for reprocessing.
    pub fn from_db(value: &str) -> Self {
        match value {
            "success" => WebhookEventStatus::Success,
            "ignored" => WebhookEventStatus::Ignored,
            _ => WebhookEventStatus::Failed,
        }
    }
}

impl fmt::Display for WebhookEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Stripe event type (e.g., "checkout.session.completed").
    pub event_type: String,

    pub processed_at: DateTime<Utc>,

    pub status: WebhookEventStatus,

    /// Reason for `ignored` or `failed`.
    pub error_message: Option<String>,

    /// Original event payload for auditing.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    fn new(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        status: WebhookEventStatus,
        error_message: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            status,
            error_message,
            payload,
        }
    }

    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(event_id, event_type, WebhookEventStatus::Success, None, payload)
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(
            event_id,
            event_type,
            WebhookEventStatus::Ignored,
            Some(reason.into()),
            payload,
        )
    }

    pub fn failed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(
            event_id,
            event_type,
            WebhookEventStatus::Failed,
            Some(error.into()),
            payload,
        )
    }

    /// Whether redeliveries of this event must be skipped.
    pub fn is_final(&self) -> bool {
        self.status == WebhookEventStatus::Success
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was written (new event, or replaced a non-final entry).
    Inserted,
    /// A final record already exists; nothing was written.
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations should rely on a PRIMARY KEY on `event_id` so concurrent
/// deliveries of one event cannot both be recorded as new.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously recorded event by its Stripe event ID.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Save a processing result; see [`SaveResult`] for conflict handling.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory implementation with the same conflict rules as Postgres.
    struct InMemoryWebhookEventRepository {
        records: Arc<RwLock<HashMap<String, WebhookEventRecord>>>,
    }

    impl InMemoryWebhookEventRepository {
        fn new() -> Self {
            Self {
                records: Arc::new(RwLock::new(HashMap::new())),
            }
        }
    }

    #[async_trait]
    impl WebhookEventRepository for InMemoryWebhookEventRepository {
        async fn find_by_event_id(
            &self,
            event_id: &str,
        ) -> Result<Option<WebhookEventRecord>, DomainError> {
            let records = self.records.read().await;
            Ok(records.get(event_id).cloned())
        }

        async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
            let mut records = self.records.write().await;
            match records.get(&record.event_id) {
                Some(existing) if existing.is_final() => Ok(SaveResult::AlreadyExists),
                _ => {
                    records.insert(record.event_id.clone(), record);
                    Ok(SaveResult::Inserted)
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════
    // WebhookEventRecord Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn success_record_is_final() {
        let record = WebhookEventRecord::success(
            "evt_123",
            "checkout.session.completed",
            serde_json::json!({"id": "evt_123"}),
        );

        assert_eq!(record.status, WebhookEventStatus::Success);
        assert!(record.error_message.is_none());
        assert!(record.is_final());
    }

    #[test]
    fn failed_record_includes_error_and_is_not_final() {
        let record = WebhookEventRecord::failed(
            "evt_789",
            "checkout.session.completed",
            "insert failed after 3 attempts",
            serde_json::json!({}),
        );

        assert_eq!(record.status, WebhookEventStatus::Failed);
        assert_eq!(
            record.error_message.as_deref(),
            Some("insert failed after 3 attempts")
        );
        assert!(!record.is_final());
    }

    #[test]
    fn ignored_record_includes_reason() {
        let record = WebhookEventRecord::ignored(
            "evt_456",
            "customer.created",
            "unhandled event type",
            serde_json::json!({}),
        );
        assert_eq!(record.status.to_string(), "ignored");
        assert!(!record.is_final());
    }

    #[test]
    fn status_round_trips_through_column_value() {
        for status in [
            WebhookEventStatus::Success,
            WebhookEventStatus::Ignored,
            WebhookEventStatus::Failed,
        ] {
            assert_eq!(WebhookEventStatus::from_db(status.as_str()), status);
        }
        assert_eq!(
            WebhookEventStatus::from_db("garbage"),
            WebhookEventStatus::Failed
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Repository Contract Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn find_returns_none_for_new_event() {
        let repo = InMemoryWebhookEventRepository::new();
        assert!(repo.find_by_event_id("evt_new").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_success_is_rejected() {
        let repo = InMemoryWebhookEventRepository::new();
        let first = WebhookEventRecord::success("evt_dup", "type", serde_json::json!({}));
        let second = WebhookEventRecord::success("evt_dup", "type", serde_json::json!({}));

        assert_eq!(repo.save(first).await.unwrap(), SaveResult::Inserted);
        assert_eq!(repo.save(second).await.unwrap(), SaveResult::AlreadyExists);
    }

    #[tokio::test]
    async fn success_replaces_earlier_failure() {
        let repo = InMemoryWebhookEventRepository::new();
        repo.save(WebhookEventRecord::failed(
            "evt_retry",
            "checkout.session.completed",
            "db down",
            serde_json::json!({}),
        ))
        .await
        .unwrap();

        let result = repo
            .save(WebhookEventRecord::success(
                "evt_retry",
                "checkout.session.completed",
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(result, SaveResult::Inserted);
        let found = repo.find_by_event_id("evt_retry").await.unwrap().unwrap();
        assert!(found.is_final());
    }
}
