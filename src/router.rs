//! Routes newly created objects to their destination bucket
//!
//! Each record goes RECEIVED → DECODED → CLASSIFIED → COPIED → DELETED, one
//! record at a time and in delivery order. The first failure stops the batch
//! and is returned unchanged; records relocated before it stay relocated.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::classify::{
    classify_key, decode_key, file_name, is_directory_marker, strip_extension, Classification,
};
use crate::config::RouterConfig;
use crate::error::{Result, SorterError};
use crate::event::{NotificationRecord, S3Event};
use crate::store::ObjectStore;

/// Message returned in the handler response body
pub const SUCCESS_MESSAGE: &str = "Files processed successfully";

/// A record that was (or would be) moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    pub source_bucket: String,
    /// Decoded key, identical at source and destination
    pub key: String,
    pub destination_bucket: String,
    pub classification: Classification,
}

/// Why a record was left where it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Key ends in `/`; a zero-byte folder placeholder, not a file
    DirectoryMarker,
}

/// A record the router deliberately did not relocate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub source_bucket: String,
    pub key: String,
    pub reason: SkipReason,
}

/// What the router intends to do with one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordPlan {
    Relocate(Relocation),
    Skip(SkippedRecord),
}

/// Result of a fully successful batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteOutcome {
    /// Relocated records in input order
    pub relocated: Vec<Relocation>,
    pub skipped: Vec<SkippedRecord>,
}

impl RouteOutcome {
    /// Number of records handled, relocated or skipped
    pub fn total(&self) -> usize {
        self.relocated.len() + self.skipped.len()
    }
}

/// Value returned to the invoking platform on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded message string
    pub body: String,
}

impl HandlerResponse {
    pub fn success() -> Self {
        Self {
            status_code: 200,
            body: serde_json::Value::from(SUCCESS_MESSAGE).to_string(),
        }
    }
}

/// Decode, classify and pick a destination for one record
pub fn plan(config: &RouterConfig, record: &NotificationRecord) -> Result<RecordPlan> {
    let key = decode_key(&record.encoded_key).map_err(|e| SorterError::Decode {
        bucket: record.source_bucket.clone(),
        key: record.encoded_key.clone(),
        reason: e.to_string(),
    })?;

    if is_directory_marker(&key) {
        return Ok(RecordPlan::Skip(SkippedRecord {
            source_bucket: record.source_bucket.clone(),
            key,
            reason: SkipReason::DirectoryMarker,
        }));
    }

    let filename = file_name(&key);
    let basename = strip_extension(filename);
    let classification = classify_key(&key);
    debug!(filename, basename, %classification, "Classified object name");

    Ok(RecordPlan::Relocate(Relocation {
        source_bucket: record.source_bucket.clone(),
        destination_bucket: classification.destination(config).to_string(),
        key,
        classification,
    }))
}

/// Plan every record of a batch, stopping at the first undecodable key
pub fn plan_batch(config: &RouterConfig, records: &[NotificationRecord]) -> Result<Vec<RecordPlan>> {
    records.iter().map(|r| plan(config, r)).collect()
}

/// Sorts objects into the numeric and non-numeric destination buckets
pub struct Router {
    store: Arc<dyn ObjectStore>,
    config: RouterConfig,
}

impl Router {
    /// Create a router over an injected store
    pub fn new(store: Arc<dyn ObjectStore>, config: RouterConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Decode, classify and pick a destination without touching the store
    pub fn plan(&self, record: &NotificationRecord) -> Result<RecordPlan> {
        plan(&self.config, record)
    }

    pub fn plan_batch(&self, records: &[NotificationRecord]) -> Result<Vec<RecordPlan>> {
        plan_batch(&self.config, records)
    }

    /// Relocate every record in order, failing fast
    pub async fn process(&self, records: &[NotificationRecord]) -> Result<RouteOutcome> {
        let mut outcome = RouteOutcome::default();

        for record in records {
            info!(
                bucket = %record.source_bucket,
                key = %record.encoded_key,
                "Processing object"
            );

            match self.plan(record)? {
                RecordPlan::Skip(skipped) => {
                    warn!(
                        bucket = %skipped.source_bucket,
                        key = %skipped.key,
                        "Skipping directory marker"
                    );
                    outcome.skipped.push(skipped);
                }
                RecordPlan::Relocate(relocation) => {
                    self.relocate(&relocation).await?;
                    outcome.relocated.push(relocation);
                }
            }
        }

        Ok(outcome)
    }

    async fn relocate(&self, relocation: &Relocation) -> Result<()> {
        let Relocation {
            source_bucket,
            key,
            destination_bucket,
            classification,
        } = relocation;

        info!(
            "Copying s3://{}/{} to s3://{}/{} ({})",
            source_bucket, key, destination_bucket, key, classification
        );
        self.store
            .copy_object(source_bucket, key, destination_bucket, key)
            .await
            .map_err(|source| SorterError::CopyFailed {
                bucket: source_bucket.clone(),
                key: key.clone(),
                destination: destination_bucket.clone(),
                source,
            })?;

        debug!("Deleting s3://{}/{}", source_bucket, key);
        self.store
            .delete_object(source_bucket, key)
            .await
            .map_err(|source| SorterError::DeleteFailed {
                bucket: source_bucket.clone(),
                key: key.clone(),
                destination: destination_bucket.clone(),
                source,
            })?;

        info!(
            "Moved s3://{}/{} to s3://{}/{}",
            source_bucket, key, destination_bucket, key
        );
        Ok(())
    }

    /// Run one invocation for a notification event
    ///
    /// On failure the error and the offending event are logged and the error
    /// is returned as-is so the platform can apply its own retry policy.
    pub async fn handle_event(&self, event: &S3Event) -> Result<HandlerResponse> {
        info!(
            destination1 = self.config.destination1(),
            destination2 = self.config.destination2(),
            records = event.records.len(),
            "Handling S3 event"
        );

        match self.process(&event.records()).await {
            Ok(outcome) => {
                info!(
                    relocated = outcome.relocated.len(),
                    skipped = outcome.skipped.len(),
                    "Event processed"
                );
                Ok(HandlerResponse::success())
            }
            Err(e) => {
                error!(
                    category = %e.category(),
                    retryable = e.is_retryable(),
                    "Error processing files: {}",
                    e
                );
                error!("Event: {}", event.to_json());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};

    fn router_with(store: &MemoryStore) -> Router {
        let config = RouterConfig::new("other", "numeric").unwrap();
        Router::new(Arc::new(store.clone()), config)
    }

    #[test]
    fn test_plan_numeric() {
        let router = router_with(&MemoryStore::new());
        let plan = router
            .plan(&NotificationRecord::new("incoming", "uploads/123.txt"))
            .unwrap();
        assert_eq!(
            plan,
            RecordPlan::Relocate(Relocation {
                source_bucket: "incoming".to_string(),
                key: "uploads/123.txt".to_string(),
                destination_bucket: "numeric".to_string(),
                classification: Classification::Numeric,
            })
        );
    }

    #[test]
    fn test_plan_decodes_before_classifying() {
        let router = router_with(&MemoryStore::new());
        let plan = router
            .plan(&NotificationRecord::new("incoming", "my+report%281%29.doc"))
            .unwrap();
        match plan {
            RecordPlan::Relocate(r) => {
                assert_eq!(r.key, "my report(1).doc");
                assert_eq!(r.destination_bucket, "other");
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_plan_directory_marker() {
        let router = router_with(&MemoryStore::new());
        let plan = router
            .plan(&NotificationRecord::new("incoming", "photos/"))
            .unwrap();
        assert!(matches!(
            plan,
            RecordPlan::Skip(SkippedRecord {
                reason: SkipReason::DirectoryMarker,
                ..
            })
        ));
    }

    #[test]
    fn test_plan_decode_error_carries_record() {
        let router = router_with(&MemoryStore::new());
        let err = router
            .plan(&NotificationRecord::new("incoming", "%FF.txt"))
            .unwrap_err();
        assert_eq!(err.record(), Some(("incoming", "%FF.txt")));
    }

    #[tokio::test]
    async fn test_process_moves_object() {
        let store = MemoryStore::new();
        store.put("incoming", "42", b"payload");
        let router = router_with(&store);

        let outcome = router
            .process(&[NotificationRecord::new("incoming", "42")])
            .await
            .unwrap();

        assert_eq!(outcome.relocated.len(), 1);
        assert!(!store.contains("incoming", "42"));
        assert_eq!(store.data("numeric", "42").unwrap().as_ref(), b"payload");
        assert_eq!(
            store.journal(),
            vec![
                StoreOp::Copy {
                    src_bucket: "incoming".to_string(),
                    src_key: "42".to_string(),
                    dst_bucket: "numeric".to_string(),
                    dst_key: "42".to_string(),
                },
                StoreOp::Delete {
                    bucket: "incoming".to_string(),
                    key: "42".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_process_empty_batch() {
        let store = MemoryStore::new();
        let outcome = router_with(&store).process(&[]).await.unwrap();
        assert_eq!(outcome.total(), 0);
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_copy_failure_skips_delete() {
        let store = MemoryStore::new();
        store.put("incoming", "report.doc", b"r");
        store.fail_copy_for("report.doc");

        let err = router_with(&store)
            .process(&[NotificationRecord::new("incoming", "report.doc")])
            .await
            .unwrap_err();

        assert!(matches!(err, SorterError::CopyFailed { .. }));
        assert!(store.contains("incoming", "report.doc"));
        assert!(store.journal().is_empty());
    }

    #[test]
    fn test_success_response() {
        let response = HandlerResponse::success();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "\"Files processed successfully\"");
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"statusCode":200,"body":"\"Files processed successfully\""}"#
        );
    }
}
