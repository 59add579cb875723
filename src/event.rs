//! S3 notification payloads
//!
//! Only the fields the router reads are required; everything else AWS sends
//! is either kept as optional context for logs or ignored.

use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::error::{Result, SorterError};

/// Batch of object notifications as delivered by S3
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

/// One entry of the `Records` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,

    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Object {
    /// URL-encoded object key
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, rename = "eTag", skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequencer: Option<String>,
}

/// The part of a notification the router acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub source_bucket: String,
    /// Key exactly as delivered, still URL-encoded
    pub encoded_key: String,
}

impl NotificationRecord {
    pub fn new(source_bucket: impl Into<String>, encoded_key: impl Into<String>) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            encoded_key: encoded_key.into(),
        }
    }
}

impl S3Event {
    /// Parse an event from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let event: S3Event = serde_json::from_str(json)?;
        event.validate()?;
        Ok(event)
    }

    /// Parse an event from a reader (file, stdin)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let event: S3Event = serde_json::from_reader(reader)?;
        event.validate()?;
        Ok(event)
    }

    /// Build an event from `(bucket, encoded_key)` pairs
    pub fn from_records<I, B, K>(records: I) -> Self
    where
        I: IntoIterator<Item = (B, K)>,
        B: Into<String>,
        K: Into<String>,
    {
        let records = records
            .into_iter()
            .map(|(bucket, key)| S3EventRecord {
                event_source: Some("aws:s3".to_string()),
                event_name: Some("ObjectCreated:Put".to_string()),
                event_time: None,
                aws_region: None,
                s3: S3Entity {
                    bucket: S3Bucket { name: bucket.into() },
                    object: S3Object {
                        key: key.into(),
                        size: None,
                        e_tag: None,
                        sequencer: None,
                    },
                },
            })
            .collect();
        Self { records }
    }

    fn validate(&self) -> Result<()> {
        for (idx, record) in self.records.iter().enumerate() {
            if record.s3.bucket.name.is_empty() {
                return Err(SorterError::InvalidEvent(format!(
                    "record {} has an empty bucket name",
                    idx
                )));
            }
            if record.s3.object.key.is_empty() {
                return Err(SorterError::InvalidEvent(format!(
                    "record {} has an empty object key",
                    idx
                )));
            }
        }
        Ok(())
    }

    /// Records in delivery order
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records
            .iter()
            .map(|r| NotificationRecord::new(&r.s3.bucket.name, &r.s3.object.key))
            .collect()
    }

    /// Compact JSON form for error logs
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable event: {}>", e))
    }
}
