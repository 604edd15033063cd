//! The parts of an S3 "object created" notification the handler reads.
//!
//! Every field is optional on the wire so that a payload of the wrong shape is reported
//! as a [`ProcessingError::InvalidEvent`] naming the missing piece, instead of failing
//! inside the runtime before the handler can notify anyone.

use crate::core::{ObjectRef, ProcessingError};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct S3Notification {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3NotificationRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3NotificationRecord {
    #[serde(default)]
    pub s3: S3Entity,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: S3Bucket,
    #[serde(default)]
    pub object: S3Object,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Bucket {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Object {
    pub key: Option<String>,
}

impl S3Notification {
    pub fn from_value(payload: Value) -> Result<Self, ProcessingError> {
        serde_json::from_value(payload)
            .map_err(|e| ProcessingError::InvalidEvent(format!("unexpected event shape: {}", e)))
    }

    /// Only the first record is read; any others are ignored.
    pub fn first_object(&self) -> Result<ObjectRef, ProcessingError> {
        let record = self
            .records
            .first()
            .ok_or_else(|| ProcessingError::InvalidEvent("event contains no Records".to_string()))?;
        let bucket = record
            .s3
            .bucket
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ProcessingError::InvalidEvent("record is missing s3.bucket.name".to_string())
            })?;
        let raw_key = record
            .s3
            .object
            .key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ProcessingError::InvalidEvent("record is missing s3.object.key".to_string())
            })?;

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key: decode_object_key(raw_key)?,
        })
    }
}

pub fn object_ref_from_event(payload: Value) -> Result<ObjectRef, ProcessingError> {
    S3Notification::from_value(payload)?.first_object()
}

/// S3 notifications carry keys form-encoded: spaces as `+`, everything else as `%XX`.
pub fn decode_object_key(raw_key: &str) -> Result<String, ProcessingError> {
    urlencoding::decode(&raw_key.replace('+', " "))
        .map(|key| key.into_owned())
        .map_err(|e| ProcessingError::InvalidEvent(format!("object key is not valid UTF-8: {}", e)))
}
