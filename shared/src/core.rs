use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub const DELIVERED_STATUS: &str = "delivered";
pub const SUCCESS_SUBJECT: &str = "Doordash File Processed Successfully";
pub const FAILURE_SUBJECT: &str = "Doordash File Processing Failed";

const INPUT_SUFFIX: &str = ".json";
const OUTPUT_SUFFIX: &str = "_delivered.json";

#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Debug + Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error>;
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), Error>;
}

#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait NotificationPublisher: Debug + Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), Error>;
}

/// Location of a single object in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("failed to read s3://{bucket}/{key}: {reason}")]
    Read {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("line {line} is not valid JSON: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line} is not a JSON object")]
    NotAnObject { line: usize },
    #[error("line {line} has no 'status' field")]
    MissingStatus { line: usize },
    #[error("failed to write s3://{bucket}/{key}: {reason}")]
    Write {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("failed to publish notification: {0}")]
    Publish(String),
}

/// Newline-delimited JSON holding only the delivered records of an input file.
#[derive(Debug, Default, PartialEq)]
pub struct FilteredRecords {
    pub body: Vec<u8>,
    pub total: usize,
    pub kept: usize,
}

/// Keeps the records of a newline-delimited JSON document whose `status` is exactly
/// `"delivered"`.
///
/// Kept lines are copied byte for byte (minus surrounding whitespace) in input order, so
/// numbers and repeated keys come out exactly as they went in. Blank lines are skipped. Any line that is not a JSON object carrying a `status`
/// field fails the whole document, so a partial result is never returned.
pub fn filter_delivered(content: &[u8]) -> Result<FilteredRecords, ProcessingError> {
    let mut filtered = FilteredRecords::default();

    for (index, line) in content.split(|byte| *byte == b'\n').enumerate() {
        let line_number = index + 1;
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let record: Value =
            serde_json::from_slice(line).map_err(|source| ProcessingError::InvalidRecord {
                line: line_number,
                source,
            })?;
        let status = record
            .as_object()
            .ok_or(ProcessingError::NotAnObject { line: line_number })?
            .get("status")
            .ok_or(ProcessingError::MissingStatus { line: line_number })?;

        filtered.total += 1;
        if status.as_str() == Some(DELIVERED_STATUS) {
            filtered.body.extend_from_slice(line);
            filtered.body.push(b'\n');
            filtered.kept += 1;
        }
    }

    Ok(filtered)
}

/// `orders/2024-01-01.json` becomes `orders/2024-01-01_delivered.json`. Only the last
/// `.json` is replaced; keys without one are returned as is.
pub fn output_key_for(input_key: &str) -> String {
    match input_key.rfind(INPUT_SUFFIX) {
        Some(index) => format!(
            "{}{}{}",
            &input_key[..index],
            OUTPUT_SUFFIX,
            &input_key[index + INPUT_SUFFIX.len()..]
        ),
        None => input_key.to_string(),
    }
}

pub fn success_message(input_key: &str, output_key: &str, target_bucket: &str) -> String {
    format!(
        "File '{}' was filtered and stored as '{}' in bucket '{}'.",
        input_key, output_key, target_bucket
    )
}

/// The key is absent when the failure happened before it could be read from the event.
pub fn failure_message(input_key: Option<&str>, error: &ProcessingError) -> String {
    match input_key {
        Some(key) => format!("Error processing file {}: {}", key, error),
        None => format!("Error processing event: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(body: &[u8]) -> Vec<Value> {
        std::str::from_utf8(body)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn when_records_mixed_should_keep_only_delivered() {
        let input = b"{\"id\":1,\"status\":\"delivered\"}\n{\"id\":2,\"status\":\"pending\"}\n";

        let filtered = filter_delivered(input).unwrap();

        assert_eq!(filtered.body, b"{\"id\":1,\"status\":\"delivered\"}\n".to_vec());
        assert_eq!(filtered.total, 2);
        assert_eq!(filtered.kept, 1);
    }

    #[test]
    fn when_several_delivered_should_preserve_relative_order() {
        let input = concat!(
            "{\"id\":3,\"status\":\"delivered\"}\n",
            "{\"id\":1,\"status\":\"cancelled\"}\n",
            "{\"id\":7,\"status\":\"delivered\"}\n",
            "{\"id\":2,\"status\":\"delivered\"}"
        );

        let filtered = filter_delivered(input.as_bytes()).unwrap();

        let ids: Vec<i64> = lines(&filtered.body)
            .iter()
            .map(|record| record["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 7, 2]);
    }

    #[test]
    fn when_record_has_many_fields_should_keep_field_order() {
        let input = b"{\"zone\":\"b\",\"status\":\"delivered\",\"amount\":12.5,\"id\":9}\n";

        let filtered = filter_delivered(input).unwrap();

        assert_eq!(
            String::from_utf8(filtered.body).unwrap(),
            "{\"zone\":\"b\",\"status\":\"delivered\",\"amount\":12.5,\"id\":9}\n"
        );
    }

    #[test]
    fn when_record_has_wide_numbers_should_copy_them_unchanged() {
        let input =
            b"{\"id\":123456789012345678901234,\"amount\":1.10,\"n\":1e2,\"status\":\"delivered\"}\r\n";

        let filtered = filter_delivered(input).unwrap();

        assert_eq!(
            String::from_utf8(filtered.body).unwrap(),
            "{\"id\":123456789012345678901234,\"amount\":1.10,\"n\":1e2,\"status\":\"delivered\"}\n"
        );
    }

    #[test]
    fn when_record_repeats_a_key_should_keep_every_occurrence() {
        let input = b"  {\"status\":\"pending\",\"status\":\"delivered\",\"id\":2}  \n";

        let filtered = filter_delivered(input).unwrap();

        assert_eq!(
            String::from_utf8(filtered.body).unwrap(),
            "{\"status\":\"pending\",\"status\":\"delivered\",\"id\":2}\n"
        );
        assert_eq!(filtered.kept, 1);
    }

    #[test]
    fn when_status_differs_in_case_should_not_match() {
        let input = b"{\"id\":1,\"status\":\"Delivered\"}\n{\"id\":2,\"status\":\" delivered\"}\n";

        let filtered = filter_delivered(input).unwrap();

        assert!(filtered.body.is_empty());
        assert_eq!(filtered.total, 2);
    }

    #[test]
    fn when_status_is_not_a_string_should_not_match() {
        let input = b"{\"id\":1,\"status\":null}\n{\"id\":2,\"status\":1}\n";

        let filtered = filter_delivered(input).unwrap();

        assert!(filtered.body.is_empty());
    }

    #[test]
    fn when_blank_lines_present_should_skip_them() {
        let input = b"\n{\"id\":1,\"status\":\"delivered\"}\r\n   \n\n";

        let filtered = filter_delivered(input).unwrap();

        assert_eq!(filtered.body, b"{\"id\":1,\"status\":\"delivered\"}\n".to_vec());
        assert_eq!(filtered.total, 1);
    }

    #[test]
    fn when_input_empty_should_return_empty_body() {
        let filtered = filter_delivered(b"").unwrap();

        assert_eq!(filtered, FilteredRecords::default());
    }

    #[test]
    fn when_line_is_invalid_json_should_fail_with_line_number() {
        let input = b"{\"id\":1,\"status\":\"delivered\"}\nnot json\n";

        let error = filter_delivered(input).unwrap_err();

        assert!(matches!(error, ProcessingError::InvalidRecord { line: 2, .. }));
        assert!(error.to_string().starts_with("line 2 is not valid JSON"));
    }

    #[test]
    fn when_line_is_not_an_object_should_fail() {
        let error = filter_delivered(b"[1,2,3]\n").unwrap_err();

        assert!(matches!(error, ProcessingError::NotAnObject { line: 1 }));
    }

    #[test]
    fn when_status_missing_should_fail() {
        let input = b"{\"id\":1,\"status\":\"delivered\"}\n{\"id\":2}\n";

        let error = filter_delivered(input).unwrap_err();

        assert!(matches!(error, ProcessingError::MissingStatus { line: 2 }));
    }

    #[test]
    fn when_filtered_twice_should_produce_identical_output() {
        let input = b"{\"id\":1,\"status\":\"delivered\"}\n{\"id\":2,\"status\":\"pending\"}\n";

        assert_eq!(filter_delivered(input).unwrap(), filter_delivered(input).unwrap());
    }

    #[test]
    fn when_key_ends_with_json_should_add_delivered_suffix() {
        assert_eq!(
            output_key_for("orders/2024-01-01.json"),
            "orders/2024-01-01_delivered.json"
        );
    }

    #[test]
    fn when_key_has_no_json_should_return_key_unchanged() {
        assert_eq!(output_key_for("orders/2024-01-01.csv"), "orders/2024-01-01.csv");
    }

    #[test]
    fn when_key_has_several_json_should_replace_only_last() {
        assert_eq!(
            output_key_for("exports.json/day.json"),
            "exports.json/day_delivered.json"
        );
        assert_eq!(output_key_for("a.json.gz"), "a_delivered.json.gz");
    }

    #[test]
    fn when_failure_has_no_key_should_describe_event() {
        let error = ProcessingError::InvalidEvent("event contains no Records".to_string());

        assert_eq!(
            failure_message(None, &error),
            "Error processing event: invalid event: event contains no Records"
        );
    }

    #[test]
    fn when_failure_has_key_should_name_file() {
        let error = ProcessingError::MissingStatus { line: 4 };

        assert_eq!(
            failure_message(Some("orders/a.json"), &error),
            "Error processing file orders/a.json: line 4 has no 'status' field"
        );
    }

    #[test]
    fn success_message_names_both_keys_and_bucket() {
        assert_eq!(
            success_message("a.json", "a_delivered.json", "target"),
            "File 'a.json' was filtered and stored as 'a_delivered.json' in bucket 'target'."
        );
    }
}
