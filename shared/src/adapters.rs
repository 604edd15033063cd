use crate::core::{Error, NotificationPublisher, ObjectStore};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug)]
pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error> {
        let output = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        let data = output.body.collect().await?;
        Ok(data.into_bytes().to_vec())
    }

    #[tracing::instrument(skip(self, body), fields(size = body.len()))]
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), Error> {
        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(NDJSON_CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        Ok(())
    }
}

#[derive(Debug)]
pub struct SnsNotificationPublisher {
    sns_client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotificationPublisher {
    pub fn new(sns_client: aws_sdk_sns::Client, topic_arn: String) -> Self {
        Self {
            sns_client,
            topic_arn,
        }
    }
}

#[async_trait]
impl NotificationPublisher for SnsNotificationPublisher {
    #[tracing::instrument(skip(self, message))]
    async fn publish(&self, subject: &str, message: &str) -> Result<(), Error> {
        let output = self
            .sns_client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        tracing::debug!("Published notification {:?}", output.message_id());
        Ok(())
    }
}
