use crate::event_handler::HandlerDeps;
use event_handler::function_handler;
use lambda_runtime::{run, service_fn, tracing, Error};
use shared::adapters::{S3ObjectStore, SnsNotificationPublisher};

mod config;
mod event_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let config = config::Config::load()?;
    tracing::info!(
        "Filtered files go to bucket {}, notifications to {}",
        config.target_bucket,
        config.sns_topic_arn
    );

    let object_store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));
    let notifier =
        SnsNotificationPublisher::new(aws_sdk_sns::Client::new(&aws_config), config.sns_topic_arn);

    let handler_deps = HandlerDeps {
        object_store,
        notifier,
        target_bucket: config.target_bucket,
    };

    run(service_fn(|event| function_handler(&handler_deps, event))).await
}
