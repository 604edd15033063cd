use lambda_runtime::{tracing, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use shared::core::{
    failure_message, filter_delivered, output_key_for, success_message, NotificationPublisher,
    ObjectRef, ObjectStore, ProcessingError, FAILURE_SUBJECT, SUCCESS_SUBJECT,
};
use shared::s3_event::object_ref_from_event;

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    fn ok(body: String) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    fn internal_error(body: String) -> Self {
        Self {
            status_code: 500,
            body,
        }
    }
}

pub(crate) struct HandlerDeps<S: ObjectStore, N: NotificationPublisher> {
    pub object_store: S,
    pub notifier: N,
    pub target_bucket: String,
}

/// Failures are reported through the notifier and a 500 response rather than an `Err`,
/// so the runtime never redelivers the event.
#[tracing::instrument(skip(deps, event), fields(request_id = %event.context.request_id))]
pub(crate) async fn function_handler<S: ObjectStore, N: NotificationPublisher>(
    deps: &HandlerDeps<S, N>,
    event: LambdaEvent<Value>,
) -> Result<HandlerResponse, Error> {
    let object = match object_ref_from_event(event.payload) {
        Ok(object) => object,
        Err(e) => return Ok(report_failure(&deps.notifier, None, &e).await),
    };

    tracing::info!("Processing file: s3://{}/{}", object.bucket, object.key);

    match process_object(deps, &object).await {
        Ok(output_key) => {
            tracing::info!(
                "Stored filtered file s3://{}/{}",
                deps.target_bucket,
                output_key
            );
            Ok(HandlerResponse::ok(format!(
                "Successfully processed {}",
                object.key
            )))
        }
        Err(e) => Ok(report_failure(&deps.notifier, Some(object.key.as_str()), &e).await),
    }
}

async fn process_object<S: ObjectStore, N: NotificationPublisher>(
    deps: &HandlerDeps<S, N>,
    object: &ObjectRef,
) -> Result<String, ProcessingError> {
    let content = deps
        .object_store
        .get_object(&object.bucket, &object.key)
        .await
        .map_err(|e| ProcessingError::Read {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            reason: e.to_string(),
        })?;

    let filtered = filter_delivered(&content)?;
    tracing::debug!(
        "Kept {} of {} records from {}",
        filtered.kept,
        filtered.total,
        object.key
    );

    let output_key = output_key_for(&object.key);
    deps.object_store
        .put_object(&deps.target_bucket, &output_key, filtered.body)
        .await
        .map_err(|e| ProcessingError::Write {
            bucket: deps.target_bucket.clone(),
            key: output_key.clone(),
            reason: e.to_string(),
        })?;

    let message = success_message(&object.key, &output_key, &deps.target_bucket);
    deps.notifier
        .publish(SUCCESS_SUBJECT, &message)
        .await
        .map_err(|e| ProcessingError::Publish(e.to_string()))?;

    Ok(output_key)
}

async fn report_failure<N: NotificationPublisher>(
    notifier: &N,
    object_key: Option<&str>,
    error: &ProcessingError,
) -> HandlerResponse {
    let message = failure_message(object_key, error);
    tracing::error!("{}", message);

    // NOTE: best effort, the response already carries the failure
    if let Err(e) = notifier.publish(FAILURE_SUBJECT, &message).await {
        tracing::error!("Failed to publish failure notification: {}", e);
    }

    HandlerResponse::internal_error(message)
}
