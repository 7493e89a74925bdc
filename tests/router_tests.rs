//! JSON wire dispatch tests for `JobRouter`.

use std::sync::Arc;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use jobctl::constants::{
    METHOD_CANCEL, METHOD_ENVIRONMENTS, METHOD_GET_STATE, METHOD_LIST, METHOD_PREPARE, METHOD_RUN,
};
use jobctl::{ErrorKind, JobRouter, JobService, ServiceConfig};

fn router() -> JobRouter {
    JobRouter::new(Arc::new(JobService::new(ServiceConfig::default()).unwrap()))
}

async fn prepare(router: &JobRouter, name: &str) -> Value {
    router
        .handle(METHOD_PREPARE, json!({ "jobName": name }))
        .await
        .unwrap()
}

async fn prepare_and_run(router: &JobRouter, name: &str) -> String {
    let prepared = prepare(router, name).await;
    let run = router
        .handle(
            METHOD_RUN,
            json!({ "preparationId": prepared["preparationId"] }),
        )
        .await
        .unwrap();
    run["jobId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn prepare_run_get_state_cancel() {
    let router = router();
    let job_id = prepare_and_run(&router, "wire").await;

    let state = router
        .handle(METHOD_GET_STATE, json!({ "jobId": job_id }))
        .await
        .unwrap();
    assert_eq!(state, json!({ "state": "STARTING" }));

    let cancelled = router
        .handle(METHOD_CANCEL, json!({ "jobId": job_id }))
        .await
        .unwrap();
    assert_eq!(cancelled, json!({ "state": "CANCELLED" }));

    let list = router.handle(METHOD_LIST, Value::Null).await.unwrap();
    assert_eq!(list["jobs"][0]["jobId"], job_id);
    assert_eq!(list["jobs"][0]["jobName"], "wire");
    assert_eq!(list["jobs"][0]["state"], "CANCELLED");
}

#[tokio::test]
async fn duplicate_prepare_maps_to_already_exists_code() {
    let router = router();
    prepare(&router, "jobA").await;
    let err = router
        .handle(METHOD_PREPARE, json!({ "jobName": "jobA" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
    assert_eq!(err.code, -32002);
}

#[tokio::test]
async fn run_unknown_preparation_maps_to_not_found_code() {
    let err = router()
        .handle(METHOD_RUN, json!({ "preparationId": "missing" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.code, -32001);
    let wire = serde_json::to_value(&err).unwrap();
    assert_eq!(wire["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn unavailable_maps_to_its_code() {
    let router = router();
    router.service().stop_accepting();
    let err = router
        .handle(METHOD_PREPARE, json!({ "jobName": "late" }))
        .await
        .unwrap_err();
    assert_eq!(err.code, -32003);
}

#[tokio::test]
async fn environments_for_empty_pipeline_is_empty() {
    let router = router();
    let prepared = prepare(&router, "envs").await;
    let bindings = router
        .handle(
            METHOD_ENVIRONMENTS,
            json!({ "preparationId": prepared["preparationId"] }),
        )
        .await
        .unwrap();
    assert_eq!(bindings, json!({ "bindings": {} }));

    let err = router
        .handle(
            METHOD_ENVIRONMENTS,
            json!({ "preparationId": prepared["preparationId"], "transformId": "ghost" }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn state_stream_yields_json_states() {
    let router = router();
    let job_id = prepare_and_run(&router, "streamed").await;
    let stream = router.state_stream(json!({ "jobId": job_id })).unwrap();
    router
        .handle(METHOD_CANCEL, json!({ "jobId": job_id }))
        .await
        .unwrap();

    let items: Vec<_> = stream.collect().await;
    assert_eq!(
        items,
        vec![json!({ "state": "STARTING" }), json!({ "state": "CANCELLED" })]
    );
}

#[tokio::test]
async fn message_stream_yields_tagged_items() {
    let router = router();
    let job_id = prepare_and_run(&router, "streamed").await;
    let stream = router.message_stream(json!({ "jobId": job_id })).unwrap();
    router
        .handle(METHOD_CANCEL, json!({ "jobId": job_id }))
        .await
        .unwrap();

    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["stateResponse"]["state"], "CANCELLED");
}

#[tokio::test]
async fn stream_for_unknown_job_fails() {
    let err = router()
        .state_stream(json!({ "jobId": "missing" }))
        .err()
        .unwrap();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
