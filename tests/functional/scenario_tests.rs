//! End-to-end admission scenarios for TrainedModel.
//!
//! Each test sends a complete AdmissionReview through the webhook router
//! and asserts on the allow/deny decision and the reported reason.

use axum::http::StatusCode;
use serde_json::json;
use trainedmodel_webhook::WebhookConfig;

use crate::fixtures::{TrainedModelBuilder, valid_model};
use crate::mock_services::{Harness, MockServices, review};

fn with_predictor() -> MockServices {
    MockServices::new().with_service("default", "svc1-predictor-00001")
}

/// Drop `spec.model.memory` from the object under `field` in a review body.
fn without_memory(mut body: serde_json::Value, field: &str) -> serde_json::Value {
    body["request"][field]["spec"]["model"]
        .as_object_mut()
        .unwrap()
        .remove("memory");
    body
}

// ============================================================================
// CREATE
// ============================================================================

#[tokio::test]
async fn test_create_with_predictor_allowed() {
    let harness = Harness::new(with_predictor());
    let tm = TrainedModelBuilder::new("model1")
        .storage_uri("s3://bucket/m")
        .build();

    let outcome = harness.admit("CREATE", Some(&tm), None).await;
    assert!(outcome.allowed, "{}", outcome.message);
    assert_eq!(harness.services.calls(), 1);
}

#[tokio::test]
async fn test_create_bad_storage_uri_denied() {
    let harness = Harness::new(with_predictor());
    let tm = TrainedModelBuilder::new("model1").storage_uri("ftp://x").build();

    let outcome = harness.admit("CREATE", Some(&tm), None).await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.reason(), "InvalidStorageUri");
    assert!(outcome.message.contains("ftp://x"));
    // Format failures never reach the API server
    assert_eq!(harness.services.calls(), 0);
}

#[tokio::test]
async fn test_create_without_predictor_denied() {
    let services = MockServices::new()
        .with_service("default", "other-svc")
        .with_service("elsewhere", "svc1-predictor");
    let harness = Harness::new(services);

    let outcome = harness.admit("CREATE", Some(&valid_model("model1")), None).await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.reason(), "InferenceServiceNotFound");
    assert!(outcome.message.contains("\"svc1\""));
    assert!(outcome.message.contains("\"model1\""));
}

#[tokio::test]
async fn test_create_lookup_failure_denied_not_assumed_missing() {
    let harness = Harness::new(MockServices::failing());

    let outcome = harness.admit("CREATE", Some(&valid_model("model1")), None).await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.reason(), "ReferenceLookupFailed");
    assert!(outcome.message.contains("connection refused"));
}

#[tokio::test]
async fn test_create_uses_request_namespace_when_object_has_none() {
    let harness = Harness::new(with_predictor());
    let tm = TrainedModelBuilder::new("model1").without_namespace().build();

    let outcome = harness.admit("CREATE", Some(&tm), None).await;
    assert!(outcome.allowed, "{}", outcome.message);
}

#[tokio::test]
async fn test_name_error_reported_before_uri_error() {
    let harness = Harness::new(with_predictor());
    let tm = TrainedModelBuilder::new("bad name")
        .storage_uri("ftp://x")
        .build();

    let outcome = harness.admit("CREATE", Some(&tm), None).await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.reason(), "InvalidName");
    assert!(!outcome.message.contains("storageUri"));
}

#[tokio::test]
async fn test_custom_allow_list_applied() {
    let config = WebhookConfig {
        storage_uri_protocols: vec!["s3://".to_string()],
        ..Default::default()
    };
    let harness = Harness::with_config(with_predictor(), config);
    let tm = TrainedModelBuilder::new("model1")
        .storage_uri("gs://bucket/m")
        .build();

    let outcome = harness.admit("CREATE", Some(&tm), None).await;
    assert_eq!(outcome.reason(), "InvalidStorageUri");
    assert!(outcome.message.contains("prefixes: s3://."));
}

#[tokio::test]
async fn test_create_without_memory_reviewed() {
    let harness = Harness::new(with_predictor());
    let body = without_memory(review("CREATE", Some(&valid_model("model1")), None), "object");

    let outcome = harness.admit_review(body).await;
    assert!(outcome.allowed, "{}", outcome.message);
    assert_eq!(harness.services.calls(), 1);
}

// ============================================================================
// UPDATE
// ============================================================================

#[tokio::test]
async fn test_update_memory_change_denied() {
    let harness = Harness::new(with_predictor());
    let old = TrainedModelBuilder::new("model1").memory("1Gi").build();
    let new = TrainedModelBuilder::new("model1").memory("2Gi").build();

    let outcome = harness.admit("UPDATE", Some(&new), Some(&old)).await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.reason(), "ImmutableMemoryModified");
    // Reference check still ran (and passed) before immutability
    assert_eq!(harness.services.calls(), 1);
}

#[tokio::test]
async fn test_update_equivalent_memory_allowed() {
    let harness = Harness::new(with_predictor());
    let old = TrainedModelBuilder::new("model1").memory("2Gi").build();
    let new = TrainedModelBuilder::new("model1")
        .memory("2048Mi")
        .storage_uri("gs://bucket/v2")
        .build();

    let outcome = harness.admit("UPDATE", Some(&new), Some(&old)).await;
    assert!(outcome.allowed, "{}", outcome.message);
}

#[tokio::test]
async fn test_update_missing_reference_reported_before_memory() {
    let harness = Harness::new(MockServices::new());
    let old = TrainedModelBuilder::new("model1").memory("1Gi").build();
    let new = TrainedModelBuilder::new("model1").memory("2Gi").build();

    let outcome = harness.admit("UPDATE", Some(&new), Some(&old)).await;
    assert_eq!(outcome.reason(), "InferenceServiceNotFound");
}

#[tokio::test]
async fn test_update_without_old_object_denied() {
    let harness = Harness::new(with_predictor());

    let outcome = harness.admit("UPDATE", Some(&valid_model("model1")), None).await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.reason(), "InvalidRequest");
}

// ============================================================================
// DELETE
// ============================================================================

#[tokio::test]
async fn test_delete_malformed_resource_allowed() {
    let harness = Harness::new(MockServices::failing());
    let tm = TrainedModelBuilder::new("not valid!")
        .storage_uri("ftp://x")
        .memory("garbage")
        .build();

    let outcome = harness.admit("DELETE", None, Some(&tm)).await;
    assert!(outcome.allowed);
    assert_eq!(harness.services.calls(), 0);
}

#[tokio::test]
async fn test_delete_without_memory_allowed() {
    let harness = Harness::new(with_predictor());
    let body = without_memory(review("DELETE", None, Some(&valid_model("model1"))), "oldObject");

    let outcome = harness.admit_review(body).await;
    assert!(outcome.allowed, "{}", outcome.message);
    assert_eq!(harness.services.calls(), 0);
}

#[tokio::test]
async fn test_update_adding_memory_to_unset_denied() {
    let harness = Harness::new(with_predictor());
    let old = valid_model("model1");
    let new = TrainedModelBuilder::new("model1").memory("1Gi").build();
    let body = without_memory(review("UPDATE", Some(&new), Some(&old)), "oldObject");

    let outcome = harness.admit_review(body).await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.reason(), "ImmutableMemoryModified");
    assert!(outcome.message.contains("\"0\""));
}

// ============================================================================
// Protocol errors and metrics
// ============================================================================

#[tokio::test]
async fn test_review_without_request_is_bad_request() {
    let harness = Harness::new(with_predictor());
    let (status, body) = harness
        .post(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["response"]["allowed"], false);
}

#[tokio::test]
async fn test_undecodable_object_is_bad_request_with_review() {
    let harness = Harness::new(with_predictor());
    let mut body = review("CREATE", Some(&valid_model("model1")), None);
    body["request"]["object"]["spec"]["model"]["storageUri"] = json!(42);

    let (status, body) = harness.post(body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "AdmissionReview");
    assert_eq!(body["response"]["allowed"], false);
    assert!(
        body["response"]["status"]["message"]
            .as_str()
            .unwrap()
            .contains("Invalid AdmissionReview")
    );
    assert_eq!(harness.services.calls(), 0);
}

#[tokio::test]
async fn test_metrics_record_outcomes() {
    let harness = Harness::new(with_predictor());
    harness
        .admit("CREATE", Some(&valid_model("model1")), None)
        .await;
    harness
        .admit("CREATE", Some(&valid_model("bad.name")), None)
        .await;

    let encoded = harness.health.metrics.encode();
    assert!(encoded.contains("operation=\"CREATE\""));
    assert!(encoded.contains("reason=\"InvalidName\""));
    assert!(encoded.contains("trainedmodel_webhook_reference_lookup_duration_seconds_count 1"));
}
