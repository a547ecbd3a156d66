//! In-memory `ServiceLister` and request helpers for functional tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use trainedmodel_webhook::crd::TrainedModel;
use trainedmodel_webhook::health::HealthState;
use trainedmodel_webhook::webhooks::create_webhook_router;
use trainedmodel_webhook::{
    ServiceLister, TrainedModelValidator, VALIDATE_PATH, WebhookConfig, WebhookState,
};

/// Fake Service store keyed by namespace.
///
/// Counts calls so tests can assert the lookup was (or was not) reached.
#[derive(Default)]
pub struct MockServices {
    namespaces: BTreeMap<String, Vec<String>>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Service named `name` to `namespace`.
    pub fn with_service(mut self, namespace: &str, name: &str) -> Self {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .push(name.to_string());
        self
    }

    /// Make every listing fail like an unreachable API server.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceLister for MockServices {
    async fn list_service_names(&self, namespace: &str) -> Result<Vec<String>, kube::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(kube::Error::Service("connection refused".into()));
        }
        Ok(self.namespaces.get(namespace).cloned().unwrap_or_default())
    }
}

/// A webhook wired to `services` with the given allow-list.
pub struct Harness {
    pub services: Arc<MockServices>,
    pub health: Arc<HealthState>,
    router: axum::Router,
}

impl Harness {
    pub fn new(services: MockServices) -> Self {
        Self::with_config(services, WebhookConfig::default())
    }

    pub fn with_config(services: MockServices, config: WebhookConfig) -> Self {
        let services = Arc::new(services);
        let health = Arc::new(HealthState::new());
        let validator = TrainedModelValidator::new(Arc::new(config), services.clone())
            .with_health_state(health.clone());
        let state = Arc::new(WebhookState::new(validator, Some(health.clone())));
        Self {
            services,
            health,
            router: create_webhook_router(state),
        }
    }

    /// POST a raw body and return the status and parsed JSON response.
    pub async fn post(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(VALIDATE_PATH)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Send an admission request and return its `response` object.
    pub async fn admit(
        &self,
        operation: &str,
        object: Option<&TrainedModel>,
        old: Option<&TrainedModel>,
    ) -> AdmissionOutcome {
        self.admit_review(review(operation, object, old)).await
    }

    /// Send a prebuilt AdmissionReview body and return its `response` object.
    pub async fn admit_review(&self, body: Value) -> AdmissionOutcome {
        let (status, body) = self.post(body).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let response = &body["response"];
        assert_eq!(response["uid"], "test-uid");
        AdmissionOutcome {
            allowed: response["allowed"].as_bool().unwrap(),
            message: response["status"]["message"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// The parts of an admission response the scenarios assert on.
#[derive(Debug)]
pub struct AdmissionOutcome {
    pub allowed: bool,
    pub message: String,
}

impl AdmissionOutcome {
    /// Reason prefix of a denial, e.g. `InvalidName` from `[InvalidName] ...`
    pub fn reason(&self) -> &str {
        self.message
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .map(|(reason, _)| reason)
            .unwrap_or_default()
    }
}

/// Build an `admission.k8s.io/v1` AdmissionReview for a TrainedModel.
pub fn review(operation: &str, object: Option<&TrainedModel>, old: Option<&TrainedModel>) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "test-uid",
            "kind": {"group": "serving.kserve.io", "version": "v1alpha1", "kind": "TrainedModel"},
            "resource": {"group": "serving.kserve.io", "version": "v1alpha1", "resource": "trainedmodels"},
            "operation": operation,
            "namespace": "default",
            "name": "model1",
            "userInfo": {"username": "tester"},
            "object": object,
            "oldObject": old,
            "dryRun": false
        }
    })
}
