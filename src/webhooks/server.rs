//! Admission webhook server.
//!
//! Provides the HTTP endpoint the API server calls for TrainedModel
//! admission.
//!
//! To enable the webhook:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at `/validate-trainedmodel`
//!    with `failurePolicy: Fail` for CREATE and UPDATE
//! 3. Mount the TLS certificate secret to the pod at /etc/webhook/certs/

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use kube::Resource;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::WebhookConfig;
use crate::crd::TrainedModel;
use crate::health::HealthState;
use crate::webhooks::policies::TrainedModelValidator;

/// Path the ValidatingWebhookConfiguration must target
pub const VALIDATE_PATH: &str = "/validate-trainedmodel";

/// Shared state for webhook handlers
pub struct WebhookState {
    pub validator: TrainedModelValidator,
    pub health_state: Option<Arc<HealthState>>,
}

impl WebhookState {
    pub fn new(validator: TrainedModelValidator, health_state: Option<Arc<HealthState>>) -> Self {
        Self {
            validator,
            health_state,
        }
    }
}

/// Outcome of reviewing one request
enum Verdict {
    Allowed,
    Denied { reason: &'static str, message: String },
}

/// Create a denial response with reason embedded in message.
/// kube-rs deny() only sets status.message, so we format as "[reason] message"
fn deny_with_reason<T: Resource<DynamicType = ()>>(
    request: &AdmissionRequest<T>,
    message: &str,
    reason: &str,
) -> AdmissionReview<kube::core::DynamicObject> {
    let full_message = format!("[{}] {}", reason, message);
    AdmissionResponse::from(request)
        .deny(full_message)
        .into_review()
}

fn operation_label(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

/// Copy of `obj` with the request namespace filled in when the object
/// itself does not carry one (e.g. on CREATE before defaulting).
fn with_request_namespace(obj: &TrainedModel, namespace: Option<&str>) -> TrainedModel {
    let mut obj = obj.clone();
    if obj.metadata.namespace.is_none() {
        obj.metadata.namespace = namespace.map(str::to_string);
    }
    obj
}

fn invalid_request(message: &str) -> Verdict {
    Verdict::Denied {
        reason: "InvalidRequest",
        message: message.to_string(),
    }
}

/// Dispatch a request to the matching validator entry point
async fn review(
    validator: &TrainedModelValidator,
    request: &AdmissionRequest<TrainedModel>,
) -> Verdict {
    let namespace = request.namespace.as_deref();

    let result = match request.operation {
        Operation::Create => {
            let Some(obj) = &request.object else {
                return invalid_request("Missing object in request");
            };
            let new = with_request_namespace(obj, namespace);
            validator.validate_create(&new).await
        }
        Operation::Update => {
            let Some(obj) = &request.object else {
                return invalid_request("Missing object in request");
            };
            let Some(old_obj) = &request.old_object else {
                return invalid_request("Missing oldObject in UPDATE request");
            };
            let new = with_request_namespace(obj, namespace);
            let old = with_request_namespace(old_obj, namespace);
            validator.validate_update(&new, &old).await
        }
        Operation::Delete => match &request.old_object {
            Some(old) => validator.validate_delete(old),
            None => Ok(()),
        },
        Operation::Connect => Ok(()),
    };

    match result {
        Ok(()) => Verdict::Allowed,
        Err(e) => Verdict::Denied {
            reason: e.reason(),
            message: e.to_string(),
        },
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(VALIDATE_PATH, post(validate_trainedmodel))
        .with_state(state)
}

/// TrainedModel admission webhook handler
async fn validate_trainedmodel(
    State(state): State<Arc<WebhookState>>,
    body: Result<Json<AdmissionReview<TrainedModel>>, JsonRejection>,
) -> impl IntoResponse {
    let review_body = match body {
        Ok(Json(review_body)) => review_body,
        Err(rejection) => {
            error!(error = %rejection, "Failed to decode AdmissionReview");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", rejection))
                        .into_review(),
                ),
            );
        }
    };

    let request: AdmissionRequest<TrainedModel> = match review_body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    let uid = &request.uid;
    let operation = operation_label(&request.operation);
    debug!(
        uid = %uid,
        operation,
        namespace = ?request.namespace,
        name = ?request.name,
        "Processing admission request"
    );

    let verdict = review(&state.validator, &request).await;
    let metrics = state.health_state.as_ref().map(|s| &s.metrics);

    match verdict {
        Verdict::Allowed => {
            if let Some(metrics) = metrics {
                metrics.record_admission(operation, true);
            }
            info!(uid = %uid, operation, "Admission request allowed");
            (
                StatusCode::OK,
                Json(AdmissionResponse::from(&request).into_review()),
            )
        }
        Verdict::Denied { reason, message } => {
            if let Some(metrics) = metrics {
                metrics.record_admission(operation, false);
                metrics.record_denial(reason);
            }
            warn!(uid = %uid, operation, reason = %reason, message = %message, "Admission request denied");
            (
                StatusCode::OK,
                Json(deny_with_reason(&request, &message, reason)),
            )
        }
    }
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Run the webhook server with TLS
///
/// Binds to `0.0.0.0:<webhook_port>` and serves [`VALIDATE_PATH`].
/// TLS certificates are loaded from the configured PEM paths.
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    config: &WebhookConfig,
) -> Result<(), WebhookError> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let app = create_webhook_router(state);

    let tls = RustlsConfig::from_pem_file(
        PathBuf::from(&config.cert_path),
        PathBuf::from(&config.key_path),
    )
    .await
    .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    info!(port = config.webhook_port, path = VALIDATE_PATH, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
