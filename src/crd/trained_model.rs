//! TrainedModel Custom Resource Definition.
//!
//! A TrainedModel declares one model artifact that is loaded into the
//! predictor of an existing InferenceService (multi-model serving).

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// TrainedModel is a custom resource binding a model to an InferenceService.
///
/// Example:
/// ```yaml
/// apiVersion: serving.kserve.io/v1alpha1
/// kind: TrainedModel
/// metadata:
///   name: model1
/// spec:
///   inferenceService: sklearn-iris
///   model:
///     storageUri: s3://models/iris
///     framework: sklearn
///     memory: 256Mi
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "serving.kserve.io",
    version = "v1alpha1",
    kind = "TrainedModel",
    plural = "trainedmodels",
    shortname = "tm",
    namespaced,
    printcolumn = r#"{"name":"InferenceService", "type":"string", "jsonPath":".spec.inferenceService"}"#,
    printcolumn = r#"{"name":"Memory", "type":"string", "jsonPath":".spec.model.memory"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TrainedModelSpec {
    /// Name of the parent InferenceService in the same namespace.
    #[serde(default)]
    pub inference_service: String,

    /// Model artifact to load.
    #[serde(default)]
    pub model: ModelSpec,
}

/// Model artifact specification.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    /// Location of the model artifacts (e.g. `s3://bucket/path`).
    #[serde(default)]
    pub storage_uri: String,

    /// Framework used to serve the model (e.g. sklearn, tensorflow).
    #[serde(default)]
    pub framework: String,

    /// Memory reserved for the model. Immutable after creation.
    ///
    /// An omitted value decodes as zero so the immutability rule still has
    /// something to compare.
    #[serde(default = "zero_memory")]
    pub memory: Quantity,
}

fn zero_memory() -> Quantity {
    Quantity("0".to_string())
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            storage_uri: String::new(),
            framework: String::new(),
            memory: zero_memory(),
        }
    }
}

impl TrainedModel {
    /// The object name, or an empty string when the server has not assigned one
    pub fn name_or_empty(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}
