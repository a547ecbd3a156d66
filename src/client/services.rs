//! Service listing against the Kubernetes API.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Lists the names of Services in a namespace.
///
/// Implementations must hit the source of truth on every call; results are
/// not cached between admission requests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceLister: Send + Sync {
    /// Names of every Service in `namespace`, in API server order.
    async fn list_service_names(&self, namespace: &str) -> Result<Vec<String>, kube::Error>;
}

/// `ServiceLister` backed by a live `kube::Client`.
///
/// The client is built once at startup from ambient credentials
/// (in-cluster service account, falling back to kubeconfig) and shared.
#[derive(Clone)]
pub struct KubeServiceLister {
    client: Client,
}

impl KubeServiceLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceLister for KubeServiceLister {
    async fn list_service_names(&self, namespace: &str) -> Result<Vec<String>, kube::Error> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);

        // Only names are needed, so fetch PartialObjectMeta instead of full
        // Service objects. No selectors: the whole namespace is scanned.
        let list = api.list_metadata(&ListParams::default()).await?;
        debug!(
            namespace = %namespace,
            count = list.items.len(),
            "Listed services"
        );

        Ok(list
            .items
            .into_iter()
            .filter_map(|svc| svc.metadata.name)
            .collect())
    }
}
