mod client;
mod message;
mod metrics;
mod resource;

use std::{fmt, ops::Deref, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;

use crate::stream::LineSender;

pub use self::{
    client::KubeClient,
    message::*,
    metrics::{PodMetrics, PodUsage},
    resource::*,
};

#[cfg(test)]
pub use self::client::mock;

/// Cluster API used by the application. Every call is namespaced explicitly.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn namespaces(&self) -> Result<Vec<Namespace>>;

    async fn pods(&self, namespace: &str) -> Result<Vec<PodSummary>>;

    async fn pod_detail(&self, namespace: &str, name: &str) -> Result<PodDetail>;

    async fn containers(&self, namespace: &str, pod: &str) -> Result<Vec<String>>;

    async fn logs(&self, target: &LogTarget, options: &LogOptions) -> Result<String>;

    /// Follows the log until the server closes it or `out` is closed.
    async fn stream_logs(
        &self,
        target: &LogTarget,
        options: &LogOptions,
        out: LineSender,
    ) -> Result<()>;

    async fn deployments(&self, namespace: &str) -> Result<Vec<DeploymentSummary>>;

    async fn deployment(&self, namespace: &str, name: &str) -> Result<DeploymentSummary>;

    async fn services(&self, namespace: &str) -> Result<Vec<ServiceSummary>>;

    async fn service(&self, namespace: &str, name: &str) -> Result<ServiceSummary>;

    async fn events(&self, namespace: &str) -> Result<Vec<EventSummary>>;

    /// Whether metrics-server answers. Metrics are optional, so this never fails.
    async fn metrics_available(&self) -> bool;

    async fn pod_metrics(&self, namespace: &str) -> Result<PodMetrics>;

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()>;

    async fn restart_pod(&self, namespace: &str, name: &str) -> Result<()>;

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()>;

    async fn restart_deployment(&self, namespace: &str, name: &str) -> Result<()>;

    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()>;
}

/// Shared handle to a connected cluster client.
#[derive(Clone)]
pub struct ClusterHandle(Arc<dyn ClusterClient>);

impl ClusterHandle {
    pub fn new(client: impl ClusterClient + 'static) -> Self {
        Self(Arc::new(client))
    }
}

impl Deref for ClusterHandle {
    type Target = dyn ClusterClient;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClusterHandle")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterInfo {
    pub name: String,
    pub context: String,
    pub namespace: String,
    pub server: String,
}

#[derive(Debug, Clone)]
pub struct ClusterConnection {
    pub client: ClusterHandle,
    pub info: ClusterInfo,
}
