use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::{AsyncBufReadExt, TryStreamExt};
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Event, Namespace as KubeNamespace, Pod, Service},
};
use kube::{
    api::{DeleteParams, ListParams, LogParams, Patch, PatchParams},
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config,
};
use serde_json::json;

use crate::{config::ClusterEntry, logger, stream::LineSender};

use super::{
    metrics::{pod_metrics, PodMetricsResource},
    ClusterClient, ClusterConnection, ClusterHandle, ClusterInfo, DeploymentSummary,
    EventSummary, LogOptions, LogTarget, Namespace, PodDetail, PodMetrics, PodSummary,
    ServiceSummary,
};

const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// [`ClusterClient`] backed by kube-rs.
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from a kubeconfig entry and checks that the api server answers.
    pub async fn connect(entry: &ClusterEntry) -> Result<ClusterConnection> {
        let kubeconfig = Kubeconfig::read_from(&entry.path)?;

        let context_name = entry
            .context
            .clone()
            .or_else(|| kubeconfig.current_context.clone())
            .ok_or_else(|| anyhow!("{} has no current-context", entry.path.display()))?;

        let cluster_name = kubeconfig
            .contexts
            .iter()
            .find(|ctx| ctx.name == context_name)
            .ok_or_else(|| anyhow!("Cannot find context {}", context_name))?
            .context
            .as_ref()
            .map(|ctx| ctx.cluster.clone())
            .unwrap_or_default();

        let options = KubeConfigOptions {
            context: Some(context_name.clone()),
            ..Default::default()
        };

        let config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;

        let info = ClusterInfo {
            name: cluster_name,
            context: context_name,
            namespace: config.default_namespace.clone(),
            server: config.cluster_url.to_string(),
        };

        let client = Client::try_from(config)?;

        let version = client.apiserver_version().await?;

        logger!(
            info,
            "connected to {} ({}) version {}.{}",
            info.server,
            info.context,
            version.major,
            version.minor
        );

        Ok(ClusterConnection {
            client: ClusterHandle::new(Self::new(client)),
            info,
        })
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn log_params(target: &LogTarget, options: &LogOptions, follow: bool) -> LogParams {
    LogParams {
        container: Some(target.container.clone()),
        follow,
        tail_lines: options.tail_lines,
        timestamps: options.timestamps,
        ..Default::default()
    }
}

#[async_trait]
impl ClusterClient for KubeClient {
    async fn namespaces(&self) -> Result<Vec<Namespace>> {
        let api: Api<KubeNamespace> = Api::all(self.client.clone());

        let list = api.list(&ListParams::default()).await?;

        let now = Utc::now();

        Ok(list
            .iter()
            .map(|ns| Namespace::from_resource(ns, now))
            .collect())
    }

    async fn pods(&self, namespace: &str) -> Result<Vec<PodSummary>> {
        let list = self.api::<Pod>(namespace).list(&ListParams::default()).await?;

        let now = Utc::now();

        Ok(list
            .iter()
            .map(|pod| PodSummary::from_resource(pod, now))
            .collect())
    }

    async fn pod_detail(&self, namespace: &str, name: &str) -> Result<PodDetail> {
        let pod = self.api::<Pod>(namespace).get(name).await?;

        let params = ListParams::default().fields(&format!("involvedObject.name={}", name));

        let events = self.api::<Event>(namespace).list(&params).await?;

        let now = Utc::now();

        let mut events: Vec<EventSummary> = events
            .iter()
            .map(|event| EventSummary::from_resource(event, now))
            .collect();

        events.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));

        Ok(PodDetail::from_resource(&pod, events, now))
    }

    async fn containers(&self, namespace: &str, pod: &str) -> Result<Vec<String>> {
        let pod = self.api::<Pod>(namespace).get(pod).await?;

        Ok(pod
            .spec
            .map(|spec| spec.containers.into_iter().map(|c| c.name).collect())
            .unwrap_or_default())
    }

    async fn logs(&self, target: &LogTarget, options: &LogOptions) -> Result<String> {
        let logs = self
            .api::<Pod>(&target.namespace)
            .logs(&target.pod, &log_params(target, options, false))
            .await?;

        Ok(logs)
    }

    async fn stream_logs(
        &self,
        target: &LogTarget,
        options: &LogOptions,
        out: LineSender,
    ) -> Result<()> {
        let mut lines = self
            .api::<Pod>(&target.namespace)
            .log_stream(&target.pod, &log_params(target, options, true))
            .await?
            .lines();

        while let Some(line) = lines.try_next().await? {
            if out.send(line).await.is_err() {
                logger!(debug, "log consumer for {}/{} closed", target.pod, target.container);
                break;
            }
        }

        Ok(())
    }

    async fn deployments(&self, namespace: &str) -> Result<Vec<DeploymentSummary>> {
        let list = self
            .api::<Deployment>(namespace)
            .list(&ListParams::default())
            .await?;

        let now = Utc::now();

        Ok(list
            .iter()
            .map(|deployment| DeploymentSummary::from_resource(deployment, now))
            .collect())
    }

    async fn deployment(&self, namespace: &str, name: &str) -> Result<DeploymentSummary> {
        let deployment = self.api::<Deployment>(namespace).get(name).await?;

        Ok(DeploymentSummary::from_resource(&deployment, Utc::now()))
    }

    async fn services(&self, namespace: &str) -> Result<Vec<ServiceSummary>> {
        let list = self
            .api::<Service>(namespace)
            .list(&ListParams::default())
            .await?;

        let now = Utc::now();

        Ok(list
            .iter()
            .map(|service| ServiceSummary::from_resource(service, now))
            .collect())
    }

    async fn service(&self, namespace: &str, name: &str) -> Result<ServiceSummary> {
        let service = self.api::<Service>(namespace).get(name).await?;

        Ok(ServiceSummary::from_resource(&service, Utc::now()))
    }

    async fn events(&self, namespace: &str) -> Result<Vec<EventSummary>> {
        let list = self
            .api::<Event>(namespace)
            .list(&ListParams::default())
            .await?;

        let now = Utc::now();

        Ok(list
            .iter()
            .map(|event| EventSummary::from_resource(event, now))
            .collect())
    }

    async fn metrics_available(&self) -> bool {
        let api: Api<PodMetricsResource> = Api::all(self.client.clone());

        match api.list(&ListParams::default().limit(1)).await {
            Ok(_) => true,
            Err(err) => {
                logger!(debug, "metrics server not available: {}", err);
                false
            }
        }
    }

    async fn pod_metrics(&self, namespace: &str) -> Result<PodMetrics> {
        let list = self
            .api::<PodMetricsResource>(namespace)
            .list(&ListParams::default())
            .await?;

        Ok(pod_metrics(&list.items))
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        self.api::<Pod>(namespace)
            .delete(name, &DeleteParams::default())
            .await?;

        Ok(())
    }

    /// Pods cannot be restarted in place; the owning controller recreates a deleted pod.
    async fn restart_pod(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete_pod(namespace, name).await
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()> {
        self.api::<Deployment>(namespace)
            .delete(name, &DeleteParams::default())
            .await?;

        Ok(())
    }

    async fn restart_deployment(&self, namespace: &str, name: &str) -> Result<()> {
        let patch = json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            RESTARTED_AT_ANNOTATION: Utc::now().to_rfc3339()
                        }
                    }
                }
            }
        });

        self.api::<Deployment>(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        Ok(())
    }

    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()> {
        let patch = json!({ "spec": { "replicas": replicas } });

        self.api::<Deployment>(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use anyhow::Result;
    use mockall::mock;

    use crate::{
        kube::{
            ClusterClient, DeploymentSummary, EventSummary, LogOptions, LogTarget, Namespace,
            PodDetail, PodMetrics, PodSummary, ServiceSummary,
        },
        stream::LineSender,
    };

    mock! {
        pub TestClusterClient {}

        #[async_trait::async_trait]
        impl ClusterClient for TestClusterClient {
            async fn namespaces(&self) -> Result<Vec<Namespace>>;
            async fn pods(&self, namespace: &str) -> Result<Vec<PodSummary>>;
            async fn pod_detail(&self, namespace: &str, name: &str) -> Result<PodDetail>;
            async fn containers(&self, namespace: &str, pod: &str) -> Result<Vec<String>>;
            async fn logs(&self, target: &LogTarget, options: &LogOptions) -> Result<String>;
            async fn stream_logs(&self, target: &LogTarget, options: &LogOptions, out: LineSender) -> Result<()>;
            async fn deployments(&self, namespace: &str) -> Result<Vec<DeploymentSummary>>;
            async fn deployment(&self, namespace: &str, name: &str) -> Result<DeploymentSummary>;
            async fn services(&self, namespace: &str) -> Result<Vec<ServiceSummary>>;
            async fn service(&self, namespace: &str, name: &str) -> Result<ServiceSummary>;
            async fn events(&self, namespace: &str) -> Result<Vec<EventSummary>>;
            async fn metrics_available(&self) -> bool;
            async fn pod_metrics(&self, namespace: &str) -> Result<PodMetrics>;
            async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()>;
            async fn restart_pod(&self, namespace: &str, name: &str) -> Result<()>;
            async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()>;
            async fn restart_deployment(&self, namespace: &str, name: &str) -> Result<()>;
            async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()>;
        }
    }
}
