use anyhow::Result;

use super::{
    ClusterConnection, DeploymentSummary, EventSummary, LogTarget, Namespace, PodDetail,
    PodMetrics, PodSummary, ServiceSummary,
};

/// Write operations on cluster resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    DeletePod(String),
    RestartPod(String),
    DeleteDeployment(String),
    RestartDeployment(String),
    ScaleDeployment { name: String, replicas: i32 },
}

impl Mutation {
    pub fn describe(&self) -> String {
        match self {
            Self::DeletePod(name) => format!("delete pod {}", name),
            Self::RestartPod(name) => format!("restart pod {}", name),
            Self::DeleteDeployment(name) => format!("delete deployment {}", name),
            Self::RestartDeployment(name) => format!("restart deployment {}", name),
            Self::ScaleDeployment { name, replicas } => {
                format!("scale deployment {} to {}", name, replicas)
            }
        }
    }
}

/// Results of cluster requests. Namespaced results carry the namespace they were
/// fetched for, so a result that arrives after the user moved on can be told apart.
#[derive(Debug)]
pub enum ClusterMessage {
    Connected(Result<ClusterConnection>),
    Namespaces(Result<Vec<Namespace>>),
    Pods {
        namespace: String,
        result: Result<Vec<PodSummary>>,
    },
    PodDetail {
        namespace: String,
        name: String,
        result: Result<PodDetail>,
    },
    Containers {
        namespace: String,
        pod: String,
        result: Result<Vec<String>>,
    },
    Logs {
        target: LogTarget,
        result: Result<String>,
    },
    Deployments {
        namespace: String,
        result: Result<Vec<DeploymentSummary>>,
    },
    DeploymentDetail {
        namespace: String,
        name: String,
        result: Result<DeploymentSummary>,
    },
    Services {
        namespace: String,
        result: Result<Vec<ServiceSummary>>,
    },
    ServiceDetail {
        namespace: String,
        name: String,
        result: Result<ServiceSummary>,
    },
    Events {
        namespace: String,
        result: Result<Vec<EventSummary>>,
    },
    MetricsAvailable(bool),
    Metrics {
        namespace: String,
        result: Result<PodMetrics>,
    },
    Mutated {
        mutation: Mutation,
        result: Result<()>,
    },
}
