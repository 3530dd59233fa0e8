use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        core::v1::{ContainerStatus, Event, Namespace as KubeNamespace, Pod, Service},
    },
    apimachinery::pkg::{apis::meta::v1::ObjectMeta, util::intstr::IntOrString},
};

use crate::features::list::ListItem;

/// Pod and container a log request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

impl LogTarget {
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pod: pod.into(),
            container: container.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogOptions {
    /// `None` fetches the whole log
    pub tail_lines: Option<i64>,
    pub timestamps: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespace {
    pub name: String,
    pub status: String,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    pub ready: String,
    pub status: String,
    pub restarts: i32,
    pub age: String,
    pub node: Option<String>,
    pub ip: Option<String>,
    pub containers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerDetail {
    pub name: String,
    pub image: String,
    pub ready: bool,
    pub restarts: i32,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodDetail {
    pub summary: PodSummary,
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<ContainerDetail>,
    pub conditions: Vec<(String, String)>,
    pub events: Vec<EventSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeploymentSummary {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub ready: i32,
    pub updated: i32,
    pub available: i32,
    pub age: String,
    pub strategy: Option<String>,
    pub images: Vec<String>,
    pub selector: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceSummary {
    pub name: String,
    pub namespace: String,
    pub type_: String,
    pub cluster_ip: String,
    pub external_ips: Vec<String>,
    pub ports: Vec<String>,
    pub selector: BTreeMap<String, String>,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventSummary {
    pub namespace: String,
    pub type_: String,
    pub reason: String,
    pub message: String,
    pub object_kind: String,
    pub object_name: String,
    pub count: i32,
    pub age: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub source: String,
}

impl EventSummary {
    pub fn object(&self) -> String {
        format!("{}/{}", self.object_kind, self.object_name)
    }

    pub fn is_warning(&self) -> bool {
        self.type_ == "Warning"
    }
}

impl ListItem for Namespace {
    fn key(&self) -> &str {
        &self.name
    }
}

impl ListItem for PodSummary {
    fn key(&self) -> &str {
        &self.name
    }
}

impl ListItem for DeploymentSummary {
    fn key(&self) -> &str {
        &self.name
    }
}

impl ListItem for ServiceSummary {
    fn key(&self) -> &str {
        &self.name
    }
}

/// kubectl style age: `42s`, `7m`, `3h`, `12d`.
pub fn format_age(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(since) = since else {
        return "<unknown>".to_string();
    };

    let elapsed = now.signed_duration_since(since).max(Duration::zero());

    let seconds = elapsed.num_seconds();

    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h", seconds / 3600)
    } else {
        format!("{}d", seconds / 86400)
    }
}

fn created(meta: &ObjectMeta) -> Option<DateTime<Utc>> {
    meta.creation_timestamp.as_ref().map(|time| time.0)
}

fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

fn namespace_of(meta: &ObjectMeta) -> String {
    meta.namespace.clone().unwrap_or_default()
}

impl Namespace {
    pub fn from_resource(ns: &KubeNamespace, now: DateTime<Utc>) -> Self {
        Self {
            name: name_of(&ns.metadata),
            status: ns
                .status
                .as_ref()
                .and_then(|status| status.phase.clone())
                .unwrap_or_default(),
            age: format_age(created(&ns.metadata), now),
        }
    }
}

fn container_state(status: &ContainerStatus) -> String {
    let Some(state) = &status.state else {
        return "Unknown".to_string();
    };

    if let Some(waiting) = &state.waiting {
        return waiting.reason.clone().unwrap_or_else(|| "Waiting".to_string());
    }

    if let Some(terminated) = &state.terminated {
        return terminated
            .reason
            .clone()
            .unwrap_or_else(|| "Terminated".to_string());
    }

    if state.running.is_some() {
        return "Running".to_string();
    }

    "Unknown".to_string()
}

/// Status column: deletion, then the first problematic container reason, then the phase.
fn pod_status(pod: &Pod) -> String {
    if pod.metadata.deletion_timestamp.is_some() {
        return "Terminating".to_string();
    }

    let statuses = pod
        .status
        .as_ref()
        .and_then(|status| status.container_statuses.as_ref());

    if let Some(reason) = statuses.into_iter().flatten().find_map(|status| {
        let state = container_state(status);
        (state != "Running" && state != "Completed" && !status.ready).then_some(state)
    }) {
        return reason;
    }

    pod.status
        .as_ref()
        .and_then(|status| status.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

impl PodSummary {
    pub fn from_resource(pod: &Pod, now: DateTime<Utc>) -> Self {
        let statuses: &[ContainerStatus] = pod
            .status
            .as_ref()
            .and_then(|status| status.container_statuses.as_deref())
            .unwrap_or_default();

        let containers: Vec<String> = pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();

        let ready = statuses.iter().filter(|status| status.ready).count();

        Self {
            name: name_of(&pod.metadata),
            namespace: namespace_of(&pod.metadata),
            ready: format!("{}/{}", ready, containers.len()),
            status: pod_status(pod),
            restarts: statuses.iter().map(|status| status.restart_count).sum(),
            age: format_age(created(&pod.metadata), now),
            node: pod.spec.as_ref().and_then(|spec| spec.node_name.clone()),
            ip: pod.status.as_ref().and_then(|status| status.pod_ip.clone()),
            containers,
        }
    }
}

impl PodDetail {
    pub fn from_resource(pod: &Pod, events: Vec<EventSummary>, now: DateTime<Utc>) -> Self {
        let statuses: &[ContainerStatus] = pod
            .status
            .as_ref()
            .and_then(|status| status.container_statuses.as_deref())
            .unwrap_or_default();

        let containers = pod
            .spec
            .iter()
            .flat_map(|spec| spec.containers.iter())
            .map(|container| {
                let status = statuses.iter().find(|status| status.name == container.name);

                ContainerDetail {
                    name: container.name.clone(),
                    image: container.image.clone().unwrap_or_default(),
                    ready: status.is_some_and(|status| status.ready),
                    restarts: status.map(|status| status.restart_count).unwrap_or_default(),
                    state: status
                        .map(container_state)
                        .unwrap_or_else(|| "Pending".to_string()),
                }
            })
            .collect();

        let conditions = pod
            .status
            .iter()
            .flat_map(|status| status.conditions.iter().flatten())
            .map(|condition| (condition.type_.clone(), condition.status.clone()))
            .collect();

        Self {
            summary: PodSummary::from_resource(pod, now),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
            containers,
            conditions,
            events,
        }
    }
}

impl DeploymentSummary {
    pub fn from_resource(deployment: &Deployment, now: DateTime<Utc>) -> Self {
        let spec = deployment.spec.as_ref();
        let status = deployment.status.as_ref();

        Self {
            name: name_of(&deployment.metadata),
            namespace: namespace_of(&deployment.metadata),
            replicas: spec.and_then(|spec| spec.replicas).unwrap_or(1),
            ready: status.and_then(|s| s.ready_replicas).unwrap_or_default(),
            updated: status.and_then(|s| s.updated_replicas).unwrap_or_default(),
            available: status.and_then(|s| s.available_replicas).unwrap_or_default(),
            age: format_age(created(&deployment.metadata), now),
            strategy: spec
                .and_then(|spec| spec.strategy.as_ref())
                .and_then(|strategy| strategy.type_.clone()),
            images: spec
                .and_then(|spec| spec.template.spec.as_ref())
                .map(|pod| {
                    pod.containers
                        .iter()
                        .filter_map(|c| c.image.clone())
                        .collect()
                })
                .unwrap_or_default(),
            selector: spec
                .and_then(|spec| spec.selector.match_labels.clone())
                .unwrap_or_default(),
        }
    }

    pub fn ready_column(&self) -> String {
        format!("{}/{}", self.ready, self.replicas)
    }
}

fn target_port(port: &Option<IntOrString>) -> Option<String> {
    match port {
        Some(IntOrString::Int(port)) => Some(port.to_string()),
        Some(IntOrString::String(name)) => Some(name.clone()),
        None => None,
    }
}

impl ServiceSummary {
    pub fn from_resource(service: &Service, now: DateTime<Utc>) -> Self {
        let spec = service.spec.as_ref();

        let ports = spec
            .iter()
            .flat_map(|spec| spec.ports.iter().flatten())
            .map(|port| {
                let protocol = port.protocol.clone().unwrap_or_else(|| "TCP".to_string());

                match (port.node_port, target_port(&port.target_port)) {
                    (Some(node_port), _) => format!("{}:{}/{}", port.port, node_port, protocol),
                    (None, Some(target)) if target != port.port.to_string() => {
                        format!("{}->{}/{}", port.port, target, protocol)
                    }
                    _ => format!("{}/{}", port.port, protocol),
                }
            })
            .collect();

        Self {
            name: name_of(&service.metadata),
            namespace: namespace_of(&service.metadata),
            type_: spec
                .and_then(|spec| spec.type_.clone())
                .unwrap_or_else(|| "ClusterIP".to_string()),
            cluster_ip: spec
                .and_then(|spec| spec.cluster_ip.clone())
                .unwrap_or_else(|| "None".to_string()),
            external_ips: spec
                .and_then(|spec| spec.external_ips.clone())
                .unwrap_or_default(),
            ports,
            selector: spec
                .and_then(|spec| spec.selector.clone())
                .unwrap_or_default(),
            age: format_age(created(&service.metadata), now),
        }
    }
}

impl EventSummary {
    pub fn from_resource(event: &Event, now: DateTime<Utc>) -> Self {
        let last_seen = event
            .last_timestamp
            .as_ref()
            .map(|time| time.0)
            .or_else(|| event.event_time.as_ref().map(|time| time.0))
            .or_else(|| created(&event.metadata));

        Self {
            namespace: namespace_of(&event.metadata),
            type_: event.type_.clone().unwrap_or_else(|| "Normal".to_string()),
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            object_kind: event.involved_object.kind.clone().unwrap_or_default(),
            object_name: event.involved_object.name.clone().unwrap_or_default(),
            count: event.count.unwrap_or(1),
            age: format_age(last_seen, now),
            last_seen,
            source: event
                .source
                .as_ref()
                .and_then(|source| source.component.clone())
                .unwrap_or_default(),
        }
    }
}
