use std::time::Duration;

use crate::{
    config::{ClusterEntry, Config, HostEntry},
    features::{
        detail::DetailPane,
        event_viewer::EventViewer,
        list::{ListItem, ListModel},
        log_viewer::LogViewer,
        modal::Modals,
        multi_log_viewer::MultiLogViewer,
        notification::Notifier,
    },
    kube::{
        ClusterHandle, ClusterInfo, DeploymentSummary, LogTarget, Namespace, PodDetail, PodMetrics,
        PodSummary, ServiceSummary,
    },
    remote::{NodeInfo, RemoteContainer, RemoteHandle},
    stream::{MultiStream, SingleStream, StreamChannel},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ViewState {
    ConfigSelect,
    Connecting,
    Main,
    Namespaces,
    Pods,
    PodDetails,
    Logs,
    MultiPodLogs,
    Deployments,
    DeploymentDetails,
    Services,
    ServiceDetails,
    Events,
    SshHosts,
    SshConnecting,
    RemoteContainers,
    RemoteLogs,
    NodeInfo,
}

impl ViewState {
    /// Views waiting on a connection accept nothing but `ctrl+c`.
    pub fn is_connecting(self) -> bool {
        matches!(self, Self::Connecting | Self::SshConnecting)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ConfigSelect => "Clusters",
            Self::Connecting => "Connecting",
            Self::Main => "Main",
            Self::Namespaces => "Namespaces",
            Self::Pods => "Pods",
            Self::PodDetails => "Pod",
            Self::Logs => "Logs",
            Self::MultiPodLogs => "Multi Pod Logs",
            Self::Deployments => "Deployments",
            Self::DeploymentDetails => "Deployment",
            Self::Services => "Services",
            Self::ServiceDetails => "Service",
            Self::Events => "Events",
            Self::SshHosts => "Hosts",
            Self::SshConnecting => "Connecting",
            Self::RemoteContainers => "Containers",
            Self::RemoteLogs => "Container Logs",
            Self::NodeInfo => "Node",
        }
    }
}

impl ListItem for ClusterEntry {
    fn key(&self) -> &str {
        &self.name
    }

    fn filter_value(&self) -> String {
        self.name.clone()
    }
}

impl ListItem for HostEntry {
    fn key(&self) -> &str {
        &self.name
    }

    fn filter_value(&self) -> String {
        format!("{} {}", self.name, self.host)
    }
}

#[derive(Debug, Clone)]
pub struct ClusterSession {
    pub client: ClusterHandle,
    pub info: ClusterInfo,
    pub metrics_available: bool,
}

impl ClusterSession {
    pub fn namespace(&self) -> &str {
        &self.info.namespace
    }
}

#[derive(Debug, Clone)]
pub struct RemoteSession {
    pub host: HostEntry,
    pub client: RemoteHandle,
    pub connected: bool,
}

/// Everything the loop mutates. Owned by [`super::Dispatcher`] and read by the renderer.
#[derive(Debug)]
pub struct AppState {
    pub view: ViewState,

    pub clusters: ListModel<ClusterEntry>,
    pub selected_config: Option<ClusterEntry>,
    pub cluster: Option<ClusterSession>,

    pub namespaces: ListModel<Namespace>,
    pub pods: ListModel<PodSummary>,
    pub selected_pod: Option<String>,
    pub pod_detail: DetailPane<PodDetail>,
    /// CPU/MEM columns in the pods view.
    pub metrics_enabled: bool,
    /// Usage of the pods in the current namespace, once fetched.
    pub pod_metrics: Option<PodMetrics>,
    pub deployments: ListModel<DeploymentSummary>,
    pub selected_deployment: Option<String>,
    pub deployment_detail: DetailPane<DeploymentSummary>,
    pub services: ListModel<ServiceSummary>,
    pub selected_service: Option<String>,
    pub service_detail: DetailPane<ServiceSummary>,
    pub events: EventViewer,

    pub log_viewer: LogViewer,
    pub log_target: Option<LogTarget>,
    pub log_containers: Vec<String>,
    /// Either [`ViewState::Pods`] or [`ViewState::PodDetails`].
    pub log_parent: ViewState,
    pub pod_stream: SingleStream,

    pub multi_log_viewer: MultiLogViewer,
    pub multi_stream: MultiStream,

    pub hosts: ListModel<HostEntry>,
    pub remote: Option<RemoteSession>,
    pub remote_containers: ListModel<RemoteContainer>,
    pub remote_log_viewer: LogViewer,
    pub remote_log_container: Option<RemoteContainer>,
    pub remote_stream: SingleStream,
    pub node_info: DetailPane<NodeInfo>,

    pub modals: Modals,
    pub notifier: Notifier,

    /// Inline error of the last fetch.
    pub error: Option<String>,
    /// Banner shown after a failed connection attempt.
    pub connection_error: Option<String>,
    pub loading: bool,
    pub spinner: usize,

    pub refresh_interval: Duration,
    pub tail_lines: i64,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let max_lines = config.logging.max_lines;
        let tail_lines = config.log_tail_lines;

        let mut clusters = ListModel::new();
        clusters.set_items(config.clusters.clone());

        let mut hosts = ListModel::new();
        hosts.set_items(config.hosts.clone());

        Self {
            view: ViewState::ConfigSelect,
            clusters,
            selected_config: None,
            cluster: None,
            namespaces: ListModel::new(),
            pods: ListModel::new(),
            selected_pod: None,
            pod_detail: DetailPane::default(),
            metrics_enabled: false,
            pod_metrics: None,
            deployments: ListModel::new(),
            selected_deployment: None,
            deployment_detail: DetailPane::default(),
            services: ListModel::new(),
            selected_service: None,
            service_detail: DetailPane::default(),
            events: EventViewer::default(),
            log_viewer: LogViewer::new(max_lines, tail_lines),
            log_target: None,
            log_containers: Vec::new(),
            log_parent: ViewState::Pods,
            pod_stream: SingleStream::new(StreamChannel::PodLogs),
            multi_log_viewer: MultiLogViewer::new(max_lines),
            multi_stream: MultiStream::new(),
            hosts,
            remote: None,
            remote_containers: ListModel::new(),
            remote_log_viewer: LogViewer::new(max_lines, tail_lines),
            remote_log_container: None,
            remote_stream: SingleStream::new(StreamChannel::RemoteLogs),
            node_info: DetailPane::default(),
            modals: Modals::default(),
            notifier: Notifier::default(),
            error: None,
            connection_error: None,
            loading: false,
            spinner: 0,
            refresh_interval: config.refresh_interval(),
            tail_lines,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.cluster.is_some()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.cluster.as_ref().map(ClusterSession::namespace)
    }

    pub fn is_current_namespace(&self, namespace: &str) -> bool {
        self.namespace() == Some(namespace)
    }

    pub fn metrics_available(&self) -> bool {
        self.cluster
            .as_ref()
            .is_some_and(|session| session.metrics_available)
    }

    /// Whether the current view's list filter is being typed into.
    pub fn is_filter_editing(&self) -> bool {
        match self.view {
            ViewState::ConfigSelect => self.clusters.is_filter_editing(),
            ViewState::Namespaces => self.namespaces.is_filter_editing(),
            ViewState::Pods => self.pods.is_filter_editing(),
            ViewState::Deployments => self.deployments.is_filter_editing(),
            ViewState::Services => self.services.is_filter_editing(),
            ViewState::SshHosts => self.hosts.is_filter_editing(),
            ViewState::RemoteContainers => self.remote_containers.is_filter_editing(),
            _ => false,
        }
    }

    /// Log viewer owned by the current view.
    pub fn active_log_viewer_mut(&mut self) -> Option<&mut LogViewer> {
        match self.view {
            ViewState::Logs => Some(&mut self.log_viewer),
            ViewState::RemoteLogs => Some(&mut self.remote_log_viewer),
            _ => None,
        }
    }

    pub fn tick(&mut self) {
        if self.loading {
            self.spinner = self.spinner.wrapping_add(1);
        }
    }
}
