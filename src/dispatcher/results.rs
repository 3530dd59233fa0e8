use anyhow::Result;

use crate::{
    features::{modal::Modal as _, notification::NotificationKind},
    kube::{ClusterConnection, ClusterMessage, LogTarget, Mutation},
    logger,
    remote::{is_passphrase_required, RemoteMessage},
    task::{ClusterRequest, RemoteRequest, Task},
};

use super::{ClusterSession, Dispatcher, ViewState};

impl Dispatcher {
    /// Stores a fetch result. Errors show inline only while `owner` is current,
    /// and never change the view.
    fn apply<T>(&mut self, owner: ViewState, result: Result<T>, apply: impl FnOnce(&mut Self, T)) {
        self.state.loading = false;

        let is_owner = self.state.view == owner;

        match result {
            Ok(value) => {
                if is_owner {
                    self.state.error = None;
                }

                apply(self, value);
            }
            Err(err) => {
                logger!(error, "{:#}", err);

                if is_owner {
                    self.state.error = Some(format!("{:#}", err));
                }
            }
        }
    }

    /// Results fetched for another namespace than the selected one are dropped.
    fn is_stale(&self, namespace: &str, kind: &str) -> bool {
        if self.state.is_current_namespace(namespace) {
            return false;
        }

        logger!(debug, "dropped {} of namespace {}", kind, namespace);

        true
    }

    /// Whether `view` is showing the entity `name`.
    fn is_showing(&self, view: ViewState, selected: Option<&str>, name: &str) -> bool {
        if self.state.view == view && selected == Some(name) {
            return true;
        }

        logger!(debug, "dropped {} of {}", view, name);

        false
    }

    pub(super) fn on_cluster(&mut self, message: ClusterMessage) -> Vec<Task> {
        match message {
            ClusterMessage::Connected(result) => return self.on_connected(result),
            ClusterMessage::Namespaces(result) => {
                self.apply(ViewState::Namespaces, result, |this, items| {
                    this.state.namespaces.set_items(items)
                });
            }
            ClusterMessage::Pods { namespace, result } => {
                if !self.is_stale(&namespace, "pods") {
                    self.apply(ViewState::Pods, result, |this, items| {
                        this.state.pods.set_items(items)
                    });
                }
            }
            ClusterMessage::PodDetail {
                namespace,
                name,
                result,
            } => {
                if !self.is_stale(&namespace, "pod")
                    && self.is_showing(
                        ViewState::PodDetails,
                        self.state.selected_pod.as_deref(),
                        &name,
                    )
                {
                    self.apply(ViewState::PodDetails, result, |this, detail| {
                        this.state.pod_detail.set(detail)
                    });
                }
            }
            ClusterMessage::Containers {
                namespace,
                pod,
                result,
            } => {
                if !self.is_stale(&namespace, "containers")
                    && self.is_showing(
                        self.state.log_parent,
                        self.state.selected_pod.as_deref(),
                        &pod,
                    )
                {
                    return self.on_containers(namespace, pod, result);
                }
            }
            ClusterMessage::Logs { target, result } => {
                if self.state.view == ViewState::Logs
                    && self.state.log_target.as_ref() == Some(&target)
                {
                    self.apply(ViewState::Logs, result, |this, logs| {
                        this.state.log_viewer.set_content(&logs)
                    });
                } else {
                    logger!(debug, "dropped logs of {}/{}", target.pod, target.container);
                }
            }
            ClusterMessage::Deployments { namespace, result } => {
                if !self.is_stale(&namespace, "deployments") {
                    self.apply(ViewState::Deployments, result, |this, items| {
                        this.state.deployments.set_items(items)
                    });
                }
            }
            ClusterMessage::DeploymentDetail {
                namespace,
                name,
                result,
            } => {
                if !self.is_stale(&namespace, "deployment")
                    && self.is_showing(
                        ViewState::DeploymentDetails,
                        self.state.selected_deployment.as_deref(),
                        &name,
                    )
                {
                    self.apply(ViewState::DeploymentDetails, result, |this, detail| {
                        this.state.deployment_detail.set(detail)
                    });
                }
            }
            ClusterMessage::Services { namespace, result } => {
                if !self.is_stale(&namespace, "services") {
                    self.apply(ViewState::Services, result, |this, items| {
                        this.state.services.set_items(items)
                    });
                }
            }
            ClusterMessage::ServiceDetail {
                namespace,
                name,
                result,
            } => {
                if !self.is_stale(&namespace, "service")
                    && self.is_showing(
                        ViewState::ServiceDetails,
                        self.state.selected_service.as_deref(),
                        &name,
                    )
                {
                    self.apply(ViewState::ServiceDetails, result, |this, detail| {
                        this.state.service_detail.set(detail)
                    });
                }
            }
            ClusterMessage::Events { namespace, result } => {
                if !self.is_stale(&namespace, "events") {
                    self.apply(ViewState::Events, result, |this, events| {
                        this.state.events.set_events(events)
                    });
                }
            }
            ClusterMessage::MetricsAvailable(available) => {
                logger!(debug, "metrics server available: {}", available);

                if let Some(session) = self.state.cluster.as_mut() {
                    session.metrics_available = available;
                }
            }
            ClusterMessage::Metrics { namespace, result } => {
                if !self.is_stale(&namespace, "metrics") {
                    // optional data; a failure only hides the columns' values
                    self.state.pod_metrics = match result {
                        Ok(metrics) => Some(metrics),
                        Err(err) => {
                            logger!(warn, "failed to get pod metrics: {:#}", err);
                            None
                        }
                    };
                }
            }
            ClusterMessage::Mutated { mutation, result } => {
                return self.on_mutated(mutation, result)
            }
        }

        vec![]
    }

    fn on_connected(&mut self, result: Result<ClusterConnection>) -> Vec<Task> {
        self.state.loading = false;

        match result {
            Ok(connection) => {
                logger!(
                    info,
                    "connected to {} ({})",
                    connection.info.name,
                    connection.info.server
                );

                self.disconnect_cluster();
                self.state.cluster = Some(ClusterSession {
                    client: connection.client,
                    info: connection.info,
                    metrics_available: false,
                });
                self.state.connection_error = None;

                let mut tasks = self.go_namespaces();
                tasks.extend(self.cluster_task(ClusterRequest::MetricsAvailable));
                tasks
            }
            Err(err) => {
                logger!(error, "failed to connect: {:#}", err);

                self.switch_view(ViewState::Main);
                self.state.connection_error = Some(format!("{:#}", err));

                vec![]
            }
        }
    }

    fn on_containers(
        &mut self,
        namespace: String,
        pod: String,
        result: Result<Vec<String>>,
    ) -> Vec<Task> {
        self.state.loading = false;

        let containers = match result {
            Ok(containers) => containers,
            Err(err) => {
                logger!(error, "failed to get containers of {}: {:#}", pod, err);
                self.state.error = Some(format!("{:#}", err));
                return vec![];
            }
        };

        let Some(container) = containers.first().cloned() else {
            self.state.error = Some(format!("pod {} has no containers", pod));
            return vec![];
        };

        logger!(debug, "pod {} has containers {:?}", pod, containers);

        self.switch_view(ViewState::Logs);
        self.state.pod_stream.stop();
        self.state.log_viewer.reset(format!("{}/{}", pod, container));
        self.state.log_target = Some(LogTarget::new(namespace, pod, container));
        self.state.log_containers = containers;

        self.fetch_logs()
    }

    /// Switches the log view to another container of the same pod.
    pub(super) fn change_container(&mut self, container: String) -> Vec<Task> {
        let Some(target) = self.state.log_target.as_mut() else {
            return vec![];
        };

        if target.container == container {
            return vec![];
        }

        target.container = container;

        let title = format!("{}/{}", target.pod, target.container);

        self.state.pod_stream.stop();
        self.state.log_viewer.reset(title);

        self.fetch_logs()
    }

    fn on_mutated(&mut self, mutation: Mutation, result: Result<()>) -> Vec<Task> {
        if let Err(err) = result {
            logger!(error, "failed to {}: {:#}", mutation.describe(), err);

            return vec![self.notify(
                NotificationKind::Error,
                format!("Failed to {}: {:#}", mutation.describe(), err),
            )];
        }

        logger!(info, "{} succeeded", mutation.describe());

        let message = match &mutation {
            Mutation::DeletePod(name) => format!("Pod '{}' deleted", name),
            Mutation::RestartPod(name) => format!("Pod '{}' restarting", name),
            Mutation::DeleteDeployment(name) => format!("Deployment '{}' deleted", name),
            Mutation::RestartDeployment(name) => format!("Deployment '{}' restarting", name),
            Mutation::ScaleDeployment { name, replicas } => {
                format!("Deployment '{}' scaled to {}", name, replicas)
            }
        };

        let mut tasks = vec![self.notify(NotificationKind::Success, message)];

        match mutation {
            Mutation::DeletePod(_) | Mutation::RestartPod(_) => tasks.extend(self.go_pods()),
            Mutation::DeleteDeployment(_) => tasks.extend(self.go_deployments()),
            Mutation::RestartDeployment(name) | Mutation::ScaleDeployment { name, .. } => {
                if self.state.view == ViewState::DeploymentDetails {
                    tasks.extend(self.fetch_in_namespace(|namespace| {
                        ClusterRequest::DeploymentDetail { namespace, name }
                    }));
                } else {
                    tasks.extend(self.go_deployments());
                }
            }
        }

        tasks
    }

    pub(super) fn on_remote(&mut self, message: RemoteMessage) -> Vec<Task> {
        match message {
            RemoteMessage::Connected(result) => self.on_remote_connected(result),
            RemoteMessage::Containers(result) => {
                self.apply(ViewState::RemoteContainers, result, |this, items| {
                    this.state.remote_containers.set_items(items)
                });
                vec![]
            }
            RemoteMessage::NodeInfo(result) => {
                self.state.loading = false;

                match result {
                    Ok(info) => self.state.node_info.set(info),
                    Err(err) => {
                        logger!(warn, "failed to get node info: {:#}", err);

                        if self.state.view == ViewState::NodeInfo {
                            self.state.error = Some(format!("{:#}", err));
                        }
                    }
                }

                vec![]
            }
            RemoteMessage::Logs {
                container_id,
                result,
            } => {
                let selected = self
                    .state
                    .remote_log_container
                    .as_ref()
                    .map(|container| container.id.as_str());

                if self.is_showing(ViewState::RemoteLogs, selected, &container_id) {
                    self.apply(ViewState::RemoteLogs, result, |this, logs| {
                        this.state.remote_log_viewer.set_content(&logs)
                    });
                }

                vec![]
            }
            RemoteMessage::Disconnected => {
                logger!(info, "remote connection closed");
                vec![]
            }
        }
    }

    fn on_remote_connected(&mut self, result: Result<()>) -> Vec<Task> {
        self.state.loading = false;

        let Some(session) = self.state.remote.as_mut() else {
            return vec![];
        };

        match result {
            Ok(()) => {
                logger!(info, "connected to host {}", session.host.name);

                session.connected = true;

                self.switch_view(ViewState::RemoteContainers);

                let mut tasks = self.fetch_remote(RemoteRequest::Containers);
                tasks.extend(self.remote_task(RemoteRequest::NodeInfo));
                tasks
            }
            Err(err) if is_passphrase_required(&err) => {
                logger!(info, "host {} needs a passphrase", session.host.name);

                let host = session.host.name.clone();

                self.state.modals.hide_all();
                self.state.modals.passphrase.show(host);

                vec![]
            }
            Err(err) => {
                logger!(error, "failed to connect to {}: {:#}", session.host.name, err);

                self.state.remote = None;
                self.switch_view(ViewState::SshHosts);
                self.state.connection_error = Some(format!("{:#}", err));

                vec![]
            }
        }
    }
}
