use crate::{
    config::ClusterEntry,
    logger,
    task::{ClusterRequest, RemoteRequest, Task},
};

use super::{refresh::RefreshTarget, Dispatcher, RemoteSession, ViewState};

impl Dispatcher {
    /// Switches the current view, stopping streams owned by the view being left.
    pub(super) fn switch_view(&mut self, next: ViewState) {
        let current = self.state.view;

        if current == next {
            return;
        }

        match current {
            ViewState::Logs => self.state.pod_stream.stop(),
            ViewState::MultiPodLogs => self.state.multi_stream.stop(),
            ViewState::RemoteLogs => self.state.remote_stream.stop(),
            _ => {}
        }

        logger!(debug, "view {} -> {}", current, next);

        self.state.view = next;
        self.state.error = None;
    }

    pub(super) fn connect(&mut self, entry: ClusterEntry) -> Vec<Task> {
        logger!(info, "connecting to cluster {}", entry.name);

        self.switch_view(ViewState::Connecting);
        self.state.selected_config = Some(entry.clone());
        self.state.connection_error = None;
        self.state.loading = true;

        vec![Task::ConnectCluster(entry)]
    }

    pub(super) fn retry_connect(&mut self) -> Vec<Task> {
        match self.state.selected_config.clone() {
            Some(entry) => self.connect(entry),
            None => vec![],
        }
    }

    /// Drops the cluster session and everything fetched through it.
    pub(super) fn disconnect_cluster(&mut self) {
        self.state.pod_stream.stop();
        self.state.multi_stream.stop();

        self.state.cluster = None;
        self.state.namespaces.clear();
        self.state.pods.clear();
        self.state.deployments.clear();
        self.state.services.clear();
        self.state.events.clear();
        self.state.pod_detail.clear();
        self.state.deployment_detail.clear();
        self.state.service_detail.clear();
        self.state.selected_pod = None;
        self.state.selected_deployment = None;
        self.state.selected_service = None;
        self.state.metrics_enabled = false;
        self.state.pod_metrics = None;
    }

    /// Forgets everything fetched for the previous namespace.
    fn change_namespace(&mut self, name: String) {
        let Some(session) = self.state.cluster.as_mut() else {
            return;
        };

        if session.info.namespace == name {
            return;
        }

        logger!(info, "namespace {} -> {}", session.info.namespace, name);

        session.info.namespace = name;

        self.state.pods.clear();
        self.state.pod_metrics = None;
        self.state.deployments.clear();
        self.state.services.clear();
        self.state.events.clear();
    }

    pub(super) fn fetch(&mut self, request: ClusterRequest) -> Vec<Task> {
        let Some(task) = self.cluster_task(request) else {
            return vec![];
        };

        self.state.loading = true;

        vec![task]
    }

    pub(super) fn fetch_remote(&mut self, request: RemoteRequest) -> Vec<Task> {
        let Some(task) = self.remote_task(request) else {
            return vec![];
        };

        self.state.loading = true;

        vec![task]
    }

    pub(super) fn fetch_in_namespace(
        &mut self,
        build: impl FnOnce(String) -> ClusterRequest,
    ) -> Vec<Task> {
        let Some(namespace) = self.state.namespace().map(str::to_string) else {
            return vec![];
        };

        self.fetch(build(namespace))
    }

    /// Pods, and their usage while the metrics columns are shown.
    pub(super) fn fetch_pods(&mut self) -> Vec<Task> {
        let mut tasks = self.fetch_in_namespace(|namespace| ClusterRequest::Pods { namespace });

        if self.state.metrics_enabled {
            tasks.extend(self.fetch_metrics());
        }

        tasks
    }

    /// Not tracked by the loading indicator.
    pub(super) fn fetch_metrics(&self) -> Option<Task> {
        let namespace = self.state.namespace()?.to_string();

        self.cluster_task(ClusterRequest::Metrics { namespace })
    }

    pub(super) fn fetch_events(&mut self) -> Vec<Task> {
        self.fetch_in_namespace(|namespace| ClusterRequest::Events { namespace })
    }

    pub(super) fn go_namespaces(&mut self) -> Vec<Task> {
        self.switch_view(ViewState::Namespaces);
        self.fetch(ClusterRequest::Namespaces)
    }

    pub(super) fn go_pods(&mut self) -> Vec<Task> {
        self.switch_view(ViewState::Pods);
        self.state.selected_pod = None;

        let mut tasks = self.fetch_pods();
        tasks.extend(self.schedule_refresh(RefreshTarget::Pods));
        tasks
    }

    pub(super) fn go_deployments(&mut self) -> Vec<Task> {
        self.switch_view(ViewState::Deployments);
        self.fetch_in_namespace(|namespace| ClusterRequest::Deployments { namespace })
    }

    pub(super) fn go_services(&mut self) -> Vec<Task> {
        self.switch_view(ViewState::Services);
        self.fetch_in_namespace(|namespace| ClusterRequest::Services { namespace })
    }

    pub(super) fn go_events(&mut self) -> Vec<Task> {
        self.switch_view(ViewState::Events);

        let mut tasks = self.fetch_events();
        tasks.extend(self.schedule_refresh(RefreshTarget::Events));
        tasks
    }

    pub(super) fn go_pod_details(&mut self, name: String) -> Vec<Task> {
        self.switch_view(ViewState::PodDetails);
        self.state.pod_detail.clear();
        self.state.selected_pod = Some(name.clone());

        self.fetch_in_namespace(|namespace| ClusterRequest::PodDetail { namespace, name })
    }

    pub(super) fn go_deployment_details(&mut self, name: String) -> Vec<Task> {
        self.switch_view(ViewState::DeploymentDetails);
        self.state.deployment_detail.clear();
        self.state.selected_deployment = Some(name.clone());

        self.fetch_in_namespace(|namespace| ClusterRequest::DeploymentDetail { namespace, name })
    }

    pub(super) fn go_service_details(&mut self, name: String) -> Vec<Task> {
        self.switch_view(ViewState::ServiceDetails);
        self.state.service_detail.clear();
        self.state.selected_service = Some(name.clone());

        self.fetch_in_namespace(|namespace| ClusterRequest::ServiceDetail { namespace, name })
    }

    /// Entered with `9`; an open remote session is closed first.
    pub(super) fn go_ssh_hosts(&mut self) -> Vec<Task> {
        let tasks = self.disconnect_remote().into_iter().collect();

        self.switch_view(ViewState::SshHosts);
        self.state.connection_error = None;

        tasks
    }

    pub(super) fn go_remote_containers(&mut self) -> Vec<Task> {
        self.switch_view(ViewState::RemoteContainers);
        self.fetch_remote(RemoteRequest::Containers)
    }

    /// Fetches the containers of a pod; the log view opens once they arrive.
    pub(super) fn open_logs(&mut self, pod: String, parent: ViewState) -> Vec<Task> {
        self.state.log_parent = parent;
        self.state.selected_pod = Some(pod.clone());

        self.fetch_in_namespace(|namespace| ClusterRequest::Containers { namespace, pod })
    }

    pub(super) fn fetch_logs(&mut self) -> Vec<Task> {
        let Some(target) = self.state.log_target.clone() else {
            return vec![];
        };

        let options = self.state.log_viewer.options();

        self.fetch(ClusterRequest::Logs { target, options })
    }

    pub(super) fn fetch_remote_logs(&mut self) -> Vec<Task> {
        let Some(container) = &self.state.remote_log_container else {
            return vec![];
        };

        let request = RemoteRequest::Logs {
            container_id: container.id.clone(),
            options: self.state.remote_log_viewer.options(),
        };

        self.fetch_remote(request)
    }

    /// Fixed parent of each view. Logs return to the view they were opened from.
    pub(super) fn back(&mut self) -> Vec<Task> {
        match self.state.view {
            ViewState::Main => {
                if self.state.is_connected() {
                    self.go_pods()
                } else {
                    self.back_to_config_select()
                }
            }
            ViewState::Namespaces => self.back_to_config_select(),
            ViewState::Pods => self.go_namespaces(),
            ViewState::PodDetails
            | ViewState::MultiPodLogs
            | ViewState::Deployments
            | ViewState::Services
            | ViewState::Events => self.go_pods(),
            ViewState::Logs => match self.state.log_parent {
                ViewState::PodDetails => match self.state.selected_pod.clone() {
                    Some(name) => self.go_pod_details(name),
                    None => self.go_pods(),
                },
                _ => self.go_pods(),
            },
            ViewState::DeploymentDetails => self.go_deployments(),
            ViewState::ServiceDetails => self.go_services(),
            ViewState::SshHosts => {
                if self.state.is_connected() {
                    self.go_pods()
                } else {
                    self.go_namespaces()
                }
            }
            ViewState::RemoteContainers => self.go_ssh_hosts(),
            ViewState::RemoteLogs | ViewState::NodeInfo => self.go_remote_containers(),
            ViewState::ConfigSelect | ViewState::Connecting | ViewState::SshConnecting => vec![],
        }
    }

    fn back_to_config_select(&mut self) -> Vec<Task> {
        if self.state.clusters.items().len() <= 1 {
            return vec![];
        }

        self.disconnect_cluster();
        self.switch_view(ViewState::ConfigSelect);

        vec![]
    }

    /// `enter` on the current view.
    pub(super) fn select(&mut self) -> Vec<Task> {
        match self.state.view {
            ViewState::ConfigSelect => match self.state.clusters.selected().cloned() {
                Some(entry) => self.connect(entry),
                None => vec![],
            },
            ViewState::Main => self.retry_connect(),
            ViewState::Namespaces => {
                let Some(name) = self.state.namespaces.selected().map(|ns| ns.name.clone()) else {
                    return vec![];
                };

                self.change_namespace(name);

                self.go_pods()
            }
            ViewState::Pods => match self.state.pods.selected().map(|pod| pod.name.clone()) {
                Some(name) => self.go_pod_details(name),
                None => vec![],
            },
            ViewState::Deployments => {
                match self.state.deployments.selected().map(|d| d.name.clone()) {
                    Some(name) => self.go_deployment_details(name),
                    None => vec![],
                }
            }
            ViewState::Services => match self.state.services.selected().map(|s| s.name.clone()) {
                Some(name) => self.go_service_details(name),
                None => vec![],
            },
            ViewState::SshHosts => match self.state.hosts.selected().cloned() {
                Some(host) => {
                    logger!(info, "connecting to host {}", host.name);

                    let client = (self.connector)(&host);

                    self.state.remote = Some(RemoteSession {
                        host,
                        client,
                        connected: false,
                    });
                    self.switch_view(ViewState::SshConnecting);
                    self.state.connection_error = None;

                    self.fetch_remote(RemoteRequest::Connect { passphrase: None })
                }
                None => vec![],
            },
            ViewState::RemoteContainers => {
                let Some(container) = self.state.remote_containers.selected().cloned() else {
                    return vec![];
                };

                self.switch_view(ViewState::RemoteLogs);
                self.state.remote_stream.stop();
                self.state.remote_log_viewer.reset(format!(
                    "{} ({})",
                    container.name,
                    container.short_id()
                ));
                self.state.remote_log_container = Some(container);

                self.fetch_remote_logs()
            }
            _ => vec![],
        }
    }

    /// `r` on the current view.
    pub(super) fn reload(&mut self) -> Vec<Task> {
        match self.state.view {
            ViewState::Main => self.retry_connect(),
            ViewState::Namespaces => self.fetch(ClusterRequest::Namespaces),
            ViewState::Pods => self.fetch_pods(),
            ViewState::PodDetails => match self.state.selected_pod.clone() {
                Some(name) => {
                    self.fetch_in_namespace(|namespace| ClusterRequest::PodDetail { namespace, name })
                }
                None => vec![],
            },
            ViewState::Logs => {
                self.state.pod_stream.stop();
                self.state.log_viewer.set_following(false);
                self.fetch_logs()
            }
            ViewState::Deployments => {
                self.fetch_in_namespace(|namespace| ClusterRequest::Deployments { namespace })
            }
            ViewState::DeploymentDetails => {
                match self.state.selected_deployment.clone() {
                    Some(name) => self.fetch_in_namespace(|namespace| {
                        ClusterRequest::DeploymentDetail { namespace, name }
                    }),
                    None => vec![],
                }
            }
            ViewState::Services => {
                self.fetch_in_namespace(|namespace| ClusterRequest::Services { namespace })
            }
            ViewState::ServiceDetails => {
                match self.state.selected_service.clone() {
                    Some(name) => self.fetch_in_namespace(|namespace| {
                        ClusterRequest::ServiceDetail { namespace, name }
                    }),
                    None => vec![],
                }
            }
            ViewState::Events => self.fetch_events(),
            ViewState::RemoteContainers => self.fetch_remote(RemoteRequest::Containers),
            ViewState::RemoteLogs => {
                self.state.remote_stream.stop();
                self.state.remote_log_viewer.set_following(false);
                self.fetch_remote_logs()
            }
            ViewState::NodeInfo => self.fetch_remote(RemoteRequest::NodeInfo),
            ViewState::ConfigSelect
            | ViewState::Connecting
            | ViewState::MultiPodLogs
            | ViewState::SshHosts
            | ViewState::SshConnecting => vec![],
        }
    }
}
