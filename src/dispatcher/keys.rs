use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    features::{
        modal::{ConfirmAction, Modal as _},
        notification::NotificationKind,
    },
    task::{RemoteRequest, Task},
};

use super::{Dispatcher, ViewState};

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Printable key without `ctrl`/`alt`. Shift is part of the character.
fn plain_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

impl Dispatcher {
    pub(super) fn on_key(&mut self, key: KeyEvent) -> Vec<Task> {
        if let Some(kind) = self.state.modals.visible() {
            return self.on_modal_key(kind, key);
        }

        if is_ctrl_c(&key) {
            return self.quit();
        }

        if self.state.view.is_connecting() {
            return vec![];
        }

        if self.state.is_filter_editing() {
            self.on_child_key(key);
            return vec![];
        }

        if let Some(tasks) = self.on_global_key(&key) {
            return tasks;
        }

        self.on_view_key(key)
    }

    fn on_global_key(&mut self, key: &KeyEvent) -> Option<Vec<Task>> {
        let tasks = match plain_char(key)? {
            'q' => self.quit(),
            '?' => {
                self.state.modals.help.show(());
                vec![]
            }
            c @ '1'..='5' => {
                let next = match c {
                    '1' => ViewState::Namespaces,
                    '2' => ViewState::Pods,
                    '3' => ViewState::Deployments,
                    '4' => ViewState::Services,
                    _ => ViewState::Events,
                };

                if !self.state.is_connected() || self.state.view == next {
                    return Some(vec![]);
                }

                match next {
                    ViewState::Namespaces => self.go_namespaces(),
                    ViewState::Pods => self.go_pods(),
                    ViewState::Deployments => self.go_deployments(),
                    ViewState::Services => self.go_services(),
                    _ => self.go_events(),
                }
            }
            '9' => {
                if self.state.hosts.items().is_empty() {
                    return Some(vec![]);
                }

                self.go_ssh_hosts()
            }
            _ => return None,
        };

        Some(tasks)
    }

    fn on_view_key(&mut self, key: KeyEvent) -> Vec<Task> {
        let view = self.state.view;

        match key.code {
            KeyCode::Enter => return self.select(),
            KeyCode::Esc => {
                if self.on_child_key(key) {
                    return vec![];
                }

                return self.back();
            }
            _ => {}
        }

        let Some(c) = plain_char(&key) else {
            self.on_child_key(key);
            return vec![];
        };

        match (view, c) {
            (ViewState::Main, 'r') => self.retry_connect(),
            (_, 'r') => self.reload(),

            (ViewState::Pods, 'l') => match self.state.pods.selected().map(|p| p.name.clone()) {
                Some(pod) => self.open_logs(pod, ViewState::Pods),
                None => vec![],
            },
            (ViewState::PodDetails, 'l') => match self.state.selected_pod.clone() {
                Some(pod) => self.open_logs(pod, ViewState::PodDetails),
                None => vec![],
            },
            (ViewState::Pods, 'L') => self.show_pod_selector(),
            (ViewState::Pods, 'm') => self.toggle_metrics(),
            (ViewState::Pods | ViewState::PodDetails, 'd' | 'R') => {
                let action = if c == 'd' {
                    ConfirmAction::DeletePod
                } else {
                    ConfirmAction::RestartPod
                };

                if let Some(pod) = self.current_pod() {
                    self.show_confirm(action, pod);
                }

                vec![]
            }
            (ViewState::Deployments | ViewState::DeploymentDetails, 'd' | 'R') => {
                let action = if c == 'd' {
                    ConfirmAction::DeleteDeployment
                } else {
                    ConfirmAction::RestartDeployment
                };

                if let Some((name, _)) = self.current_deployment() {
                    self.show_confirm(action, name);
                }

                vec![]
            }
            (ViewState::Deployments | ViewState::DeploymentDetails, 's') => {
                if let Some((name, replicas)) = self.current_deployment() {
                    self.show_scale(name, replicas);
                }

                vec![]
            }

            (ViewState::Logs, 'f') => {
                if self.state.log_viewer.toggle_following() {
                    self.start_pod_stream()
                } else {
                    self.state.pod_stream.stop();
                    vec![]
                }
            }
            (ViewState::RemoteLogs, 'f') => {
                if self.state.remote_log_viewer.toggle_following() {
                    self.start_remote_stream()
                } else {
                    self.state.remote_stream.stop();
                    vec![]
                }
            }
            (ViewState::MultiPodLogs, 'f') => {
                self.state.multi_log_viewer.toggle_following();
                vec![]
            }
            (ViewState::Events, 'f') => {
                self.state.events.toggle_following();
                vec![]
            }
            (ViewState::Logs, 't') => {
                self.state.log_viewer.toggle_timestamps();
                self.reload()
            }
            (ViewState::RemoteLogs, 't') => {
                self.state.remote_log_viewer.toggle_timestamps();
                self.reload()
            }
            (ViewState::Logs, 'c') => {
                if self.state.log_containers.len() > 1 {
                    self.show_container_selector();
                }

                vec![]
            }
            (ViewState::Logs | ViewState::RemoteLogs, '/') => {
                self.show_search();
                vec![]
            }
            (ViewState::Logs | ViewState::RemoteLogs, 'n' | 'N') => {
                if let Some(viewer) = self.state.active_log_viewer_mut() {
                    if viewer.search_query().is_some() {
                        if c == 'n' {
                            viewer.next_match();
                        } else {
                            viewer.prev_match();
                        }
                    }
                }

                vec![]
            }
            (ViewState::Events, 'w') => {
                self.state.events.toggle_warnings_only();
                vec![]
            }
            (ViewState::Events, 'k') => {
                self.state.events.cycle_kind_filter();
                vec![]
            }
            (ViewState::RemoteContainers, 'i') => {
                self.switch_view(ViewState::NodeInfo);
                self.fetch_remote(RemoteRequest::NodeInfo)
            }
            _ => {
                self.on_child_key(key);
                vec![]
            }
        }
    }

    /// Hands the key to the current view's child model.
    fn on_child_key(&mut self, key: KeyEvent) -> bool {
        let state = &mut self.state;

        match state.view {
            ViewState::ConfigSelect => state.clusters.handle_key(key),
            ViewState::Namespaces => state.namespaces.handle_key(key),
            ViewState::Pods => state.pods.handle_key(key),
            ViewState::PodDetails => state.pod_detail.handle_key(key),
            ViewState::Logs => state.log_viewer.handle_key(key),
            ViewState::MultiPodLogs => state.multi_log_viewer.handle_key(key),
            ViewState::Deployments => state.deployments.handle_key(key),
            ViewState::DeploymentDetails => state.deployment_detail.handle_key(key),
            ViewState::Services => state.services.handle_key(key),
            ViewState::ServiceDetails => state.service_detail.handle_key(key),
            ViewState::Events => state.events.handle_key(key),
            ViewState::SshHosts => state.hosts.handle_key(key),
            ViewState::RemoteContainers => state.remote_containers.handle_key(key),
            ViewState::RemoteLogs => state.remote_log_viewer.handle_key(key),
            ViewState::NodeInfo => state.node_info.handle_key(key),
            ViewState::Main | ViewState::Connecting | ViewState::SshConnecting => false,
        }
    }

    fn toggle_metrics(&mut self) -> Vec<Task> {
        if !self.state.metrics_available() {
            return vec![self.notify(
                NotificationKind::Warning,
                "Metrics not available (metrics-server not installed)",
            )];
        }

        self.state.metrics_enabled = !self.state.metrics_enabled;

        if self.state.metrics_enabled && self.state.pod_metrics.is_none() {
            return self.fetch_metrics().into_iter().collect();
        }

        vec![]
    }

    fn current_pod(&self) -> Option<String> {
        match self.state.view {
            ViewState::Pods => self.state.pods.selected().map(|p| p.name.clone()),
            ViewState::PodDetails => self.state.selected_pod.clone(),
            _ => None,
        }
    }

    fn current_deployment(&self) -> Option<(String, i32)> {
        let deployment = match self.state.view {
            ViewState::Deployments => self.state.deployments.selected(),
            ViewState::DeploymentDetails => self.state.deployment_detail.item(),
            _ => None,
        }?;

        Some((deployment.name.clone(), deployment.replicas))
    }
}
