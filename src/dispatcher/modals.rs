use ratatui::crossterm::event::KeyEvent;

use crate::{
    features::{
        modal::{
            ConfirmAction, ConfirmRequest, ContainerArgs, Modal, ModalKind, ModalState, PodChoice,
            ScaleArgs,
        },
        notification::NotificationKind,
    },
    kube::Mutation,
    logger,
    task::{ClusterRequest, RemoteRequest, Task},
};

use super::{Dispatcher, ViewState};

/// Hides `modal` once it has been decided and hands back the decision.
fn decide<M: Modal>(modal: &mut M, key: KeyEvent) -> ModalState<M::Output> {
    let state = modal.update(key);

    if !matches!(state, ModalState::Pending) {
        modal.hide();
    }

    state
}

impl Dispatcher {
    pub(super) fn on_modal_key(&mut self, kind: ModalKind, key: KeyEvent) -> Vec<Task> {
        let modals = &mut self.state.modals;

        match kind {
            ModalKind::Confirm => match decide(&mut modals.confirm, key) {
                ModalState::Confirmed(request) => self.mutate(request.action.mutation(&request.target)),
                _ => vec![],
            },
            ModalKind::Scale => match decide(&mut modals.scale, key) {
                ModalState::Confirmed(request) => self.mutate(Mutation::ScaleDeployment {
                    name: request.deployment,
                    replicas: request.replicas,
                }),
                _ => vec![],
            },
            ModalKind::Help => {
                decide(&mut modals.help, key);
                vec![]
            }
            ModalKind::ContainerSelector => match decide(&mut modals.container, key) {
                ModalState::Confirmed(container) => self.change_container(container),
                _ => vec![],
            },
            ModalKind::PodSelector => match decide(&mut modals.pods, key) {
                ModalState::Confirmed(choices) => self.start_multi_stream(choices),
                _ => vec![],
            },
            ModalKind::Passphrase => match decide(&mut modals.passphrase, key) {
                ModalState::Confirmed(passphrase) => {
                    self.state.loading = true;
                    self.remote_task(RemoteRequest::Connect {
                        passphrase: Some(passphrase),
                    })
                    .into_iter()
                    .collect()
                }
                ModalState::Cancelled => {
                    let tasks = self.disconnect_remote().into_iter().collect();
                    self.switch_view(ViewState::SshHosts);
                    tasks
                }
                ModalState::Pending => vec![],
            },
            ModalKind::Search => {
                let state = decide(&mut modals.search, key);
                self.on_search(state);
                vec![]
            }
        }
    }

    fn mutate(&mut self, mutation: Mutation) -> Vec<Task> {
        let Some(namespace) = self.state.namespace().map(str::to_string) else {
            return vec![];
        };

        logger!(info, "request {} in {}", mutation.describe(), namespace);

        self.cluster_task(ClusterRequest::Mutate {
            namespace,
            mutation,
        })
        .into_iter()
        .collect()
    }

    /// The query applies while typing; `esc` drops it.
    fn on_search(&mut self, state: ModalState<String>) {
        let query = match &state {
            ModalState::Pending => self.state.modals.search.query().to_string(),
            ModalState::Confirmed(query) => query.clone(),
            ModalState::Cancelled => String::new(),
        };

        let Some(viewer) = self.state.active_log_viewer_mut() else {
            return;
        };

        if query.is_empty() {
            viewer.clear_search();
        } else {
            viewer.set_search(&query);
        }

        let status = viewer.search_status();

        self.state.modals.search.set_match_status(status);
    }

    pub(super) fn show_confirm(&mut self, action: ConfirmAction, target: String) {
        self.state
            .modals
            .confirm
            .show(ConfirmRequest::new(action, target));
    }

    pub(super) fn show_scale(&mut self, deployment: String, current: i32) {
        self.state.modals.scale.show(ScaleArgs {
            deployment,
            current,
        });
    }

    pub(super) fn show_container_selector(&mut self) {
        let containers = self.state.log_containers.clone();
        let current = self.state.log_target.as_ref().map(|t| t.container.clone());

        self.state
            .modals
            .container
            .show(ContainerArgs { containers, current });
    }

    pub(super) fn show_pod_selector(&mut self) -> Vec<Task> {
        let pods: Vec<PodChoice> = self
            .state
            .pods
            .visible_items()
            .map(|pod| PodChoice {
                name: pod.name.clone(),
                container: pod.containers.first().cloned(),
            })
            .collect();

        if pods.is_empty() {
            return vec![self.notify(NotificationKind::Warning, "No pods to select")];
        }

        self.state.modals.pods.show(pods);

        vec![]
    }

    pub(super) fn show_search(&mut self) {
        let Some(viewer) = self.state.active_log_viewer_mut() else {
            return;
        };

        let query = viewer.search_query().unwrap_or_default().to_string();

        self.state.modals.search.show(query);
    }
}
