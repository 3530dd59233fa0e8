use crate::{logger, task::Task};

use super::{Dispatcher, ViewState};

/// View owning a periodically refreshed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RefreshTarget {
    Pods,
    Events,
}

impl RefreshTarget {
    pub fn view(self) -> ViewState {
        match self {
            Self::Pods => ViewState::Pods,
            Self::Events => ViewState::Events,
        }
    }
}

impl Dispatcher {
    pub(super) fn schedule_refresh(&self, target: RefreshTarget) -> Option<Task> {
        self.state.cluster.as_ref()?;

        Some(Task::ScheduleRefresh {
            after: self.state.refresh_interval,
            target,
        })
    }

    /// The chain ends once a tick finds its view no longer current.
    /// While blocked the fetch is skipped but the next tick is still armed.
    pub(super) fn on_refresh(&mut self, target: RefreshTarget) -> Vec<Task> {
        if self.state.view != target.view() {
            logger!(debug, "{} refresh stopped in {}", target, self.state.view);
            return vec![];
        }

        let mut tasks = Vec::new();

        if !self.is_refresh_blocked(target) {
            tasks.extend(match target {
                RefreshTarget::Pods => self.fetch_pods(),
                RefreshTarget::Events => self.fetch_events(),
            });
        }

        tasks.extend(self.schedule_refresh(target));

        tasks
    }

    fn is_refresh_blocked(&self, target: RefreshTarget) -> bool {
        if self.state.modals.visible().is_some() {
            return true;
        }

        match target {
            RefreshTarget::Pods => self.state.pods.is_filter_editing(),
            RefreshTarget::Events => !self.state.events.is_following(),
        }
    }
}
