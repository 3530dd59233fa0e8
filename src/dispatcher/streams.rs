use crate::{
    features::{modal::PodChoice, notification::NotificationKind},
    kube::{LogOptions, LogTarget},
    logger,
    stream::{
        LogSource, MultiEnd, SourceKey, StreamChannel, StreamError, StreamId, StreamMessage,
        StreamEnd,
    },
    task::Task,
};

use super::{Dispatcher, ViewState};

impl Dispatcher {
    /// Follows the current pod log from now on; history is already displayed.
    pub(super) fn start_pod_stream(&mut self) -> Vec<Task> {
        let (Some(session), Some(target)) = (&self.state.cluster, &self.state.log_target) else {
            return vec![];
        };

        let source = LogSource::Pod {
            client: session.client.clone(),
            target: target.clone(),
            options: LogOptions {
                tail_lines: Some(0),
                timestamps: self.state.log_viewer.timestamps(),
            },
        };

        let key = SourceKey::container(&target.pod, &target.container);

        logger!(info, "start following {}", key);

        vec![self.state.pod_stream.start(key, source)]
    }

    pub(super) fn start_remote_stream(&mut self) -> Vec<Task> {
        let (Some(session), Some(container)) =
            (&self.state.remote, &self.state.remote_log_container)
        else {
            return vec![];
        };

        let source = LogSource::Remote {
            client: session.client.clone(),
            container_id: container.id.clone(),
            options: LogOptions {
                tail_lines: Some(0),
                timestamps: self.state.remote_log_viewer.timestamps(),
            },
        };

        let key = SourceKey::remote(&container.id);

        logger!(info, "start following {}", key);

        vec![self.state.remote_stream.start(key, source)]
    }

    /// One source per chosen pod, each tailing its first container.
    pub(super) fn start_multi_stream(&mut self, choices: Vec<PodChoice>) -> Vec<Task> {
        let Some(session) = &self.state.cluster else {
            return vec![];
        };

        let namespace = session.namespace().to_string();
        let options = LogOptions {
            tail_lines: Some(self.state.tail_lines),
            timestamps: false,
        };

        let sources: Vec<(SourceKey, LogSource)> = choices
            .into_iter()
            .filter_map(|choice| {
                let container = choice.container?;

                Some((
                    SourceKey::container(&choice.name, &container),
                    LogSource::Pod {
                        client: session.client.clone(),
                        target: LogTarget::new(&namespace, &choice.name, &container),
                        options,
                    },
                ))
            })
            .collect();

        if sources.is_empty() {
            return vec![self.notify(
                NotificationKind::Warning,
                "None of the selected pods has a container",
            )];
        }

        logger!(info, "start following {} pods", sources.len());

        self.switch_view(ViewState::MultiPodLogs);
        self.state
            .multi_log_viewer
            .reset(sources.iter().map(|(key, _)| key.clone()).collect());

        self.state.multi_stream.start(sources)
    }

    pub(super) fn on_stream(&mut self, message: StreamMessage) -> Vec<Task> {
        match message {
            StreamMessage::Line { id, line, queue } => {
                if !self.on_line(&id, line) {
                    logger!(debug, "dropped line of stale stream {:?}", id);
                    return vec![];
                }

                vec![Task::NextLine(queue)]
            }
            StreamMessage::Ended { id, error } => match id.channel {
                StreamChannel::PodLogs => self.on_single_ended(&id, error, ViewState::Logs),
                StreamChannel::RemoteLogs => self.on_single_ended(&id, error, ViewState::RemoteLogs),
                StreamChannel::MultiPodLogs => self.on_multi_ended(&id, error),
            },
        }
    }

    /// Returns false when the line belongs to a session that is no longer current.
    fn on_line(&mut self, id: &StreamId, line: String) -> bool {
        match id.channel {
            StreamChannel::PodLogs if self.state.pod_stream.record_line(id) => {
                self.state.log_viewer.push_line(line);
            }
            StreamChannel::RemoteLogs if self.state.remote_stream.record_line(id) => {
                self.state.remote_log_viewer.push_line(line);
            }
            StreamChannel::MultiPodLogs if self.state.multi_stream.record_line(id) => {
                self.state.multi_log_viewer.push(&id.key, &line);
            }
            _ => return false,
        }

        true
    }

    fn on_single_ended(
        &mut self,
        id: &StreamId,
        error: Option<StreamError>,
        view: ViewState,
    ) -> Vec<Task> {
        let (stream, following) = match id.channel {
            StreamChannel::RemoteLogs => (
                &mut self.state.remote_stream,
                self.state.remote_log_viewer.is_following(),
            ),
            _ => (
                &mut self.state.pod_stream,
                self.state.log_viewer.is_following(),
            ),
        };

        let error = match stream.on_ended(id, error) {
            StreamEnd::Stale | StreamEnd::Cancelled => return vec![],
            StreamEnd::Closed(error) => error,
        };

        if following && self.state.view == view {
            logger!(debug, "stream {} ended, restarting", id.key);
            return stream.restart().into_iter().collect();
        }

        stream.stop();

        match error {
            Some(error) => vec![self.notify(
                NotificationKind::Info,
                format!("Log stream ended: {}", error),
            )],
            None => vec![],
        }
    }

    fn on_multi_ended(&mut self, id: &StreamId, error: Option<StreamError>) -> Vec<Task> {
        let restart = self.state.view == ViewState::MultiPodLogs;

        match self.state.multi_stream.on_ended(id, error, restart) {
            MultiEnd::Stale | MultiEnd::Cancelled => vec![],
            MultiEnd::Restarted(task) => {
                logger!(debug, "stream {} ended, restarting", id.key);
                vec![task]
            }
            MultiEnd::Ended { error, remaining } => {
                logger!(info, "stream {} ended ({} remaining)", id.key, remaining);

                match error {
                    Some(error) => vec![self.notify(
                        NotificationKind::Info,
                        format!("Log stream of {} ended: {}", id.key, error),
                    )],
                    None => vec![],
                }
            }
        }
    }
}
