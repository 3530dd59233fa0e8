use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

use crate::task::Task;

use super::{LogSource, SourceKey, StreamChannel, StreamError, StreamId, StreamSession};

#[derive(Debug)]
pub enum MultiEnd {
    Stale,
    Cancelled,
    Restarted(Task),
    Ended {
        error: Option<String>,
        remaining: usize,
    },
}

/// One producer per source, all children of a shared cancellation scope.
#[derive(Debug, Default)]
pub struct MultiStream {
    generation: u64,
    parent: Option<CancellationToken>,
    sessions: BTreeMap<SourceKey, StreamSession>,
    active_count: usize,
}

impl MultiStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, sources: Vec<(SourceKey, LogSource)>) -> Vec<Task> {
        self.stop();

        let parent = CancellationToken::new();

        let mut tasks = Vec::with_capacity(sources.len());

        for (key, source) in sources {
            let session = StreamSession::new(self.next_id(key.clone()), parent.child_token(), source);

            tasks.push(session.task(None));

            self.sessions.insert(key, session);
        }

        self.active_count = self.sessions.len();
        self.parent = Some(parent);

        tasks
    }

    /// Cancels the shared scope and with it every child producer. Idempotent.
    pub fn stop(&mut self) {
        if let Some(parent) = self.parent.take() {
            parent.cancel();
        }

        for session in self.sessions.values_mut() {
            session.stop();
        }

        self.sessions.clear();
        self.active_count = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active_count > 0
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn accepts(&self, id: &StreamId) -> bool {
        self.sessions
            .get(&id.key)
            .is_some_and(|s| s.active && s.id == *id)
    }

    pub fn record_line(&mut self, id: &StreamId) -> bool {
        self.sessions
            .get_mut(&id.key)
            .is_some_and(|s| s.record_line(id))
    }

    /// `restart` is whether the owning view still wants this source followed.
    pub fn on_ended(&mut self, id: &StreamId, error: Option<StreamError>, restart: bool) -> MultiEnd {
        if !self.sessions.get(&id.key).is_some_and(|s| s.id == *id) {
            return MultiEnd::Stale;
        }

        if matches!(error, Some(StreamError::Cancelled)) {
            self.finish(&id.key);
            return MultiEnd::Cancelled;
        }

        if restart && self.is_active() {
            if let Some(task) = self.restart(&id.key) {
                return MultiEnd::Restarted(task);
            }
        }

        self.finish(&id.key);

        MultiEnd::Ended {
            error: error.map(|err| err.to_string()),
            remaining: self.active_count,
        }
    }

    fn restart(&mut self, key: &SourceKey) -> Option<Task> {
        let token = self.parent.as_ref()?.child_token();
        let ended = self.sessions.remove(key)?;

        let id = self.next_id(key.clone());
        let (session, task) = ended.successor(id, token);

        self.sessions.insert(key.clone(), session);

        Some(task)
    }

    fn finish(&mut self, key: &SourceKey) {
        if self.sessions.remove(key).is_some() {
            self.active_count = self.active_count.saturating_sub(1);
        }
    }

    fn next_id(&mut self, key: SourceKey) -> StreamId {
        self.generation += 1;

        StreamId {
            channel: StreamChannel::MultiPodLogs,
            key,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        kube::mock::MockTestClusterClient,
        stream::{testing::pod_source, StreamMessage, StreamTask, RESTART_BACKOFF},
    };

    use super::*;

    fn stream_tasks(tasks: Vec<Task>) -> Vec<StreamTask> {
        tasks
            .into_iter()
            .map(|task| match task {
                Task::Stream(task) => task,
                task => panic!("unexpected task {:?}", task),
            })
            .collect()
    }

    fn sources(client: impl Fn() -> MockTestClusterClient) -> Vec<(SourceKey, LogSource)> {
        ["web-1", "web-2", "web-3"]
            .into_iter()
            .map(|pod| {
                (
                    SourceKey::container(pod, "app"),
                    pod_source(client(), pod, 100),
                )
            })
            .collect()
    }

    #[test]
    fn ソースごとにタスクを生成する() {
        let mut multi = MultiStream::new();

        let tasks = stream_tasks(multi.start(sources(MockTestClusterClient::new)));

        assert_eq!(tasks.len(), 3);
        assert_eq!(multi.active_count(), 3);
        assert!(tasks
            .iter()
            .all(|task| task.source().options().tail_lines == Some(100)));
        assert!(tasks.iter().all(|task| multi.accepts(task.id())));
    }

    #[test]
    fn 終了したソースだけテール0で再起動する() {
        let mut multi = MultiStream::new();

        let tasks = stream_tasks(multi.start(sources(MockTestClusterClient::new)));
        let id = tasks[1].id().clone();

        let MultiEnd::Restarted(Task::Stream(task)) = multi.on_ended(&id, None, true) else {
            panic!("expected restart");
        };

        assert_eq!(task.id().key, id.key);
        assert_eq!(task.source().options().tail_lines, Some(0));
        assert_eq!(task.delay(), None);
        assert!(!multi.accepts(&id));
        assert!(multi.accepts(task.id()));
        assert_eq!(multi.active_count(), 3);
    }

    #[test]
    fn 再起動直後に閉じ続けるソースだけ待ってから再起動する() {
        let mut multi = MultiStream::new();

        let tasks = stream_tasks(multi.start(sources(MockTestClusterClient::new)));

        let restart = |multi: &mut MultiStream, id: &StreamId| match multi.on_ended(id, None, true) {
            MultiEnd::Restarted(Task::Stream(task)) => task,
            _ => panic!("expected restart"),
        };

        let flapping = restart(&mut multi, tasks[0].id());
        let flapping = restart(&mut multi, flapping.id());

        assert!(multi.record_line(tasks[1].id()));
        let healthy = restart(&mut multi, tasks[1].id());

        assert_eq!(flapping.delay(), Some(RESTART_BACKOFF));
        assert_eq!(healthy.delay(), None);
    }

    #[test]
    fn 再起動しない終了でアクティブ数が減る() {
        let mut multi = MultiStream::new();

        let tasks = stream_tasks(multi.start(sources(MockTestClusterClient::new)));

        for (i, task) in tasks.iter().enumerate() {
            let MultiEnd::Ended { remaining, .. } = multi.on_ended(task.id(), None, false) else {
                panic!("expected end");
            };

            assert_eq!(remaining, 2 - i);
        }

        assert!(!multi.is_active());
    }

    #[tokio::test]
    async fn セッション全体をキャンセルすると全キューが閉じ再起動しない() {
        let mut multi = MultiStream::new();

        let tasks = stream_tasks(multi.start(sources(|| {
            let mut client = MockTestClusterClient::new();
            client.expect_stream_logs().never();
            client
        })));

        multi.stop();
        multi.stop();

        assert!(!multi.is_active());

        for task in tasks {
            let StreamMessage::Ended { id, error } = task.run().await else {
                panic!("expected end of stream");
            };

            assert_eq!(error, Some(StreamError::Cancelled));
            assert!(matches!(
                multi.on_ended(&id, error, true),
                MultiEnd::Stale
            ));
        }

        assert_eq!(multi.active_count(), 0);
    }
}
