use tokio_util::sync::CancellationToken;

use crate::task::Task;

use super::{LogSource, SourceKey, StreamChannel, StreamError, StreamId, StreamSession};

/// How a stream-ended message was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The message belongs to a session that was replaced or stopped.
    Stale,
    Cancelled,
    /// The queue closed, optionally with an error description.
    Closed(Option<String>),
}

/// At most one session for a log view.
#[derive(Debug)]
pub struct SingleStream {
    channel: StreamChannel,
    generation: u64,
    session: Option<StreamSession>,
}

impl SingleStream {
    pub fn new(channel: StreamChannel) -> Self {
        Self {
            channel,
            generation: 0,
            session: None,
        }
    }

    /// Replaces any running session.
    pub fn start(&mut self, key: SourceKey, source: LogSource) -> Task {
        self.stop();

        let session = StreamSession::new(self.next_id(key), CancellationToken::new(), source);
        let task = session.task(None);

        self.session = Some(session);

        task
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.active)
    }

    pub fn source(&self) -> Option<&LogSource> {
        self.session.as_ref().map(|s| &s.source)
    }

    pub fn accepts(&self, id: &StreamId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.active && s.id == *id)
    }

    /// Like [`Self::accepts`], and counts the line towards the restart policy.
    pub fn record_line(&mut self, id: &StreamId) -> bool {
        self.session.as_mut().is_some_and(|s| s.record_line(id))
    }

    pub fn on_ended(&mut self, id: &StreamId, error: Option<StreamError>) -> StreamEnd {
        let Some(session) = self.session.as_mut().filter(|s| s.id == *id) else {
            return StreamEnd::Stale;
        };

        session.active = false;

        match error {
            Some(StreamError::Cancelled) => {
                self.session = None;
                StreamEnd::Cancelled
            }
            Some(StreamError::Failed(message)) => StreamEnd::Closed(Some(message)),
            None => StreamEnd::Closed(None),
        }
    }

    /// Reopens an ended session without historical tail.
    pub fn restart(&mut self) -> Option<Task> {
        let ended = self.session.take_if(|s| !s.active)?;

        let id = self.next_id(ended.id.key.clone());
        let (session, task) = ended.successor(id, CancellationToken::new());

        self.session = Some(session);

        Some(task)
    }

    fn next_id(&mut self, key: SourceKey) -> StreamId {
        self.generation += 1;

        StreamId {
            channel: self.channel,
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
        stream::{testing::pod_source, StreamTask, RESTART_BACKOFF},
    };

    use super::*;

    fn stream_task(task: Task) -> StreamTask {
        match task {
            Task::Stream(task) => task,
            task => panic!("unexpected task {:?}", task),
        }
    }

    fn started() -> (SingleStream, StreamId) {
        let mut stream = SingleStream::new(StreamChannel::PodLogs);

        let task = stream_task(stream.start(
            SourceKey::container("web-7", "app"),
            pod_source(MockTestClusterClient::new(), "web-7", 100),
        ));

        (stream, task.id().clone())
    }

    #[test]
    fn 開始したセッションはアクティブ() {
        let (stream, id) = started();

        assert!(stream.is_active());
        assert!(stream.accepts(&id));
        assert_eq!(id.generation, 1);
    }

    #[test]
    fn 停止は二回呼んでも問題ない() {
        let (mut stream, id) = started();

        stream.stop();
        stream.stop();

        assert!(!stream.is_active());
        assert!(!stream.accepts(&id));
    }

    #[test]
    fn 再開始すると古いセッションのメッセージは無視される() {
        let (mut stream, old) = started();

        let new = stream_task(stream.start(
            SourceKey::container("web-7", "app"),
            pod_source(MockTestClusterClient::new(), "web-7", 100),
        ));

        assert!(!stream.accepts(&old));
        assert!(stream.accepts(new.id()));
        assert_eq!(stream.on_ended(&old, None), StreamEnd::Stale);
        assert!(stream.is_active());
    }

    #[test]
    fn エラー無しで終了すると再起動はテール0で一度だけ() {
        let (mut stream, id) = started();

        assert_eq!(stream.on_ended(&id, None), StreamEnd::Closed(None));

        let task = stream_task(stream.restart().expect("restart task"));

        assert_eq!(task.source().options().tail_lines, Some(0));
        assert_eq!(task.delay(), None);
        assert_eq!(task.id().generation, 2);
        assert!(stream.is_active());
        assert!(stream.restart().is_none());
    }

    #[test]
    fn 行を受け取らずに再び閉じた時だけ待ってから再起動する() {
        let (mut stream, id) = started();

        stream.on_ended(&id, None);
        let first = stream_task(stream.restart().expect("restart task"));

        stream.on_ended(first.id(), None);
        let second = stream_task(stream.restart().expect("restart task"));

        assert_eq!(first.delay(), None);
        assert_eq!(second.delay(), Some(RESTART_BACKOFF));

        assert!(stream.record_line(second.id()));
        stream.on_ended(second.id(), None);
        let third = stream_task(stream.restart().expect("restart task"));

        assert_eq!(third.delay(), None);
    }

    #[test]
    fn 古いセッションの行は記録しない() {
        let (mut stream, old) = started();

        stream.stop();

        assert!(!stream.record_line(&old));
    }

    #[test]
    fn キャンセルで終了すると再起動しない() {
        let (mut stream, id) = started();

        assert_eq!(
            stream.on_ended(&id, Some(StreamError::Cancelled)),
            StreamEnd::Cancelled
        );
        assert!(stream.restart().is_none());
        assert!(!stream.is_active());
    }

    #[test]
    fn 失敗メッセージを返す() {
        let (mut stream, id) = started();

        assert_eq!(
            stream.on_ended(&id, Some(StreamError::Failed("EOF".to_string()))),
            StreamEnd::Closed(Some("EOF".to_string()))
        );
    }
}
