//! Log streaming engine.
//!
//! A stream is a producer task feeding a bounded [`LineQueue`] and a
//! consumer that awaits one line at a time. Every awaited line re-enters the
//! application loop as a [`StreamMessage`] carrying the queue back, so the
//! loop decides whether to keep reading.

mod multi;
mod producer;
mod queue;
mod single;

use std::{fmt, time::Duration};

use anyhow::Result;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    kube::{ClusterHandle, LogOptions, LogTarget},
    remote::RemoteHandle,
    task::Task,
};

pub use self::{
    multi::{MultiEnd, MultiStream},
    producer::produce,
    queue::{line_queue, LineQueue, LineSender, QueueClosed, QUEUE_CAPACITY},
    single::{SingleStream, StreamEnd},
};

/// Delay before reconnecting a source that closed again without delivering a line.
pub const RESTART_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamChannel {
    PodLogs,
    RemoteLogs,
    MultiPodLogs,
}

/// Identifies one log producer within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    Container { pod: String, container: String },
    Remote { container_id: String },
}

impl SourceKey {
    pub fn container(pod: impl Into<String>, container: impl Into<String>) -> Self {
        Self::Container {
            pod: pod.into(),
            container: container.into(),
        }
    }

    pub fn remote(container_id: impl Into<String>) -> Self {
        Self::Remote {
            container_id: container_id.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container { pod, container } => write!(f, "{}/{}", pod, container),
            Self::Remote { container_id } => write!(f, "{}", container_id),
        }
    }
}

/// Messages from superseded sessions carry an older generation and are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamId {
    pub channel: StreamChannel,
    pub key: SourceKey,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("stream cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug)]
pub enum StreamMessage {
    Line {
        id: StreamId,
        line: String,
        queue: LineQueue,
    },
    Ended {
        id: StreamId,
        error: Option<StreamError>,
    },
}

impl StreamMessage {
    pub fn id(&self) -> &StreamId {
        match self {
            Self::Line { id, .. } | Self::Ended { id, .. } => id,
        }
    }
}

/// Where a producer reads lines from.
#[derive(Debug, Clone)]
pub enum LogSource {
    Pod {
        client: ClusterHandle,
        target: LogTarget,
        options: LogOptions,
    },
    Remote {
        client: RemoteHandle,
        container_id: String,
        options: LogOptions,
    },
}

impl LogSource {
    pub fn options(&self) -> &LogOptions {
        match self {
            Self::Pod { options, .. } | Self::Remote { options, .. } => options,
        }
    }

    /// Same source without historical tail; lines already shown are not fetched again.
    pub fn restarted(&self) -> Self {
        let mut source = self.clone();

        match &mut source {
            Self::Pod { options, .. } | Self::Remote { options, .. } => {
                options.tail_lines = Some(0);
            }
        }

        source
    }

    async fn stream(&self, out: LineSender) -> Result<()> {
        match self {
            Self::Pod {
                client,
                target,
                options,
            } => client.stream_logs(target, options, out).await,
            Self::Remote {
                client,
                container_id,
                options,
            } => client.stream_logs(container_id, options, out).await,
        }
    }
}

/// Starts a producer and waits for its first line.
#[derive(Debug)]
pub struct StreamTask {
    id: StreamId,
    source: LogSource,
    token: CancellationToken,
    delay: Option<Duration>,
}

impl StreamTask {
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn run(self) -> StreamMessage {
        let (sender, queue) = line_queue(self.id, self.token.clone());

        let source = self.source;

        tokio::spawn(produce(self.token, sender, self.delay, move |out| async move {
            source.stream(out).await
        }));

        queue.next().await
    }
}

#[derive(Debug)]
struct StreamSession {
    id: StreamId,
    token: CancellationToken,
    source: LogSource,
    active: bool,
    received: bool,
    /// Restarts in a row with no line in between.
    restarts: u32,
}

impl StreamSession {
    fn new(id: StreamId, token: CancellationToken, source: LogSource) -> Self {
        Self {
            id,
            token,
            source,
            active: true,
            received: false,
            restarts: 0,
        }
    }

    /// Marks a line as delivered when it belongs to this running session.
    fn record_line(&mut self, id: &StreamId) -> bool {
        let current = self.active && self.id == *id;

        if current {
            self.received = true;
        }

        current
    }

    /// Successor of an ended session. Reconnects at once unless the source
    /// already closed right after the previous restart.
    fn successor(self, id: StreamId, token: CancellationToken) -> (Self, Task) {
        let restarts = if self.received { 0 } else { self.restarts };

        let mut session = Self::new(id, token, self.source.restarted());
        session.restarts = restarts + 1;

        let task = session.task((restarts > 0).then_some(RESTART_BACKOFF));

        (session, task)
    }

    fn task(&self, delay: Option<Duration>) -> Task {
        Task::Stream(StreamTask {
            id: self.id.clone(),
            source: self.source.clone(),
            token: self.token.clone(),
            delay,
        })
    }

    fn stop(&mut self) {
        self.token.cancel();
        self.active = false;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::kube::{mock::MockTestClusterClient, ClusterHandle, LogOptions, LogTarget};

    use super::LogSource;

    pub fn pod_source(client: MockTestClusterClient, pod: &str, tail_lines: i64) -> LogSource {
        LogSource::Pod {
            client: ClusterHandle::new(client),
            target: LogTarget::new("default", pod, "app"),
            options: LogOptions {
                tail_lines: Some(tail_lines),
                timestamps: false,
            },
        }
    }
}
