use std::fmt;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{StreamError, StreamId, StreamMessage};

/// Lines buffered per producer before it suspends.
pub const QUEUE_CAPACITY: usize = 100;

#[derive(Debug)]
enum QueueItem {
    Line(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("log queue closed")]
pub struct QueueClosed;

/// Producer half. Dropping every clone closes the queue.
#[derive(Debug, Clone)]
pub struct LineSender {
    tx: mpsc::Sender<QueueItem>,
}

/// Consumer half, owned by whichever task is waiting for the next line.
pub struct LineQueue {
    id: StreamId,
    rx: mpsc::Receiver<QueueItem>,
    token: CancellationToken,
}

impl fmt::Debug for LineQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineQueue")
            .field("id", &self.id)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

pub fn line_queue(id: StreamId, token: CancellationToken) -> (LineSender, LineQueue) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);

    (LineSender { tx }, LineQueue { id, rx, token })
}

impl LineSender {
    /// Waits while the queue is full.
    pub async fn send(&self, line: impl Into<String>) -> Result<(), QueueClosed> {
        self.tx
            .send(QueueItem::Line(line.into()))
            .await
            .map_err(|_| QueueClosed)
    }

    #[cfg(test)]
    pub fn try_send(&self, line: impl Into<String>) -> Result<(), QueueClosed> {
        self.tx
            .try_send(QueueItem::Line(line.into()))
            .map_err(|_| QueueClosed)
    }

    pub(super) async fn fail(&self, message: String) {
        let _ = self.tx.send(QueueItem::Failed(message)).await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

enum Received {
    Cancelled,
    Item(Option<QueueItem>),
}

impl LineQueue {
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Suspends until a line arrives, the queue closes or the session is cancelled.
    pub async fn next(mut self) -> StreamMessage {
        let received = tokio::select! {
            biased;

            _ = self.token.cancelled() => Received::Cancelled,
            item = self.rx.recv() => Received::Item(item),
        };

        match received {
            Received::Cancelled => StreamMessage::Ended {
                id: self.id,
                error: Some(StreamError::Cancelled),
            },
            Received::Item(Some(QueueItem::Line(line))) => StreamMessage::Line {
                id: self.id.clone(),
                line,
                queue: self,
            },
            Received::Item(Some(QueueItem::Failed(message))) => StreamMessage::Ended {
                id: self.id,
                error: Some(StreamError::Failed(message)),
            },
            Received::Item(None) => StreamMessage::Ended {
                id: self.id,
                error: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::stream::{SourceKey, StreamChannel};

    use super::*;

    fn id() -> StreamId {
        StreamId {
            channel: StreamChannel::PodLogs,
            key: SourceKey::container("web-7", "app"),
            generation: 1,
        }
    }

    async fn collect(mut queue: LineQueue) -> (Vec<String>, Option<StreamError>) {
        let mut lines = Vec::new();

        loop {
            match queue.next().await {
                StreamMessage::Line { line, queue: q, .. } => {
                    lines.push(line);
                    queue = q;
                }
                StreamMessage::Ended { error, .. } => return (lines, error),
            }
        }
    }

    #[tokio::test]
    async fn 送信順に行を受け取りクローズで終了する() {
        let (sender, queue) = line_queue(id(), CancellationToken::new());

        sender.send("a").await.unwrap();
        sender.send("b").await.unwrap();
        drop(sender);

        assert_eq!(
            collect(queue).await,
            (vec!["a".to_string(), "b".to_string()], None)
        );
    }

    #[tokio::test]
    async fn 失敗はエラー付きの終了になる() {
        let (sender, queue) = line_queue(id(), CancellationToken::new());

        sender.send("a").await.unwrap();
        sender.fail("connection reset".to_string()).await;
        drop(sender);

        assert_eq!(
            collect(queue).await,
            (
                vec!["a".to_string()],
                Some(StreamError::Failed("connection reset".to_string()))
            )
        );
    }

    #[tokio::test]
    async fn キャンセル済みなら残りの行より先に終了する() {
        let token = CancellationToken::new();
        let (sender, queue) = line_queue(id(), token.clone());

        sender.send("a").await.unwrap();
        token.cancel();

        assert_eq!(collect(queue).await, (vec![], Some(StreamError::Cancelled)));
    }

    #[tokio::test]
    async fn 容量を超えると送信側は待機する() {
        let (sender, queue) = line_queue(id(), CancellationToken::new());

        for i in 0..QUEUE_CAPACITY {
            sender.try_send(i.to_string()).unwrap();
        }

        assert_eq!(sender.try_send("overflow"), Err(QueueClosed));

        let StreamMessage::Line { line, queue, .. } = queue.next().await else {
            panic!("expected a line");
        };

        assert_eq!(line, "0");
        assert!(sender.try_send("overflow").is_ok());

        drop(queue);

        assert!(sender.is_closed());
        assert_eq!(sender.send("late").await, Err(QueueClosed));
    }
}
