use std::{future::Future, time::Duration};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::logger;

use super::LineSender;

/// Drives one log source into its queue.
///
/// Returns once the source finishes, fails or the token is cancelled. A
/// failure is forwarded to the consumer unless the session was cancelled.
/// All senders are dropped on return, which closes the queue.
pub async fn produce<F, Fut>(
    token: CancellationToken,
    sender: LineSender,
    delay: Option<Duration>,
    stream: F,
) where
    F: FnOnce(LineSender) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let out = sender.clone();

    let run = async move {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        stream(out).await
    };

    tokio::select! {
        biased;

        _ = token.cancelled() => {
            logger!(debug, "log producer cancelled");
        }
        result = run => {
            if let Err(err) = result {
                if !token.is_cancelled() {
                    logger!(warn, "log producer failed: {:#}", err);

                    sender.fail(format!("{:#}", err)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::Duration,
    };

    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    use crate::stream::{
        line_queue, SourceKey, StreamChannel, StreamError, StreamId, StreamMessage,
    };

    use super::*;

    fn id() -> StreamId {
        StreamId {
            channel: StreamChannel::PodLogs,
            key: SourceKey::container("web-7", "app"),
            generation: 1,
        }
    }

    #[tokio::test]
    async fn 正常終了でキューが閉じる() {
        let token = CancellationToken::new();
        let (sender, queue) = line_queue(id(), token.clone());

        let producer = tokio::spawn(produce(token, sender, None, |out| async move {
            out.send("line").await?;
            Ok(())
        }));

        let StreamMessage::Line { line, queue, .. } = queue.next().await else {
            panic!("expected a line");
        };
        assert_eq!(line, "line");

        let StreamMessage::Ended { error, .. } = queue.next().await else {
            panic!("expected end of stream");
        };
        assert_eq!(error, None);

        producer.await.unwrap();
    }

    #[tokio::test]
    async fn 失敗はコンシューマに伝わる() {
        let token = CancellationToken::new();
        let (sender, queue) = line_queue(id(), token.clone());

        tokio::spawn(produce(token, sender, None, |_| async move {
            Err(anyhow!("container not found"))
        }));

        let StreamMessage::Ended { error, .. } = queue.next().await else {
            panic!("expected end of stream");
        };
        assert_eq!(
            error,
            Some(StreamError::Failed("container not found".to_string()))
        );
    }

    #[tokio::test]
    async fn キャンセルで待機中のソースを止める() {
        let token = CancellationToken::new();
        let (sender, queue) = line_queue(id(), token.clone());

        let producer = tokio::spawn(produce(token.clone(), sender, None, |out| async move {
            out.send("first").await?;
            futures::future::pending::<()>().await;
            Ok(())
        }));

        let StreamMessage::Line { queue, .. } = queue.next().await else {
            panic!("expected a line");
        };

        token.cancel();

        let StreamMessage::Ended { error, .. } = queue.next().await else {
            panic!("expected end of stream");
        };
        assert_eq!(error, Some(StreamError::Cancelled));

        tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("producer should stop after cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn 遅延中のキャンセルではソースを開かない() {
        let token = CancellationToken::new();
        let (sender, _queue) = line_queue(id(), token.clone());

        let opened = Arc::new(AtomicBool::new(false));
        let flag = opened.clone();

        let producer = tokio::spawn(produce(
            token.clone(),
            sender,
            Some(Duration::from_secs(60)),
            move |_| async move {
                flag.store(true, Ordering::Relaxed);
                Ok(())
            },
        ));

        token.cancel();

        producer.await.unwrap();

        assert!(!opened.load(Ordering::Relaxed));
    }
}
