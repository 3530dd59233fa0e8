use crossbeam::channel::Sender;
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{logger, message::Message};

use super::Task;

/// Runs tasks on a tokio runtime and posts each result back to the loop.
#[derive(Clone)]
pub struct TaskExecutor {
    handle: Handle,
    tx: Sender<Message>,
}

impl TaskExecutor {
    pub fn new(handle: Handle, tx: Sender<Message>) -> Self {
        Self { handle, tx }
    }

    pub fn spawn(&self, task: Task) -> JoinHandle<()> {
        let tx = self.tx.clone();

        let name = task.name();

        self.handle.spawn(async move {
            let Some(message) = task.run().await else {
                return;
            };

            if tx.send(message).is_err() {
                logger!(debug, "loop closed before {} task finished", name);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossbeam::channel::bounded;
    use pretty_assertions::assert_eq;
    use tokio::runtime::Runtime;

    use crate::dispatcher::RefreshTarget;

    use super::*;

    #[test]
    fn タスクの結果をチャネルに送る() {
        let runtime = Runtime::new().unwrap();
        let (tx, rx) = bounded(4);

        let executor = TaskExecutor::new(runtime.handle().clone(), tx);

        executor.spawn(Task::ScheduleRefresh {
            after: Duration::from_millis(10),
            target: RefreshTarget::Events,
        });

        let message = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert!(matches!(message, Message::Refresh(RefreshTarget::Events)));
    }

    #[test]
    fn 終了タスクは何も送らない() {
        let runtime = Runtime::new().unwrap();
        let (tx, rx) = bounded(4);

        let executor = TaskExecutor::new(runtime.handle().clone(), tx);

        runtime.block_on(executor.spawn(Task::Quit)).unwrap();

        assert_eq!(rx.try_recv().ok().map(|_| ()), None);
    }
}
