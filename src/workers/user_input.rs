use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use crossbeam::channel::Sender;
use ratatui::crossterm::event::{poll, read, Event as CEvent, KeyEvent, KeyEventKind};

use crate::{
    logger,
    message::{Message, UserEvent},
    panic_set_hook,
};

const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Reads terminal events on its own thread and forwards them to the loop.
pub struct UserInput {
    tx: Sender<Message>,
    tx_shutdown: Sender<Result<()>>,
    is_terminated: Arc<AtomicBool>,
}

impl UserInput {
    pub fn new(
        tx: Sender<Message>,
        tx_shutdown: Sender<Result<()>>,
        is_terminated: Arc<AtomicBool>,
    ) -> Self {
        Self {
            tx,
            tx_shutdown,
            is_terminated,
        }
    }

    pub fn start(&self) {
        logger!(info, "user_input start");

        let ret = self.poll();

        if let Err(e) = &ret {
            logger!(error, "{}", e);
        }

        logger!(info, "user_input end");

        if self.tx_shutdown.send(ret).is_err() {
            logger!(warn, "shutdown channel closed");
        }
    }

    pub fn set_panic_hook(&self) {
        let tx_shutdown = self.tx_shutdown.clone();

        panic_set_hook!({
            let _ = tx_shutdown.send(Err(anyhow::anyhow!("panic occurred in UserInput worker")));
        });
    }

    fn poll(&self) -> Result<()> {
        while !self.is_terminated.load(Ordering::Relaxed) {
            if !poll(POLL_TIMEOUT)? {
                continue;
            }

            let Some(message) = to_message(read()?) else {
                continue;
            };

            self.tx.send(message)?;
        }

        Ok(())
    }
}

fn to_message(ev: CEvent) -> Option<Message> {
    match ev {
        CEvent::Key(
            ev @ KeyEvent {
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            },
        ) => Some(UserEvent::Key(ev).into()),
        CEvent::Key(_) => None,
        CEvent::Mouse(ev) => Some(UserEvent::Mouse(ev).into()),
        // redraw at the new size
        CEvent::Resize(..) => Some(Message::Tick),
        CEvent::FocusGained => Some(UserEvent::FocusGained.into()),
        CEvent::FocusLost => Some(UserEvent::FocusLost.into()),
        CEvent::Paste(_) => None,
    }
}
