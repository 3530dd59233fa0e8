use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{sleep, spawn, JoinHandle},
    time::Duration,
};

use crossbeam::channel::Sender;

use crate::{logger, message::Message, panic_set_hook};

/// Frame tick driving the loading spinner.
pub const TICK_RATE: Duration = Duration::from_millis(200);

pub struct Tick {
    tx: Sender<Message>,
    rate: Duration,
    is_terminated: Arc<AtomicBool>,
}

impl Tick {
    pub fn new(tx: Sender<Message>, rate: Duration, is_terminated: Arc<AtomicBool>) -> Self {
        Self {
            tx,
            rate,
            is_terminated,
        }
    }

    pub fn start(self) -> JoinHandle<()> {
        spawn(move || {
            let is_terminated = self.is_terminated.clone();

            panic_set_hook!({
                is_terminated.store(true, Ordering::Relaxed);
            });

            logger!(info, "tick start");

            self.tick();

            logger!(info, "tick end");
        })
    }

    fn tick(&self) {
        while !self.is_terminated.load(Ordering::Relaxed) {
            sleep(self.rate);

            if self.tx.send(Message::Tick).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam::channel::bounded;

    use super::*;

    #[test]
    fn 終了フラグで停止する() {
        let (tx, rx) = bounded(16);
        let is_terminated = Arc::new(AtomicBool::new(false));

        let handle = Tick::new(tx, Duration::from_millis(5), is_terminated.clone()).start();

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)),
            Ok(Message::Tick)
        ));

        is_terminated.store(true, Ordering::Relaxed);

        handle.join().unwrap();
    }
}
