use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::Result;
use crossbeam::{
    channel::{bounded, Receiver},
    select,
};
use futures::future::join_all;
use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::EnableMouseCapture,
        execute,
        terminal::{enable_raw_mode, EnterAlternateScreen},
    },
    Terminal, TerminalOptions, Viewport,
};
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    dispatcher::Dispatcher,
    logger,
    logging::Logger,
    message::Message,
    panic_set_hook,
    signal::restore_terminal,
    task::{Task, TaskExecutor},
    ui,
    workers::{Tick, UserInput, TICK_RATE},
};

/// How long pending tasks (remote disconnects) may take after quit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

type Backend = CrosstermBackend<io::Stdout>;

pub struct App;

impl App {
    pub fn run(config: Config, logger: &Logger) -> Result<()> {
        if let Some(path) = logger.path() {
            logger!(info, "log file: {}", path.display());
        }

        let (tx, rx) = bounded::<Message>(256);
        let (tx_shutdown, rx_shutdown) = bounded::<Result<()>>(1);
        let is_terminated = Arc::new(AtomicBool::new(false));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let executor = TaskExecutor::new(runtime.handle().clone(), tx.clone());

        let user_input = UserInput::new(tx.clone(), tx_shutdown, is_terminated.clone());
        let tick = Tick::new(tx, TICK_RATE, is_terminated.clone());

        let mut dispatcher = Dispatcher::new(&config);

        logger!(info, "app start");

        let mut terminal = setup_terminal()?;

        panic_set_hook!({
            let _ = restore_terminal();
        });

        thread::spawn(move || {
            user_input.set_panic_hook();
            user_input.start();
        });

        let tick = tick.start();

        let result = run_loop(
            &mut terminal,
            &mut dispatcher,
            &executor,
            &rx,
            &rx_shutdown,
        )
        .map(|pending| {
            logger!(info, "waiting for {} pending tasks", pending.len());

            let wait = tokio::time::timeout(SHUTDOWN_TIMEOUT, join_all(pending));

            if runtime.block_on(wait).is_err() {
                logger!(warn, "pending tasks did not finish in {:?}", SHUTDOWN_TIMEOUT);
            }
        });

        is_terminated.store(true, Ordering::Relaxed);

        // unblocks a tick worker waiting on a full channel
        drop(rx);

        if tick.join().is_err() {
            logger!(warn, "tick worker panicked");
        }

        restore_terminal()?;

        runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);

        logger!(info, "app end");

        result
    }
}

fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;

    let mut terminal = Terminal::with_options(
        CrosstermBackend::new(io::stdout()),
        TerminalOptions {
            viewport: Viewport::Fullscreen,
        },
    )?;

    terminal.clear()?;

    Ok(terminal)
}

/// Runs until a [`Task::Quit`] or the input worker stops.
///
/// Returns the handles of the tasks spawned on the way out.
fn run_loop(
    terminal: &mut Terminal<Backend>,
    dispatcher: &mut Dispatcher,
    executor: &TaskExecutor,
    rx: &Receiver<Message>,
    rx_shutdown: &Receiver<Result<()>>,
) -> Result<Vec<JoinHandle<()>>> {
    for task in dispatcher.init() {
        executor.spawn(task);
    }

    loop {
        terminal.draw(|f| ui::render(f, dispatcher.state()))?;

        let message = select! {
            recv(rx) -> message => message?,
            recv(rx_shutdown) -> result => {
                result??;

                let tasks = dispatcher.shutdown();

                return Ok(tasks.into_iter().map(|task| executor.spawn(task)).collect());
            }
        };

        let mut quit = false;
        let mut handles = Vec::new();

        for task in dispatcher.handle(message) {
            match task {
                Task::Quit => quit = true,
                task => handles.push(executor.spawn(task)),
            }
        }

        if quit {
            logger!(info, "quit requested");
            return Ok(handles);
        }
    }
}
