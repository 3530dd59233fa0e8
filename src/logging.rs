use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{anyhow, Context as _, Result};
use chrono::{Local, NaiveDate};
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::json::JsonEncoder,
};

use crate::config::LoggingConfig;

pub static LOGGER_ENABLED: AtomicBool = AtomicBool::new(false);

#[macro_export]
macro_rules! logger {
    ($level:ident, $($arg:tt)+) => {
        if $crate::logging::LOGGER_ENABLED.load(::std::sync::atomic::Ordering::Relaxed) {
            ::log::$level!($($arg)+);
        }
    };
}

/// Side log channel.
///
/// Created once by the entry point and handed to the application loop.
/// Records are only written between [`Logger::init`] and [`Logger::close`].
#[derive(Debug)]
pub struct Logger {
    path: Option<PathBuf>,
}

impl Logger {
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());
        let level_filter = LevelFilter::from_str(&level)?;

        let directory = log_directory(config)?;

        fs::create_dir_all(&directory).with_context(|| {
            format!("failed to create log directory {}", directory.display())
        })?;

        let path = directory.join(log_file_name(Local::now().date_naive()));

        let logfile = FileAppender::builder()
            .append(true)
            .encoder(Box::new(JsonEncoder::new()))
            .build(&path)?;

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(level_filter))?;

        log4rs::init_config(config)?;

        LOGGER_ENABLED.store(true, Ordering::Relaxed);

        Ok(Self { path: Some(path) })
    }

    /// A port that discards every record.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn close(self) {
        if self.path.is_none() {
            return;
        }

        logger!(info, "logger closed");

        log::logger().flush();

        LOGGER_ENABLED.store(false, Ordering::Relaxed);
    }
}

fn log_directory(config: &LoggingConfig) -> Result<PathBuf> {
    if let Some(directory) = &config.directory {
        return Ok(directory.clone());
    }

    dirs::data_local_dir()
        .map(|dir| dir.join("kubenav").join("logs"))
        .ok_or_else(|| anyhow!("failed to resolve log directory"))
}

fn log_file_name(date: NaiveDate) -> String {
    format!("kubenav-{}.log", date.format("%Y-%m-%d"))
}
