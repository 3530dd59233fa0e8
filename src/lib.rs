pub mod app;
pub mod cmd;
pub mod config;
pub mod dispatcher;
pub mod features;
pub mod kube;
pub mod logging;
pub mod message;
pub mod remote;
pub mod signal;
pub mod stream;
pub mod task;
pub mod ui;
pub mod workers;
