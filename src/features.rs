pub mod detail;
pub mod event_viewer;
pub mod list;
pub mod log_viewer;
pub mod modal;
pub mod multi_log_viewer;
pub mod notification;
