use ratatui::style::{Color, Modifier, Style, Stylize as _};

use crate::{features::notification::NotificationKind, remote::ContainerState};

pub const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub fn header() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn title() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn highlight() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn border() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn key_hint() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn error() -> Style {
    Style::default().fg(Color::White).bg(Color::Red)
}

pub fn warning() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn search_match() -> Style {
    Style::default().fg(Color::Black).bg(Color::Yellow)
}

pub fn current_match() -> Style {
    Style::default().fg(Color::Black).bg(Color::LightRed).bold()
}

pub fn log_header() -> Style {
    Style::default().fg(Color::Cyan).bold()
}

pub fn notification(kind: NotificationKind) -> Style {
    let color = match kind {
        NotificationKind::Info => Color::Blue,
        NotificationKind::Success => Color::Green,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Error => Color::Red,
    };

    Style::default().fg(Color::Black).bg(color)
}

/// Pod phase or container state coloring.
pub fn status(status: &str) -> Style {
    match status {
        "Running" | "Completed" | "Succeeded" | "Active" => Style::default().fg(Color::Green),
        "Pending" | "ContainerCreating" | "Terminating" => Style::default().fg(Color::Yellow),
        s if s.contains("Err") || s.contains("BackOff") || s == "Failed" || s == "Unknown" => {
            Style::default().fg(Color::Red)
        }
        _ => Style::default(),
    }
}

pub fn container_state(state: ContainerState) -> Style {
    match state {
        ContainerState::Running => Style::default().fg(Color::Green),
        ContainerState::Exited => muted(),
        ContainerState::Created => Style::default().fg(Color::Yellow),
        ContainerState::Unknown => Style::default().fg(Color::Red),
    }
}
