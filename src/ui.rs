//! Rendering of the application state.
//!
//! Drawing is a pure function of [`AppState`]; nothing here mutates state or
//! emits tasks.

mod popup;
mod theme;
mod views;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr as _;

use crate::dispatcher::{AppState, ViewState};

use self::popup::render_modal;

const TOAST_MIN_WIDTH: u16 = 20;
const TOAST_MAX_WIDTH: u16 = 60;

pub fn render(f: &mut Frame, state: &AppState) {
    let banner = state.connection_error.as_ref().map(|_| 3).unwrap_or(0);
    let inline_error = state.error.as_ref().map(|_| 3).unwrap_or(0);

    let [header, banner_area, error_area, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(banner),
        Constraint::Length(inline_error),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_header(f, header, state);

    if let Some(error) = &state.connection_error {
        render_error(f, banner_area, "Connection failed", error);
    }

    if let Some(error) = &state.error {
        render_error(f, error_area, "Error", error);
    }

    views::render_view(f, body, state);

    render_footer(f, footer, state);

    render_toasts(f, state);

    if let Some(kind) = state.modals.visible() {
        render_modal(f, kind, &state.modals);
    }
}

fn render_header(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![Span::styled(" kubenav ", theme::title())];

    if let Some(session) = &state.cluster {
        spans.push(Span::raw(format!(
            "| {} | ns: {} ",
            session.info.name,
            session.namespace()
        )));
    }

    if let Some(remote) = &state.remote {
        spans.push(Span::raw(format!("| host: {} ", remote.host.name)));
    }

    spans.push(Span::styled(
        format!("| {} ", state.view.title()),
        theme::key_hint(),
    ));

    if state.loading {
        spans.push(Span::raw(
            theme::SPINNER[state.spinner % theme::SPINNER.len()],
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).style(theme::header()), area);
}

fn render_error(f: &mut Frame, area: Rect, title: &str, message: &str) {
    f.render_widget(
        Paragraph::new(message.to_string())
            .wrap(Wrap { trim: true })
            .style(theme::error())
            .block(Block::bordered().title(format!(" {} ", title))),
        area,
    );
}

/// Key hints of the current view.
fn hints(state: &AppState) -> &'static str {
    match state.view {
        ViewState::ConfigSelect => "enter: connect  /: filter  9: hosts  ?: help  q: quit",
        ViewState::Connecting | ViewState::SshConnecting => "ctrl+c: quit",
        ViewState::Main => "r: retry  esc: back  ?: help  q: quit",
        ViewState::Namespaces => "enter: switch  /: filter  1-5: views  ?: help",
        ViewState::Pods => {
            "enter: details  l: logs  L: multi logs  m: metrics  d: delete  R: restart  /: filter"
        }
        ViewState::PodDetails => "l: logs  d: delete  R: restart  r: reload  esc: back",
        ViewState::Logs => "f: follow  t: timestamps  c: container  /: search  n/N: match  esc: back",
        ViewState::MultiPodLogs => "f: follow  j/k: scroll  G: bottom  esc: back",
        ViewState::Deployments => "enter: details  s: scale  d: delete  R: restart  /: filter",
        ViewState::DeploymentDetails => "s: scale  d: delete  R: restart  r: reload  esc: back",
        ViewState::Services => "enter: details  /: filter  esc: back",
        ViewState::ServiceDetails => "r: reload  esc: back",
        ViewState::Events => "f: follow  w: warnings  k: kind  r: reload  esc: back",
        ViewState::SshHosts => "enter: connect  /: filter  esc: back",
        ViewState::RemoteContainers => "enter: logs  i: node info  /: filter  esc: disconnect",
        ViewState::RemoteLogs => "f: follow  t: timestamps  /: search  n/N: match  esc: back",
        ViewState::NodeInfo => "r: reload  esc: back",
    }
}

fn render_footer(f: &mut Frame, area: Rect, state: &AppState) {
    f.render_widget(
        Paragraph::new(Line::styled(format!(" {}", hints(state)), theme::muted())),
        area,
    );
}

/// Newest toasts first, stacked from the top right corner.
fn render_toasts(f: &mut Frame, state: &AppState) {
    let screen = f.area();

    for (index, notification) in state.notifier.notifications().iter().rev().enumerate() {
        let y = screen.y + 1 + index as u16 * 3;
        let width = (notification.message.width() as u16 + 4)
            .clamp(TOAST_MIN_WIDTH, TOAST_MAX_WIDTH)
            .min(screen.width);

        if y + 3 > screen.bottom() {
            break;
        }

        let area = Rect::new(screen.right() - width, y, width, 3);

        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(notification.message.as_str())
                .style(theme::notification(notification.kind))
                .block(Block::bordered().title(format!(" {} ", notification.kind))),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, Terminal};

    use crate::{
        config::Config,
        features::{
            modal::{ConfirmAction, ConfirmRequest, Modal as _},
            notification::NotificationKind,
        },
        kube::{PodSummary, PodUsage},
    };

    use super::*;

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        terminal.draw(|f| render(f, state)).unwrap();

        let buffer = terminal.backend().buffer();

        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn pod(name: &str, status: &str) -> PodSummary {
        PodSummary {
            name: name.to_string(),
            namespace: "default".to_string(),
            ready: "1/1".to_string(),
            status: status.to_string(),
            age: "3m".to_string(),
            containers: vec!["app".to_string()],
            ..Default::default()
        }
    }

    fn pods_state() -> AppState {
        let mut state = AppState::new(&Config::default());

        state.view = ViewState::Pods;
        state
            .pods
            .set_items(vec![pod("web-7", "Running"), pod("db-0", "Pending")]);

        state
    }

    #[test]
    fn ポッド一覧を描画する() {
        let screen = draw(&pods_state());

        assert!(screen.contains("Pods [2/2]"));
        assert!(screen.contains("web-7"));
        assert!(screen.contains("Pending"));
    }

    #[test]
    fn メトリクス有効時は使用量の列を出す() {
        let mut state = pods_state();
        state.metrics_enabled = true;
        state.pod_metrics = Some(
            [(
                "web-7".to_string(),
                PodUsage {
                    cpu_millis: 12,
                    memory_bytes: 48 * 1024 * 1024,
                },
            )]
            .into(),
        );

        let screen = draw(&state);
        let web = screen.lines().find(|line| line.contains("web-7")).unwrap_or_default();
        let db = screen.lines().find(|line| line.contains("db-0")).unwrap_or_default();

        assert!(screen.contains("Pods [metrics] [2/2]"));
        assert!(screen.contains("MEMORY"));
        assert!(web.contains("12m") && web.contains("48Mi"));
        assert!(db.contains(" - "));
    }

    #[test]
    fn 取得エラーは本文の上に表示する() {
        let mut state = pods_state();
        state.error = Some("pods is forbidden".to_string());

        let screen = draw(&state);

        assert!(screen.contains("pods is forbidden"));
        assert!(screen.contains("web-7"));
    }

    #[test]
    fn 確認ダイアログを重ねて描画する() {
        let mut state = pods_state();
        state
            .modals
            .confirm
            .show(ConfirmRequest::new(ConfirmAction::DeletePod, "web-7"));

        let screen = draw(&state);

        assert!(screen.contains("web-7?"));
        assert!(screen.contains("[ Yes ]"));
    }

    #[test]
    fn トーストを右上に表示する() {
        let mut state = pods_state();
        let _ = state
            .notifier
            .show(NotificationKind::Success, "Pod 'web-7' deleted");

        let screen = draw(&state);
        let line = screen.lines().nth(2).unwrap_or_default();

        assert!(line.ends_with("│"));
        assert!(line.contains("Pod 'web-7' deleted"));
    }

    #[test]
    fn ビューごとに操作ヒントが変わる() {
        let mut state = pods_state();
        assert!(hints(&state).contains("L: multi logs"));

        state.view = ViewState::Events;
        assert_eq!(
            hints(&state),
            "f: follow  w: warnings  k: kind  r: reload  esc: back"
        );
    }
}
