use ratatui::{
    layout::{Constraint, Flex, Layout, Margin, Rect},
    style::Stylize as _,
    text::{Line, Span},
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::features::modal::{
    ConfirmButton, ModalKind, Modals, TextInput, HELP_SECTIONS,
};

use super::theme;

/// Popup size relative to the terminal.
///
/// ┌──────────────────────────────────────┐
/// │ margin           ▲                   │
/// │        ┌─────────┼─────────┐         │
/// │        │ content │ height  │         │
/// │◄──────►│◄────────┼────────►│◄───────►│
/// │        │  width  ▼         │         │
/// │        └───────────────────┘         │
/// └──────────────────────────────────────┘
#[derive(Debug, Clone, Copy)]
pub struct PopupSize {
    /// content width percentage (0.0 ~ 100.0)
    pub width: f32,
    /// content height percentage (0.0 ~ 100.0)
    pub height: f32,
}

impl Default for PopupSize {
    fn default() -> Self {
        Self {
            width: 85.0,
            height: 85.0,
        }
    }
}

impl PopupSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn chunk(&self, parent: Rect) -> Rect {
        let horizontal = (parent.width as f32 * ((100.0 - self.width) / 2.0 / 100.0)).round() as u16;
        let vertical = (parent.height as f32 * ((100.0 - self.height) / 2.0 / 100.0)).round() as u16;

        parent.inner(Margin {
            vertical,
            horizontal,
        })
    }
}

/// Centered box of fixed width and height, clamped to `parent`.
pub fn fixed(parent: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width.min(parent.width))])
        .flex(Flex::Center)
        .areas(parent);

    let [area] = Layout::vertical([Constraint::Length(height.min(parent.height))])
        .flex(Flex::Center)
        .areas(area);

    area
}

fn block(title: &str) -> Block<'_> {
    Block::bordered()
        .title(format!(" {} ", title))
        .title_style(theme::title())
        .border_style(theme::border())
}

fn input_line<'a>(label: &'a str, input: &TextInput) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, theme::muted()),
        Span::raw(input.display()),
        Span::styled(" ", theme::highlight()),
    ])
}

fn error_line(error: Option<&str>) -> Line<'_> {
    match error {
        Some(error) => Line::styled(error, theme::warning()),
        None => Line::default(),
    }
}

pub fn render_modal(f: &mut Frame, kind: ModalKind, modals: &Modals) {
    match kind {
        ModalKind::Confirm => render_confirm(f, modals),
        ModalKind::Scale => render_scale(f, modals),
        ModalKind::Help => render_help(f, modals),
        ModalKind::ContainerSelector => render_container_selector(f, modals),
        ModalKind::PodSelector => render_pod_selector(f, modals),
        ModalKind::Passphrase => render_passphrase(f, modals),
        ModalKind::Search => render_search(f, modals),
    }
}

fn render_confirm(f: &mut Frame, modals: &Modals) {
    let Some(request) = modals.confirm.request() else {
        return;
    };

    let area = fixed(f.area(), 50, 7);

    let button = |label: &'static str, focused: bool| {
        if focused {
            Span::styled(format!("[ {} ]", label), theme::highlight())
        } else {
            Span::raw(format!("[ {} ]", label))
        }
    };

    let focus = modals.confirm.focus();

    let text = vec![
        Line::from(request.message()),
        Line::default(),
        Line::from(vec![
            button("Yes", focus == ConfirmButton::Yes),
            Span::raw("   "),
            button("No", focus == ConfirmButton::No),
        ])
        .centered(),
        Line::styled("y: yes  n/esc: no", theme::muted()).centered(),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(block(request.action.title())),
        area,
    );
}

fn render_scale(f: &mut Frame, modals: &Modals) {
    let scale = &modals.scale;
    let area = fixed(f.area(), 50, 6);

    let text = vec![
        Line::from(format!("{} (current: {})", scale.deployment(), scale.current())),
        input_line("replicas: ", scale.input()),
        error_line(scale.error()),
    ];

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(text).block(block("Scale")), area);
}

fn render_help(f: &mut Frame, modals: &Modals) {
    let area = PopupSize::new(60.0, 80.0).chunk(f.area());

    let mut lines = Vec::new();

    for (section, keys) in HELP_SECTIONS {
        if !lines.is_empty() {
            lines.push(Line::default());
        }

        lines.push(Line::styled(*section, theme::title()));

        for (key, description) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<16}", key), theme::key_hint()),
                Span::raw(*description),
            ]));
        }
    }

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .scroll((modals.help.scroll(), 0))
            .block(block("Help")),
        area,
    );
}

fn render_container_selector(f: &mut Frame, modals: &Modals) {
    let selector = &modals.container;
    let height = selector.containers().len() as u16 + 2;
    let area = fixed(f.area(), 40, height);

    let items: Vec<ListItem> = selector
        .containers()
        .iter()
        .map(|name| {
            if Some(name.as_str()) == selector.current() {
                ListItem::new(format!("{} (current)", name))
            } else {
                ListItem::new(name.as_str())
            }
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(selector.selected()));

    f.render_widget(Clear, area);
    f.render_stateful_widget(
        List::new(items)
            .highlight_style(theme::highlight())
            .block(block("Container")),
        area,
        &mut state,
    );
}

fn render_pod_selector(f: &mut Frame, modals: &Modals) {
    let selector = &modals.pods;
    let area = PopupSize::new(60.0, 70.0).chunk(f.area());

    let [list_area, footer] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(block("").inner(area));

    let items: Vec<ListItem> = selector
        .pods()
        .iter()
        .enumerate()
        .map(|(index, pod)| {
            let mark = if selector.is_selected(index) { "[x]" } else { "[ ]" };

            let line = match &pod.container {
                Some(_) => Line::from(format!("{} {}", mark, pod.name)),
                None => Line::from(format!("{} {} (no containers)", mark, pod.name)).dim(),
            };

            ListItem::new(line)
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(selector.cursor()));

    let footer_line = match selector.error() {
        Some(error) => Line::styled(error, theme::warning()),
        None => Line::styled(
            format!(
                "{} selected  space: toggle  a: all  enter: start",
                selector.selected_count()
            ),
            theme::muted(),
        ),
    };

    f.render_widget(Clear, area);
    f.render_widget(block("Select Pods"), area);
    f.render_stateful_widget(
        List::new(items).highlight_style(theme::highlight()),
        list_area,
        &mut state,
    );
    f.render_widget(Paragraph::new(footer_line), footer);
}

fn render_passphrase(f: &mut Frame, modals: &Modals) {
    let passphrase = &modals.passphrase;
    let area = fixed(f.area(), 60, 6);

    let text = vec![
        Line::from(format!("Passphrase for the identity of {}", passphrase.host())),
        input_line("> ", passphrase.input()),
        error_line(passphrase.error()),
    ];

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(text).block(block("Passphrase")), area);
}

fn render_search(f: &mut Frame, modals: &Modals) {
    let search = &modals.search;
    let parent = f.area();

    let area = Rect {
        x: parent.x,
        y: parent.bottom().saturating_sub(3),
        width: parent.width,
        height: 3.min(parent.height),
    };

    let mut line = input_line("/", search.input());

    if let Some(status) = search.match_status() {
        line.push_span(Span::styled(format!("  [{}]", status), theme::muted()));
    }

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(line).block(block("Search")), area);
}
