use ratatui::crossterm::event::{KeyCode, KeyEvent};

use super::{Modal, ModalState};

pub const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "General",
        &[
            ("q / ctrl+c", "quit"),
            ("?", "help"),
            ("esc", "back"),
            ("enter", "select"),
            ("r", "refresh / retry"),
            ("/", "filter list / search logs"),
            ("1-5", "namespaces, pods, deployments, services, events"),
            ("9", "remote hosts"),
        ],
    ),
    (
        "Navigation",
        &[
            ("j / k / ↑ / ↓", "move"),
            ("g / G", "first / last"),
            ("PgUp / PgDn", "page"),
        ],
    ),
    (
        "Pods",
        &[
            ("l", "logs"),
            ("L", "logs of several pods"),
            ("m", "toggle CPU/memory usage"),
            ("d", "delete"),
            ("R", "restart"),
        ],
    ),
    (
        "Deployments",
        &[("s", "scale"), ("d", "delete"), ("R", "restart")],
    ),
    (
        "Logs",
        &[
            ("f", "follow"),
            ("t", "timestamps"),
            ("c", "container"),
            ("n / N", "next / previous match"),
        ],
    ),
    (
        "Events",
        &[("f", "follow"), ("w", "warnings only"), ("k", "kind filter")],
    ),
    ("Remote", &[("enter", "connect / logs"), ("i", "node info")]),
];

#[derive(Debug, Default)]
pub struct HelpModal {
    scroll: u16,
    visible: bool,
}

impl HelpModal {
    pub fn scroll(&self) -> u16 {
        self.scroll
    }
}

impl Modal for HelpModal {
    type Args = ();
    type Output = ();

    fn show(&mut self, _: ()) {
        self.scroll = 0;
        self.visible = true;
    }

    fn update(&mut self, key: KeyEvent) -> ModalState<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
                ModalState::Cancelled
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                ModalState::Pending
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                ModalState::Pending
            }
            _ => ModalState::Pending,
        }
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
