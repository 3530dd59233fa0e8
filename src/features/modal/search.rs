use ratatui::crossterm::event::{KeyCode, KeyEvent};

use super::{Modal, ModalState, TextInput};

/// Log search prompt. The query applies while typing; `enter` keeps it and
/// `esc` discards it.
#[derive(Debug, Default)]
pub struct SearchModal {
    input: TextInput,
    match_status: Option<String>,
    visible: bool,
}

impl SearchModal {
    pub fn query(&self) -> &str {
        self.input.value()
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn set_match_status(&mut self, status: Option<String>) {
        self.match_status = status;
    }

    pub fn match_status(&self) -> Option<&str> {
        self.match_status.as_deref()
    }
}

impl Modal for SearchModal {
    /// Query of the previous search.
    type Args = String;
    type Output = String;

    fn show(&mut self, query: String) {
        self.input.set(query);
        self.match_status = None;
        self.visible = true;
    }

    fn update(&mut self, key: KeyEvent) -> ModalState<String> {
        match key.code {
            KeyCode::Esc => ModalState::Cancelled,
            KeyCode::Enter => ModalState::Confirmed(self.input.value().to_string()),
            _ => {
                self.input.handle_key(key);
                ModalState::Pending
            }
        }
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
