use ratatui::crossterm::event::{KeyCode, KeyEvent};

use super::{Modal, ModalState, TextInput};

#[derive(Debug, Default)]
pub struct PassphraseModal {
    host: String,
    input: TextInput,
    error: Option<String>,
    visible: bool,
}

impl PassphraseModal {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Modal for PassphraseModal {
    /// Host name shown in the prompt.
    type Args = String;
    type Output = String;

    fn show(&mut self, host: String) {
        self.host = host;
        self.input = TextInput::masked();
        self.error = None;
        self.visible = true;
    }

    fn update(&mut self, key: KeyEvent) -> ModalState<String> {
        match key.code {
            KeyCode::Esc => ModalState::Cancelled,
            KeyCode::Enter if self.input.value().is_empty() => {
                self.error = Some("passphrase cannot be empty".to_string());
                ModalState::Pending
            }
            KeyCode::Enter => ModalState::Confirmed(self.input.value().to_string()),
            _ => {
                if self.input.handle_key(key) {
                    self.error = None;
                }
                ModalState::Pending
            }
        }
    }

    fn hide(&mut self) {
        self.visible = false;
        self.input.clear();
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn 空のパスフレーズはエラー() {
        let mut modal = PassphraseModal::default();
        modal.show("node-1".to_string());

        assert_eq!(
            modal.update(KeyEvent::from(KeyCode::Enter)),
            ModalState::Pending
        );
        assert_eq!(modal.error(), Some("passphrase cannot be empty"));
    }

    #[test]
    fn 入力は伏せ字で表示する() {
        let mut modal = PassphraseModal::default();
        modal.show("node-1".to_string());

        for c in "hunter2".chars() {
            modal.update(KeyEvent::from(KeyCode::Char(c)));
        }

        assert_eq!(modal.input().display(), "*******");
        assert_eq!(
            modal.update(KeyEvent::from(KeyCode::Enter)),
            ModalState::Confirmed("hunter2".to_string())
        );

        modal.hide();

        assert_eq!(modal.input().value(), "");
    }
}
