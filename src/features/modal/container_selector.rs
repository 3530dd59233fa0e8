use ratatui::crossterm::event::{KeyCode, KeyEvent};

use super::{Modal, ModalState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerArgs {
    pub containers: Vec<String>,
    pub current: Option<String>,
}

#[derive(Debug, Default)]
pub struct ContainerSelector {
    containers: Vec<String>,
    current: Option<String>,
    selected: usize,
    visible: bool,
}

impl ContainerSelector {
    pub fn containers(&self) -> &[String] {
        &self.containers
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }
}

impl Modal for ContainerSelector {
    type Args = ContainerArgs;
    type Output = String;

    fn show(&mut self, args: ContainerArgs) {
        self.selected = args
            .current
            .as_ref()
            .and_then(|current| args.containers.iter().position(|c| c == current))
            .unwrap_or_default();
        self.containers = args.containers;
        self.current = args.current;
        self.visible = true;
    }

    fn update(&mut self, key: KeyEvent) -> ModalState<String> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => ModalState::Cancelled,
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected = (self.selected + 1).min(self.containers.len().saturating_sub(1));
                ModalState::Pending
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                ModalState::Pending
            }
            KeyCode::Enter => match self.containers.get(self.selected) {
                Some(container) => ModalState::Confirmed(container.clone()),
                None => ModalState::Cancelled,
            },
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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn 現在のコンテナから選択を始める() {
        let mut modal = ContainerSelector::default();
        modal.show(ContainerArgs {
            containers: vec!["app".to_string(), "sidecar".to_string(), "proxy".to_string()],
            current: Some("sidecar".to_string()),
        });

        assert_eq!(modal.selected(), 1);

        modal.update(KeyEvent::from(KeyCode::Down));
        modal.update(KeyEvent::from(KeyCode::Down));

        assert_eq!(
            modal.update(KeyEvent::from(KeyCode::Enter)),
            ModalState::Confirmed("proxy".to_string())
        );
    }
}
