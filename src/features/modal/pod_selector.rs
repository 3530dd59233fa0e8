use std::collections::BTreeSet;

use ratatui::crossterm::event::{KeyCode, KeyEvent};

use super::{Modal, ModalState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodChoice {
    pub name: String,
    /// First container of the pod; pods without containers cannot be streamed.
    pub container: Option<String>,
}

#[derive(Debug, Default)]
pub struct PodSelector {
    pods: Vec<PodChoice>,
    cursor: usize,
    selected: BTreeSet<usize>,
    error: Option<String>,
    visible: bool,
}

impl PodSelector {
    pub fn pods(&self) -> &[PodChoice] {
        &self.pods
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Modal for PodSelector {
    type Args = Vec<PodChoice>;
    type Output = Vec<PodChoice>;

    fn show(&mut self, pods: Vec<PodChoice>) {
        self.pods = pods;
        self.cursor = 0;
        self.selected.clear();
        self.error = None;
        self.visible = true;
    }

    fn update(&mut self, key: KeyEvent) -> ModalState<Vec<PodChoice>> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ModalState::Cancelled,
            KeyCode::Char('j') | KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(self.pods.len().saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') if self.cursor < self.pods.len() => {
                if !self.selected.remove(&self.cursor) {
                    self.selected.insert(self.cursor);
                }
                self.error = None;
            }
            KeyCode::Char('a') => {
                if self.selected.len() == self.pods.len() {
                    self.selected.clear();
                } else {
                    self.selected = (0..self.pods.len()).collect();
                }
                self.error = None;
            }
            KeyCode::Enter => {
                if self.selected.is_empty() {
                    self.error = Some("select at least one pod".to_string());
                    return ModalState::Pending;
                }

                return ModalState::Confirmed(
                    self.selected
                        .iter()
                        .filter_map(|i| self.pods.get(*i).cloned())
                        .collect(),
                );
            }
            _ => {}
        }

        ModalState::Pending
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

    fn pods(names: &[&str]) -> Vec<PodChoice> {
        names
            .iter()
            .map(|name| PodChoice {
                name: name.to_string(),
                container: Some("app".to_string()),
            })
            .collect()
    }

    #[test]
    fn 未選択では確定できない() {
        let mut modal = PodSelector::default();
        modal.show(pods(&["web-7", "web-8"]));

        assert_eq!(
            modal.update(KeyEvent::from(KeyCode::Enter)),
            ModalState::Pending
        );
        assert_eq!(modal.error(), Some("select at least one pod"));
    }

    #[test]
    fn スペースで選択を切り替える() {
        let mut modal = PodSelector::default();
        modal.show(pods(&["web-7", "web-8", "web-9"]));

        modal.update(KeyEvent::from(KeyCode::Char(' ')));
        modal.update(KeyEvent::from(KeyCode::Down));
        modal.update(KeyEvent::from(KeyCode::Down));
        modal.update(KeyEvent::from(KeyCode::Char(' ')));

        assert_eq!(
            modal.update(KeyEvent::from(KeyCode::Enter)),
            ModalState::Confirmed(pods(&["web-7", "web-9"]))
        );
    }

    #[test]
    fn aで全選択と全解除を切り替える() {
        let mut modal = PodSelector::default();
        modal.show(pods(&["web-7", "web-8"]));

        modal.update(KeyEvent::from(KeyCode::Char('a')));
        assert_eq!(modal.selected_count(), 2);

        modal.update(KeyEvent::from(KeyCode::Char('a')));
        assert_eq!(modal.selected_count(), 0);
    }
}
