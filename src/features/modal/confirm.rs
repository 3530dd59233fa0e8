use ratatui::crossterm::event::{KeyCode, KeyEvent};

use crate::kube::Mutation;

use super::{Modal, ModalState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    DeletePod,
    RestartPod,
    DeleteDeployment,
    RestartDeployment,
}

impl ConfirmAction {
    pub fn title(&self) -> &'static str {
        match self {
            Self::DeletePod => "Delete Pod",
            Self::RestartPod => "Restart Pod",
            Self::DeleteDeployment => "Delete Deployment",
            Self::RestartDeployment => "Restart Deployment",
        }
    }

    pub fn mutation(&self, target: &str) -> Mutation {
        let target = target.to_string();

        match self {
            Self::DeletePod => Mutation::DeletePod(target),
            Self::RestartPod => Mutation::RestartPod(target),
            Self::DeleteDeployment => Mutation::DeleteDeployment(target),
            Self::RestartDeployment => Mutation::RestartDeployment(target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub action: ConfirmAction,
    pub target: String,
}

impl ConfirmRequest {
    pub fn new(action: ConfirmAction, target: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
        }
    }

    pub fn message(&self) -> String {
        format!("{} {}?", self.action.title(), self.target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmButton {
    Yes,
    #[default]
    No,
}

#[derive(Debug, Default)]
pub struct ConfirmModal {
    request: Option<ConfirmRequest>,
    focus: ConfirmButton,
    visible: bool,
}

impl ConfirmModal {
    pub fn request(&self) -> Option<&ConfirmRequest> {
        self.request.as_ref()
    }

    pub fn focus(&self) -> ConfirmButton {
        self.focus
    }

    fn confirmed(&self) -> ModalState<ConfirmRequest> {
        match &self.request {
            Some(request) => ModalState::Confirmed(request.clone()),
            None => ModalState::Cancelled,
        }
    }
}

impl Modal for ConfirmModal {
    type Args = ConfirmRequest;
    type Output = ConfirmRequest;

    fn show(&mut self, request: ConfirmRequest) {
        self.request = Some(request);
        self.focus = ConfirmButton::No;
        self.visible = true;
    }

    /// `y`/`n`/`esc` decide immediately regardless of the focused button.
    fn update(&mut self, key: KeyEvent) -> ModalState<ConfirmRequest> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.confirmed(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => ModalState::Cancelled,
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Char('h')
            | KeyCode::Char('l') => {
                self.focus = match self.focus {
                    ConfirmButton::Yes => ConfirmButton::No,
                    ConfirmButton::No => ConfirmButton::Yes,
                };
                ModalState::Pending
            }
            KeyCode::Enter => match self.focus {
                ConfirmButton::Yes => self.confirmed(),
                ConfirmButton::No => ModalState::Cancelled,
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
