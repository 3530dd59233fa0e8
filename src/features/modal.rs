//! Overlay forms that capture input exclusively while visible.

mod confirm;
mod container_selector;
mod help;
mod input;
mod passphrase;
mod pod_selector;
mod scale;
mod search;

use ratatui::crossterm::event::KeyEvent;

pub use self::{
    confirm::{ConfirmAction, ConfirmButton, ConfirmModal, ConfirmRequest},
    container_selector::{ContainerArgs, ContainerSelector},
    help::{HelpModal, HELP_SECTIONS},
    input::TextInput,
    passphrase::PassphraseModal,
    pod_selector::{PodChoice, PodSelector},
    scale::{parse_replicas, ScaleArgs, ScaleModal, ScaleRequest, MAX_REPLICAS},
    search::SearchModal,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState<T> {
    Pending,
    Confirmed(T),
    Cancelled,
}

/// Uniform contract of every overlay.
///
/// `show` resets the form, so state never leaks from a previous visit.
pub trait Modal {
    type Args;
    type Output;

    /// Opens the modal with everything it displays.
    ///
    /// No initial task is returned. Callers fetch what a modal needs (the
    /// container list, the pods of a deployment) before showing it and pass
    /// it in `args`, so every modal is ready to take keys as soon as it is
    /// visible. Work a modal triggers is reported through [`ModalState`]
    /// from `update` and scheduled by the dispatcher.
    fn show(&mut self, args: Self::Args);

    fn update(&mut self, key: KeyEvent) -> ModalState<Self::Output>;

    fn hide(&mut self);

    fn is_visible(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum ModalKind {
    Confirm,
    Scale,
    Help,
    ContainerSelector,
    PodSelector,
    Passphrase,
    Search,
}

#[derive(Debug, Default)]
pub struct Modals {
    pub confirm: ConfirmModal,
    pub scale: ScaleModal,
    pub help: HelpModal,
    pub container: ContainerSelector,
    pub pods: PodSelector,
    pub passphrase: PassphraseModal,
    pub search: SearchModal,
}

impl Modals {
    fn is_visible(&self, kind: ModalKind) -> bool {
        match kind {
            ModalKind::Confirm => self.confirm.is_visible(),
            ModalKind::Scale => self.scale.is_visible(),
            ModalKind::Help => self.help.is_visible(),
            ModalKind::ContainerSelector => self.container.is_visible(),
            ModalKind::PodSelector => self.pods.is_visible(),
            ModalKind::Passphrase => self.passphrase.is_visible(),
            ModalKind::Search => self.search.is_visible(),
        }
    }

    /// First visible modal in priority order.
    pub fn visible(&self) -> Option<ModalKind> {
        use strum::IntoEnumIterator as _;

        ModalKind::iter().find(|kind| self.is_visible(*kind))
    }

    pub fn hide_all(&mut self) {
        self.confirm.hide();
        self.scale.hide();
        self.help.hide();
        self.container.hide();
        self.pods.hide();
        self.passphrase.hide();
        self.search.hide();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Show,
        Hide,
    }

    #[rstest]
    #[case(&[])]
    #[case(&[Op::Show])]
    #[case(&[Op::Hide])]
    #[case(&[Op::Show, Op::Hide])]
    #[case(&[Op::Hide, Op::Show])]
    #[case(&[Op::Show, Op::Show])]
    #[case(&[Op::Show, Op::Hide, Op::Hide])]
    #[case(&[Op::Hide, Op::Show, Op::Show, Op::Hide, Op::Show])]
    fn 最後の操作がshowのときだけ表示される(#[case] ops: &[Op]) {
        let mut modals = Modals::default();

        for op in ops {
            match op {
                Op::Show => {
                    modals.help.show(());
                    modals.search.show(String::new());
                    modals.passphrase.show("node-1".to_string());
                }
                Op::Hide => {
                    modals.help.hide();
                    modals.search.hide();
                    modals.passphrase.hide();
                }
            }
        }

        let expected = matches!(ops.last(), Some(Op::Show));

        assert_eq!(modals.help.is_visible(), expected);
        assert_eq!(modals.search.is_visible(), expected);
        assert_eq!(modals.passphrase.is_visible(), expected);
    }

    #[test]
    fn 優先順位の高いモーダルを返す() {
        let mut modals = Modals::default();

        assert_eq!(modals.visible(), None);

        modals.search.show(String::new());
        assert_eq!(modals.visible(), Some(ModalKind::Search));

        modals.help.show(());
        assert_eq!(modals.visible(), Some(ModalKind::Help));

        modals.confirm.show(ConfirmRequest::new(ConfirmAction::DeletePod, "web-7"));
        assert_eq!(modals.visible(), Some(ModalKind::Confirm));

        modals.hide_all();
        assert_eq!(modals.visible(), None);
    }
}
