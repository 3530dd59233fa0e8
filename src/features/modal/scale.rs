use ratatui::crossterm::event::{KeyCode, KeyEvent};

use super::{Modal, ModalState, TextInput};

pub const MAX_REPLICAS: i32 = 1000;

pub fn parse_replicas(value: &str) -> Result<i32, String> {
    let replicas: i64 = value
        .trim()
        .parse()
        .map_err(|_| "invalid number".to_string())?;

    if replicas < 0 {
        return Err("must be >= 0".to_string());
    }

    if replicas > MAX_REPLICAS as i64 {
        return Err(format!("max is {}", MAX_REPLICAS));
    }

    Ok(replicas as i32)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleArgs {
    pub deployment: String,
    pub current: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleRequest {
    pub deployment: String,
    pub replicas: i32,
}

#[derive(Debug, Default)]
pub struct ScaleModal {
    deployment: String,
    current: i32,
    input: TextInput,
    error: Option<String>,
    visible: bool,
}

impl ScaleModal {
    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Modal for ScaleModal {
    type Args = ScaleArgs;
    type Output = ScaleRequest;

    fn show(&mut self, args: ScaleArgs) {
        self.input.set(args.current.to_string());
        self.deployment = args.deployment;
        self.current = args.current;
        self.error = None;
        self.visible = true;
    }

    fn update(&mut self, key: KeyEvent) -> ModalState<ScaleRequest> {
        match key.code {
            KeyCode::Esc => ModalState::Cancelled,
            KeyCode::Enter => match parse_replicas(self.input.value()) {
                Ok(replicas) => ModalState::Confirmed(ScaleRequest {
                    deployment: self.deployment.clone(),
                    replicas,
                }),
                Err(err) => {
                    self.error = Some(err);
                    ModalState::Pending
                }
            },
            KeyCode::Char(c) if !c.is_ascii_digit() && c != '-' => ModalState::Pending,
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
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0", Ok(0))]
    #[case(" 3 ", Ok(3))]
    #[case("1000", Ok(1000))]
    #[case("1001", Err("max is 1000".to_string()))]
    #[case("-1", Err("must be >= 0".to_string()))]
    #[case("three", Err("invalid number".to_string()))]
    #[case("", Err("invalid number".to_string()))]
    fn レプリカ数を検証する(#[case] value: &str, #[case] expected: Result<i32, String>) {
        assert_eq!(parse_replicas(value), expected);
    }

    #[test]
    fn 現在のレプリカ数を初期値にする() {
        let mut modal = ScaleModal::default();
        modal.show(ScaleArgs {
            deployment: "web".to_string(),
            current: 2,
        });

        assert_eq!(modal.input().value(), "2");

        modal.update(KeyEvent::from(KeyCode::Backspace));
        modal.update(KeyEvent::from(KeyCode::Char('5')));
        modal.update(KeyEvent::from(KeyCode::Char('x')));

        assert_eq!(
            modal.update(KeyEvent::from(KeyCode::Enter)),
            ModalState::Confirmed(ScaleRequest {
                deployment: "web".to_string(),
                replicas: 5
            })
        );
    }

    #[test]
    fn 不正な値では確定しない() {
        let mut modal = ScaleModal::default();
        modal.show(ScaleArgs {
            deployment: "web".to_string(),
            current: 999,
        });
        modal.update(KeyEvent::from(KeyCode::Char('9')));

        assert_eq!(
            modal.update(KeyEvent::from(KeyCode::Enter)),
            ModalState::Pending
        );
        assert_eq!(modal.error(), Some("max is 1000"));
        assert!(modal.is_visible());

        modal.update(KeyEvent::from(KeyCode::Backspace));

        assert_eq!(modal.error(), None);
    }
}
