use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};

use crate::{
    dispatcher::RefreshTarget, kube::ClusterMessage, remote::RemoteMessage,
    stream::StreamMessage,
};

#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum UserEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    FocusGained,
    FocusLost,
}

impl UserEvent {
    pub fn ctrl(c: char) -> Self {
        UserEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }
}

impl From<char> for UserEvent {
    fn from(c: char) -> Self {
        UserEvent::Key(KeyEvent::from(KeyCode::Char(c)))
    }
}

impl From<KeyCode> for UserEvent {
    fn from(code: KeyCode) -> Self {
        UserEvent::Key(KeyEvent::from(code))
    }
}

impl From<UserEvent> for Message {
    fn from(value: UserEvent) -> Self {
        Self::User(value)
    }
}

/// Everything the application loop reacts to.
///
/// Input, timers and task completions share this type so the loop handles
/// exactly one of them per iteration.
#[derive(Debug)]
pub enum Message {
    User(UserEvent),
    /// Frame tick driving the loading spinner
    Tick,
    Refresh(RefreshTarget),
    Cluster(ClusterMessage),
    Remote(RemoteMessage),
    Stream(StreamMessage),
    ExpireNotification(u64),
    Error(anyhow::Error),
}

impl From<ClusterMessage> for Message {
    fn from(value: ClusterMessage) -> Self {
        Self::Cluster(value)
    }
}

impl From<RemoteMessage> for Message {
    fn from(value: RemoteMessage) -> Self {
        Self::Remote(value)
    }
}

impl From<StreamMessage> for Message {
    fn from(value: StreamMessage) -> Self {
        Self::Stream(value)
    }
}

#[macro_export]
macro_rules! panic_set_hook {
    ($t:tt) => {
        use std::panic;
        let default_hook = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            $t;

            default_hook(info);
        }));
    };
}
