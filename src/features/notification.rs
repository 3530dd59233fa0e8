use std::time::Duration;

use crate::task::Task;

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

/// Toasts expiring after [`NOTIFICATION_TTL`].
#[derive(Debug, Default)]
pub struct Notifier {
    next_id: u64,
    notifications: Vec<Notification>,
}

impl Notifier {
    /// Returns the task that expires the toast.
    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>) -> Task {
        self.next_id += 1;

        let id = self.next_id;

        self.notifications.push(Notification {
            id,
            kind,
            message: message.into(),
        });

        Task::ExpireNotification {
            after: NOTIFICATION_TTL,
            id,
        }
    }

    pub fn expire(&mut self, id: u64) {
        self.notifications.retain(|n| n.id != id);
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn 期限切れの通知だけを消す() {
        let mut notifier = Notifier::default();

        let Task::ExpireNotification { after, id: first } =
            notifier.show(NotificationKind::Success, "deleted pod web-7")
        else {
            panic!("expected an expiry task");
        };
        notifier.show(NotificationKind::Error, "forbidden");

        assert_eq!(after, NOTIFICATION_TTL);
        assert_eq!(notifier.notifications().len(), 2);

        notifier.expire(first);

        assert_eq!(
            notifier.latest().map(|n| n.message.as_str()),
            Some("forbidden")
        );
        assert_eq!(notifier.notifications().len(), 1);
    }
}
