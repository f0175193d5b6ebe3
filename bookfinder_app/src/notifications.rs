use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Transient user facing messages
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);

    fn success(&self, message: &str) {
        self.notify(NotificationLevel::Success, message)
    }

    fn error(&self, message: &str) {
        self.notify(NotificationLevel::Error, message)
    }
}

/// Prints notifications to stderr so they do not mix with rendered output
#[derive(Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        tracing::debug!(%level, "{}", message);
        eprintln!("[{}] {}", level, message);
    }
}

/// Keeps every notification, used by tests
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: parking_lot::Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|notification| notification.message.clone())
            .collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.notifications.lock().push(Notification {
            level,
            message: message.to_string(),
        });
    }
}
