#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    #[default]
    Info,
    Warning,
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone)]
pub struct NoticeMessage {
    message: String,
    kind: NoticeKind,
}

impl NoticeMessage {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Info,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Error,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> NoticeKind {
        self.kind
    }
}

impl NoticeKind {
    pub fn title(&self) -> &'static str {
        match self {
            NoticeKind::Info => "Info",
            NoticeKind::Warning => "Warning",
            NoticeKind::Error => "Error",
        }
    }
}
