use chrono::{DateTime, Utc};

use crate::models::{Message, Role};

/// A persisted chat turn belonging to one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRecord {
    id: String,
    user_id: String,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl ChatRecord {
    pub fn new(user_id: impl Into<String>, message: &Message) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            role: message.role(),
            content: message.content().to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatRecordFilter {
    user_id: Option<String>,
    role: Option<Role>,
    content_contains: Option<String>,
    limit: Option<usize>,
}

impl ChatRecordFilter {
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_content_contains(mut self, content_contains: impl Into<String>) -> Self {
        self.content_contains = Some(content_contains.into());
        self
    }

    /// Keep only the `limit` most recent records.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn content_contains(&self) -> Option<&str> {
        self.content_contains.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
