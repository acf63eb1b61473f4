#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;

use crate::config::SessionConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: String,
    email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[async_trait]
pub trait SessionProvider {
    /// Returns the signed-in user, or `None` for an anonymous session.
    async fn current_user(&self) -> Result<Option<User>>;

    async fn require_user(&self) -> Result<User> {
        self.current_user()
            .await?
            .ok_or_else(|| eyre::eyre!("authentication required"))
    }
}

pub type ArcSession = Arc<dyn SessionProvider + Send + Sync>;

/// A session whose user is fixed for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    user: Option<User>,
}

impl StaticSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_user(&self) -> Result<Option<User>> {
        Ok(self.user.clone())
    }
}

impl From<&SessionConfig> for StaticSession {
    fn from(value: &SessionConfig) -> Self {
        let user_id = value
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        match user_id {
            Some(id) => {
                let mut user = User::new(id);
                if let Some(email) = value.email.as_deref() {
                    user = user.with_email(email);
                }
                Self::signed_in(user)
            }
            None => Self::anonymous(),
        }
    }
}

pub fn new_session(config: &SessionConfig) -> ArcSession {
    Arc::new(StaticSession::from(config))
}
