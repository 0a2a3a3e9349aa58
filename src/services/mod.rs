pub mod reddit;

use async_trait::async_trait;

use crate::game::types::{Entity, UserAction};

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("activity source unavailable: {0}")]
    Unavailable(String),
    #[error("activity request timed out")]
    Timeout,
    #[error("activity api error: status={status}")]
    Api { status: u16 },
    #[error("activity payload invalid: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("community not found: {0}")]
    NotFound(String),
    #[error("community {0} has no subscriber count")]
    MissingSubscribers(String),
    #[error("lookup request timed out")]
    Timeout,
    #[error("lookup network error: {0}")]
    Network(String),
    #[error("lookup api error: status={status}")]
    Api { status: u16 },
}

#[derive(Debug, thiserror::Error)]
#[error("key-value store error: {0}")]
pub struct KvError(pub String);

/// Recent posts and comments of a user, newest first.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn recent_posts(&self, user: &str, limit: usize)
        -> Result<Vec<UserAction>, ActivityError>;

    async fn recent_comments(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<UserAction>, ActivityError>;
}

/// Live member-count lookup for a single community.
///
/// Implementations return `MissingSubscribers` when the community exists but
/// reports no count, so callers can treat it as an invalid candidate.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn entity_info(&self, name: &str) -> Result<Entity, LookupError>;
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
}
