use async_trait::async_trait;
use thiserror::Error;

use sampler_core::{Item, NewItem, NewUser, User, UserId};

use super::handle::SessionHandle;

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors; the API
/// layer maps them onto status codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (connect/acquire/IO failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write; nothing was persisted.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write referenced a record that does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// The session was used after it had been released.
    #[error("session already released")]
    Released,

    #[error("store error: {0}")]
    Backend(String),
}

/// Offset/limit paging for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 100;

    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// One live, exclusively-owned connection to the backing store.
///
/// Implementations are driven through [`SessionHandle`]; `release` is called
/// by the handle exactly once and must not fail.
#[async_trait]
pub trait Session: Send {
    async fn get_user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&mut self, page: Page) -> Result<Vec<User>, StoreError>;

    /// Persist a new user atomically. An existing email yields
    /// [`StoreError::Conflict`] and nothing is written.
    async fn create_user(&mut self, user: NewUser) -> Result<User, StoreError>;

    async fn list_items(&mut self, page: Page) -> Result<Vec<Item>, StoreError>;

    /// Persist a new item owned by `owner_id`. An unknown owner yields
    /// [`StoreError::MissingReference`] and nothing is written.
    async fn create_user_item(&mut self, owner_id: UserId, item: NewItem) -> Result<Item, StoreError>;

    /// Give the underlying connection back.
    fn release(&mut self);
}

/// Hands out one [`SessionHandle`] per request.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Acquire a fresh session. Fails with [`StoreError::Unavailable`] when
    /// the store cannot be reached; no partial handle is ever returned.
    async fn acquire(&self) -> Result<SessionHandle, StoreError>;
}

#[async_trait]
impl<P> SessionProvider for std::sync::Arc<P>
where
    P: SessionProvider + ?Sized,
{
    async fn acquire(&self) -> Result<SessionHandle, StoreError> {
        (**self).acquire().await
    }
}
