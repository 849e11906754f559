use std::sync::atomic::{AtomicU64, Ordering};

use tracing::instrument;

use sampler_core::{Item, NewItem, NewUser, User, UserId};

use super::r#trait::{Page, Session, StoreError};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Released,
}

/// Scoped owner of one [`Session`].
///
/// # Invariants
/// - The wrapped session is released exactly once: by [`SessionHandle::release`]
///   or, failing that, when the handle is dropped.
/// - A handle is not `Clone`; it cannot outlive or escape the request that
///   acquired it without being moved, and moving transfers ownership.
pub struct SessionHandle {
    id: u64,
    state: SessionState,
    inner: Box<dyn Session>,
}

impl SessionHandle {
    pub fn new(inner: Box<dyn Session>) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(session_id = id, "session acquired");
        Self {
            id,
            state: SessionState::Open,
            inner,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Release now instead of at end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.state == SessionState::Open {
            self.inner.release();
            self.state = SessionState::Released;
            tracing::debug!(session_id = self.id, "session released");
        }
    }

    fn session(&mut self) -> Result<&mut (dyn Session + 'static), StoreError> {
        match self.state {
            SessionState::Open => Ok(self.inner.as_mut()),
            SessionState::Released => Err(StoreError::Released),
        }
    }

    #[instrument(skip(self), fields(session_id = self.id))]
    pub async fn get_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        self.session()?.get_user(id).await
    }

    #[instrument(skip(self), fields(session_id = self.id))]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        self.session()?.get_user_by_email(email).await
    }

    #[instrument(skip(self), fields(session_id = self.id))]
    pub async fn list_users(&mut self, page: Page) -> Result<Vec<User>, StoreError> {
        self.session()?.list_users(page).await
    }

    #[instrument(skip(self, user), fields(session_id = self.id, email = user.email()))]
    pub async fn create_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        self.session()?.create_user(user).await
    }

    #[instrument(skip(self), fields(session_id = self.id))]
    pub async fn list_items(&mut self, page: Page) -> Result<Vec<Item>, StoreError> {
        self.session()?.list_items(page).await
    }

    #[instrument(skip(self, item), fields(session_id = self.id))]
    pub async fn create_user_item(
        &mut self,
        owner_id: UserId,
        item: NewItem,
    ) -> Result<Item, StoreError> {
        self.session()?.create_user_item(owner_id, item).await
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl core::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
