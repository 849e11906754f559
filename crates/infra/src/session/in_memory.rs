use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use sampler_core::{Item, ItemId, NewItem, NewUser, User, UserId};

use super::handle::SessionHandle;
use super::r#trait::{Page, Session, SessionProvider, StoreError};

#[derive(Debug, Clone)]
struct UserRow {
    id: UserId,
    email: String,
    hashed_password: String,
    is_active: bool,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRow>,
    items: BTreeMap<ItemId, Item>,
    last_user_id: i64,
    last_item_id: i64,
}

impl Tables {
    fn hydrate(&self, row: &UserRow) -> User {
        User {
            id: row.id,
            email: row.email.clone(),
            hashed_password: row.hashed_password.clone(),
            is_active: row.is_active,
            items: self
                .items
                .values()
                .filter(|i| i.owner_id == row.id)
                .cloned()
                .collect(),
        }
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        if self.users.values().any(|u| u.email == user.email()) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email()
            )));
        }
        let id = UserId::new(self.last_user_id + 1).map_err(|e| StoreError::Backend(e.to_string()))?;
        let row = UserRow {
            id,
            email: user.email().to_string(),
            hashed_password: user.hashed_password().to_string(),
            is_active: true,
        };
        self.last_user_id = id.get();
        let hydrated = self.hydrate(&row);
        self.users.insert(id, row);
        Ok(hydrated)
    }
}

#[derive(Debug)]
struct Shared {
    tables: RwLock<Tables>,
    available: AtomicBool,
    open_sessions: AtomicUsize,
    acquired_total: AtomicU64,
}

/// In-memory store for tests/dev.
///
/// Cloning is cheap and every clone sees the same data. Besides serving as a
/// [`SessionProvider`] it exposes counters so tests can check that every
/// acquired session was given back, and an availability switch to simulate
/// an unreachable store.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(Tables::default()),
                available: AtomicBool::new(true),
                open_sessions: AtomicUsize::new(0),
                acquired_total: AtomicU64::new(0),
            }),
        }
    }

    /// Simulate the store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.shared.available.store(available, Ordering::SeqCst);
    }

    /// Sessions acquired and not yet released.
    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::SeqCst)
    }

    /// Sessions ever acquired.
    pub fn acquired_total(&self) -> u64 {
        self.shared.acquired_total.load(Ordering::SeqCst)
    }

    /// Insert a user outside of any request (fixtures, bootstrap).
    pub fn seed_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.shared.write()?;
        tables.insert_user(user)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store switched off".to_string()))
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.ensure_available()?;
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.ensure_available()?;
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionProvider for InMemoryStore {
    async fn acquire(&self) -> Result<SessionHandle, StoreError> {
        self.shared.ensure_available()?;
        self.shared.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.shared.acquired_total.fetch_add(1, Ordering::SeqCst);
        Ok(SessionHandle::new(Box::new(InMemorySession {
            shared: self.shared.clone(),
            released: false,
        })))
    }
}

struct InMemorySession {
    shared: Arc<Shared>,
    released: bool,
}

#[async_trait]
impl Session for InMemorySession {
    async fn get_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let tables = self.shared.read()?;
        Ok(tables.users.get(&id).map(|row| tables.hydrate(row)))
    }

    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.shared.read()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email)
            .map(|row| tables.hydrate(row)))
    }

    async fn list_users(&mut self, page: Page) -> Result<Vec<User>, StoreError> {
        let tables = self.shared.read()?;
        Ok(tables
            .users
            .values()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .map(|row| tables.hydrate(row))
            .collect())
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.shared.write()?;
        tables.insert_user(user)
    }

    async fn list_items(&mut self, page: Page) -> Result<Vec<Item>, StoreError> {
        let tables = self.shared.read()?;
        Ok(tables
            .items
            .values()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn create_user_item(&mut self, owner_id: UserId, item: NewItem) -> Result<Item, StoreError> {
        let mut tables = self.shared.write()?;
        if !tables.users.contains_key(&owner_id) {
            return Err(StoreError::MissingReference(format!("user {owner_id}")));
        }
        let id = ItemId::new(tables.last_item_id + 1).map_err(|e| StoreError::Backend(e.to_string()))?;
        let item = item.into_item(id, owner_id);
        tables.last_item_id = id.get();
        tables.items.insert(id, item.clone());
        Ok(item)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
