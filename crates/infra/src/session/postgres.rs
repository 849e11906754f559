//! Postgres-backed session provider.
//!
//! Each acquired session owns one pooled connection; releasing the session
//! returns that connection to the pool.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `MissingReference` |
//! | Database (other) | any | `Backend` |
//! | PoolTimedOut / PoolClosed / Io / Tls | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |
//!
//! Every failure while acquiring a connection is reported as `Unavailable`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Acquire, Postgres, Row};
use tracing::instrument;

use sampler_core::{Item, ItemId, NewItem, NewUser, User, UserId};

use super::handle::SessionHandle;
use super::r#trait::{Page, Session, SessionProvider, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        price DOUBLE PRECISION NOT NULL CHECK (price > 0),
        owner_id BIGINT NOT NULL REFERENCES users(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS items_owner_id_idx ON items (owner_id)",
];

#[derive(Debug, Clone)]
pub struct PgSessionProvider {
    pool: PgPool,
}

impl PgSessionProvider {
    /// Connect a pool of at most `max_connections`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for PgSessionProvider {
    async fn acquire(&self) -> Result<SessionHandle, StoreError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(SessionHandle::new(Box::new(PgSession { conn: Some(conn) })))
    }
}

struct PgSession {
    conn: Option<PoolConnection<Postgres>>,
}

impl PgSession {
    fn conn(&mut self) -> Result<&mut PoolConnection<Postgres>, StoreError> {
        self.conn.as_mut().ok_or(StoreError::Released)
    }

    async fn items_for(&mut self, owners: &[i64]) -> Result<HashMap<i64, Vec<Item>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, price, owner_id
            FROM items
            WHERE owner_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(owners)
        .fetch_all(&mut **self.conn()?)
        .await
        .map_err(|e| map_sqlx_error("items_for", e))?;

        let mut by_owner: HashMap<i64, Vec<Item>> = HashMap::new();
        for row in rows {
            let item = item_from_row(&row)?;
            by_owner.entry(item.owner_id.get()).or_default().push(item);
        }
        Ok(by_owner)
    }

    async fn hydrate(&mut self, rows: Vec<PgRow>) -> Result<Vec<User>, StoreError> {
        let mut users = rows.iter().map(user_from_row).collect::<Result<Vec<_>, _>>()?;
        if users.is_empty() {
            return Ok(users);
        }
        let owners: Vec<i64> = users.iter().map(|u| u.id.get()).collect();
        let mut items = self.items_for(&owners).await?;
        for user in &mut users {
            user.items = items.remove(&user.id.get()).unwrap_or_default();
        }
        Ok(users)
    }
}

#[async_trait]
impl Session for PgSession {
    async fn get_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let rows = sqlx::query("SELECT id, email, hashed_password, is_active FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_all(&mut **self.conn()?)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        Ok(self.hydrate(rows).await?.pop())
    }

    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let rows =
            sqlx::query("SELECT id, email, hashed_password, is_active FROM users WHERE email = $1")
                .bind(email)
                .fetch_all(&mut **self.conn()?)
                .await
                .map_err(|e| map_sqlx_error("get_user_by_email", e))?;
        Ok(self.hydrate(rows).await?.pop())
    }

    async fn list_users(&mut self, page: Page) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, hashed_password, is_active
            FROM users
            ORDER BY id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(to_i64(page.skip))
        .bind(to_i64(page.limit))
        .fetch_all(&mut **self.conn()?)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        self.hydrate(rows).await
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let conn = self.conn()?;
        let mut tx = (&mut **conn)
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (email, hashed_password, is_active)
            VALUES ($1, $2, TRUE)
            RETURNING id, email, hashed_password, is_active
            "#,
        )
        .bind(user.email())
        .bind(user.hashed_password())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?;

        user_from_row(&row)
    }

    async fn list_items(&mut self, page: Page) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, price, owner_id
            FROM items
            ORDER BY id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(to_i64(page.skip))
        .bind(to_i64(page.limit))
        .fetch_all(&mut **self.conn()?)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    async fn create_user_item(&mut self, owner_id: UserId, item: NewItem) -> Result<Item, StoreError> {
        let conn = self.conn()?;
        let mut tx = (&mut **conn)
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_user_item", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO items (title, description, price, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, price, owner_id
            "#,
        )
        .bind(item.title())
        .bind(item.description())
        .bind(item.price())
        .bind(owner_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_user_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_user_item", e))?;

        item_from_row(&row)
    }

    fn release(&mut self) {
        // Dropping the pooled connection hands it back to the pool.
        self.conn.take();
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("decode user", e))?;
    Ok(User {
        id: UserId::new(id).map_err(|e| StoreError::Backend(e.to_string()))?,
        email: row.try_get("email").map_err(|e| map_sqlx_error("decode user", e))?,
        hashed_password: row
            .try_get("hashed_password")
            .map_err(|e| map_sqlx_error("decode user", e))?,
        is_active: row
            .try_get("is_active")
            .map_err(|e| map_sqlx_error("decode user", e))?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &PgRow) -> Result<Item, StoreError> {
    let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("decode item", e))?;
    let owner: i64 = row
        .try_get("owner_id")
        .map_err(|e| map_sqlx_error("decode item", e))?;
    Ok(Item {
        id: ItemId::new(id).map_err(|e| StoreError::Backend(e.to_string()))?,
        title: row.try_get("title").map_err(|e| map_sqlx_error("decode item", e))?,
        description: row
            .try_get("description")
            .map_err(|e| map_sqlx_error("decode item", e))?,
        price: row.try_get("price").map_err(|e| map_sqlx_error("decode item", e))?,
        owner_id: UserId::new(owner).map_err(|e| StoreError::Backend(e.to_string()))?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {}: {}", operation, e)),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {}: {}", operation, e)),
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}
