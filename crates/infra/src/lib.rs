//! Infrastructure layer: store sessions and process-local demo state.

pub mod kv;
pub mod session;

pub use kv::{InMemoryKeyValueStore, KeyValueStore};
pub use session::{
    InMemoryStore, Page, PgSessionProvider, Session, SessionHandle, SessionProvider, SessionState,
    StoreError,
};
