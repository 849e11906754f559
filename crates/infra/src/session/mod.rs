//! Session Provider: one store handle per request.
//!
//! Handlers never talk to the backing store directly. They receive a
//! [`SessionHandle`] acquired from a [`SessionProvider`] when the request
//! starts; the handle returns its connection when it goes out of scope, so
//! every exit path of the handler (success, early return, `?`) releases it
//! exactly once.

pub mod handle;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use handle::{SessionHandle, SessionState};
pub use in_memory::InMemoryStore;
pub use postgres::PgSessionProvider;
pub use r#trait::{Page, Session, SessionProvider, StoreError};
