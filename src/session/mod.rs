//! Token store for the client session. Holds the bearer token and the cached
//! user profile, persists them for reload survival, and answers the
//! `is_authenticated` question for the guard and the HTTP client. The token is
//! secret material and is never logged.

pub mod storage;
mod store;
pub mod types;

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{SessionSnapshot, SessionStore, SessionTicket, TOKEN_KEY, USER_KEY};
pub use types::{Role, UserProfile};
