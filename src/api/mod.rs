//! HTTP access to the platform API.
//!
//! [`ApiClient`] is the single configured client: it attaches
//! `Authorization: Bearer <token>` from the [`SessionStore`](crate::session::SessionStore)
//! and clears the session whenever the API answers `401`, then returns the
//! failure unchanged. [`ApiHandle`] wraps individual call sites with a loading
//! flag and an error slot of their own.

pub mod auth;
mod client;
mod error;
mod handle;

pub use client::{ApiClient, ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use handle::ApiHandle;
