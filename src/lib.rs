//! # StudyHub (Session-Aware Platform Client)
//!
//! `studyhub` is the client side of the StudyHub education platform. It keeps the
//! learner's session, talks to the platform API, and decides which views a
//! navigation may reach.
//!
//! ## Session Guard
//!
//! Three parts cooperate around one owned [`session::SessionStore`]:
//!
//! - **Token Store** ([`session`]): holds the bearer token and the optional user
//!   profile in memory and mirrors both into durable storage under the `token`
//!   and `user` keys. `initialize()` hydrates it once at startup.
//! - **HTTP Client** ([`api`]): attaches `Authorization: Bearer <token>` when a
//!   token is held, clears the session on any `401`, and still returns the
//!   failure to the caller.
//! - **Route Guard** ([`routes`]): evaluates a static per-route policy against
//!   the current session. It never calls the network; a stale token is corrected
//!   after the fact by the client's `401` handling.
//!
//! The store is passed explicitly to the client and to the guard. Session
//! mutations are synchronous, so a finished login is visible to the next guard
//! evaluation and the next request. Late results from superseded requests are
//! rejected through [`session::SessionTicket`].

pub mod api;
pub mod cli;
pub mod routes;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
