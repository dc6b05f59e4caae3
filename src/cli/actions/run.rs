use crate::cli::actions::{navigate, request, session, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(globals, args) => session::login(&globals, args).await,
        Action::Register(globals, args) => session::register(&globals, args).await,
        Action::Logout(globals) => session::logout(&globals),
        Action::Status(globals) => session::status(&globals),
        Action::Routes => navigate::routes(),
        Action::Navigate(globals, path) => navigate::navigate(&globals, &path),
        Action::Get(globals, path) => request::get(&globals, &path).await,
    }
}
