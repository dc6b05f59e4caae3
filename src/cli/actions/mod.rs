pub mod navigate;
pub mod request;
pub mod session;

// Internal "interpreter" for `Action`.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Login(GlobalArgs, session::LoginArgs),
    Register(GlobalArgs, session::RegisterArgs),
    Logout(GlobalArgs),
    Status(GlobalArgs),
    Routes,
    Navigate(GlobalArgs, String),
    Get(GlobalArgs, String),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
