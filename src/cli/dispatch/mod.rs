//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the [`Action`] the binary executes.

use crate::cli::{
    actions::{session::LoginArgs, session::RegisterArgs, Action},
    commands::{
        self, api::ARG_API_URL, api::ARG_TIMEOUT_SECONDS, session::ARG_STATE_FILE,
    },
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let api_url = required(matches, ARG_API_URL)?;
    let state_file = matches
        .get_one::<PathBuf>(ARG_STATE_FILE)
        .cloned()
        .unwrap_or_else(commands::session::default_state_file);

    let mut globals = GlobalArgs::new(api_url, state_file);
    if let Some(seconds) = matches.get_one::<u64>(ARG_TIMEOUT_SECONDS) {
        globals.timeout = Duration::from_secs(*seconds);
    }
    Ok(globals)
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;

    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("missing subcommand"))?;

    let action = match name {
        commands::CMD_LOGIN => Action::Login(
            globals,
            LoginArgs {
                username: required(sub, commands::ARG_USERNAME)?,
                password: SecretString::from(required(sub, commands::ARG_PASSWORD)?),
                json: sub.get_flag(commands::ARG_JSON_LOGIN),
            },
        ),
        commands::CMD_REGISTER => Action::Register(
            globals,
            RegisterArgs {
                username: required(sub, commands::ARG_USERNAME)?,
                password: SecretString::from(required(sub, commands::ARG_PASSWORD)?),
                email: required(sub, commands::ARG_EMAIL)?,
            },
        ),
        commands::CMD_LOGOUT => Action::Logout(globals),
        commands::CMD_STATUS => Action::Status(globals),
        commands::CMD_ROUTES => Action::Routes,
        commands::CMD_NAVIGATE => Action::Navigate(globals, required(sub, commands::ARG_PATH)?),
        commands::CMD_GET => Action::Get(globals, required(sub, commands::ARG_PATH)?),
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}
