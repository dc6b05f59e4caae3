use clap::{Arg, Command};
use std::path::PathBuf;

pub const ARG_STATE_FILE: &str = "state-file";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_STATE_FILE)
            .long(ARG_STATE_FILE)
            .help("Path of the persisted session file")
            .long_help(
                "Path of the persisted session file. Defaults to $XDG_CONFIG_HOME/studyhub/session.json, then $HOME/.config/studyhub/session.json.",
            )
            .env("STUDYHUB_STATE_FILE")
            .global(true)
            .value_parser(clap::value_parser!(PathBuf)),
    )
}

/// Resolves the state file location when none was given.
#[must_use]
pub fn default_state_file() -> PathBuf {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|dir| !dir.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        });

    match config_dir {
        Some(dir) => dir.join("studyhub").join("session.json"),
        None => PathBuf::from(".studyhub").join("session.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_file_prefers_xdg_config_home() {
        temp_env::with_vars(
            [
                ("XDG_CONFIG_HOME", Some("/tmp/xdg")),
                ("HOME", Some("/home/lin")),
            ],
            || {
                assert_eq!(
                    default_state_file(),
                    PathBuf::from("/tmp/xdg/studyhub/session.json")
                );
            },
        );
    }

    #[test]
    fn default_state_file_falls_back_to_home() {
        temp_env::with_vars(
            [("XDG_CONFIG_HOME", None), ("HOME", Some("/home/lin"))],
            || {
                assert_eq!(
                    default_state_file(),
                    PathBuf::from("/home/lin/.config/studyhub/session.json")
                );
            },
        );
    }

    #[test]
    fn default_state_file_without_home_is_relative() {
        temp_env::with_vars(
            [("XDG_CONFIG_HOME", None::<&str>), ("HOME", None)],
            || {
                assert_eq!(
                    default_state_file(),
                    PathBuf::from(".studyhub/session.json")
                );
            },
        );
    }
}
