pub mod api;
pub mod logging;
pub mod session;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_LOGIN: &str = "login";
pub const CMD_REGISTER: &str = "register";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_STATUS: &str = "status";
pub const CMD_ROUTES: &str = "routes";
pub const CMD_NAVIGATE: &str = "navigate";
pub const CMD_GET: &str = "get";

pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_EMAIL: &str = "email";
pub const ARG_JSON_LOGIN: &str = "json";
pub const ARG_PATH: &str = "path";

fn username_arg() -> Arg {
    Arg::new(ARG_USERNAME)
        .short('u')
        .long(ARG_USERNAME)
        .help("Account username")
        .env("STUDYHUB_USERNAME")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("STUDYHUB_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn path_arg(help: &'static str) -> Arg {
    Arg::new(ARG_PATH).help(help).required(true)
}

fn subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Log in and store the session token")
                .arg(username_arg())
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_JSON_LOGIN)
                        .long(ARG_JSON_LOGIN)
                        .help("Use the JSON login endpoint instead of the OAuth2 form")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create a new account")
                .arg(username_arg())
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long(ARG_EMAIL)
                        .help("Account email address")
                        .env("STUDYHUB_EMAIL")
                        .required(true),
                ),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Clear the stored session"))
        .subcommand(Command::new(CMD_STATUS).about("Show the current session"))
        .subcommand(Command::new(CMD_ROUTES).about("List views and their access rules"))
        .subcommand(
            Command::new(CMD_NAVIGATE)
                .about("Show where a navigation to PATH would end up")
                .arg(path_arg("View path, for example /exam/42")),
        )
        .subcommand(
            Command::new(CMD_GET)
                .about("Send an authenticated GET request and print the JSON response")
                .arg(path_arg("API path, for example /api/v1/learning/profile")),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("studyhub")
        .about("StudyHub platform client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true);

    let command = subcommands(command);
    let command = api::with_args(command);
    let command = session::with_args(command);
    logging::with_args(command)
}
