use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names accepted in `STUDYHUB_LOG_LEVEL`, indexed by verbosity count.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Highest numeric level; anything above `trace` still means `trace`.
const MAX_NUMERIC_LEVEL: u8 = 5;

/// Parses a log level name or a number into a verbosity count.
///
/// # Errors
/// Returns the list of accepted values when `value` is neither.
pub fn parse_log_level(value: &str) -> Result<u8, String> {
    let value = value.trim();
    if let Ok(count) = value.parse::<u8>() {
        if count <= MAX_NUMERIC_LEVEL {
            return Ok(count);
        }
    }

    LOG_LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!(
                "invalid log level '{value}', expected one of {} or 0-{MAX_NUMERIC_LEVEL}",
                LOG_LEVELS.join(", ")
            )
        })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log output on stderr; repeat for more (-vvv is debug)")
            .env("STUDYHUB_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::new(parse_log_level)),
    )
}
