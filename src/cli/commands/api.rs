use crate::api::DEFAULT_API_URL;
use clap::{Arg, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TIMEOUT_SECONDS: &str = "timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the StudyHub API")
                .env("STUDYHUB_API_URL")
                .default_value(DEFAULT_API_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT_SECONDS)
                .long(ARG_TIMEOUT_SECONDS)
                .help("Request timeout in seconds")
                .env("STUDYHUB_TIMEOUT_SECONDS")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
