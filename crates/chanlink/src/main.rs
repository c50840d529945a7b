mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "chanlink", version, about = "Synchronous channel connector diagnostics")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        env = "CHANLINK_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "CHANLINK_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ping_subcommand() {
        let cli = Cli::try_parse_from([
            "chanlink", "ping", "--count", "5", "--size", "128", "--handles", "2",
        ])
        .expect("ping args should parse");

        match cli.command {
            Command::Ping(args) => {
                assert_eq!(args.count, 5);
                assert_eq!(args.size, 128);
                assert_eq!(args.handles, 2);
            }
            other => panic!("expected ping, got {other:?}"),
        }
    }

    #[test]
    fn format_is_global() {
        let cli = Cli::try_parse_from(["chanlink", "doctor", "--format", "json"])
            .expect("doctor args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Doctor(_)));
    }

    #[test]
    fn rejects_non_numeric_count() {
        let err = Cli::try_parse_from(["chanlink", "ping", "--count", "many"])
            .expect_err("non-numeric count should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
