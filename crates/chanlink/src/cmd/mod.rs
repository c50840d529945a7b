use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod ping;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run blocking round trips against an in-process echo peer.
    Ping(PingArgs),
    /// Run local channel health checks.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ping(args) => ping::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Number of round trips.
    #[arg(long, short = 'n', default_value = "10")]
    pub count: usize,
    /// Payload size in bytes.
    #[arg(long, default_value = "64")]
    pub size: usize,
    /// Handles attached to every request (duplicated /dev/null descriptors).
    #[arg(long, default_value = "0")]
    pub handles: usize,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
