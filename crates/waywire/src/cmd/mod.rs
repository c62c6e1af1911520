use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod envinfo;
pub mod generate;
pub mod inspect;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render bindings for a protocol document through a template.
    Generate(GenerateArgs),
    /// List interfaces, messages and opcodes of a protocol document.
    Inspect(InspectArgs),
    /// Listen on a socket and print every message a client sends.
    Monitor(MonitorArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Generate(args) => generate::run(args),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Envinfo(args) => envinfo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Template file, or `builtin:rust` for the bundled Rust client template.
    pub template: String,
    /// Protocol XML document.
    pub protocol: PathBuf,
    /// Prefix to remove from interface names.
    #[arg(long, default_value = "")]
    pub trim_prefix: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Protocol XML document.
    pub protocol: PathBuf,
    /// Prefix to remove from interface names.
    #[arg(long, default_value = "")]
    pub trim_prefix: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Socket path to bind. Defaults to the resolved display socket.
    #[arg(env = "WAYWIRE_SOCKET")]
    pub path: Option<PathBuf>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}
