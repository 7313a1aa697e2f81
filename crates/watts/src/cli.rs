//! Clap derive structures for the `watts` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// watts -- monitor and control Watts SmartHome heating from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "watts",
    version,
    about = "Monitor and control Watts SmartHome thermostats",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "WATTS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "WATTS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Language sent to the API (overrides profile)
    #[arg(long, global = true)]
    pub lang: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WATTS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one device id per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every thermostat with mode, temperatures and errors
    #[command(alias = "ls")]
    Status,

    /// Show one thermostat in detail
    Show(DeviceRef),

    /// Keep polling and print a line per refresh until Ctrl-C
    Watch,

    /// Switch a thermostat's operating mode
    Mode(ModeArgs),

    /// Change one per-mode target temperature
    #[command(alias = "temp")]
    Setpoint(SetpointArgs),

    /// Set the boost countdown
    Boost(BoostArgs),

    /// Weekly program operations
    Program(ProgramArgs),

    /// Manage the config file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct DeviceRef {
    /// Device id: short (C001-000) or composite (SH#C001-000)
    pub device: String,
}

#[derive(Debug, Args)]
pub struct ModeArgs {
    #[command(flatten)]
    pub target: DeviceRef,

    /// comfort, off, anti_frost, eco, boost, program_on, auto_eco, on, auto, disabled
    pub mode: String,
}

#[derive(Debug, Args)]
pub struct SetpointArgs {
    #[command(flatten)]
    pub target: DeviceRef,

    /// comfort, eco, anti_frost or boost
    pub key: String,

    /// Temperature in °C
    #[arg(allow_negative_numbers = true)]
    pub celsius: f64,
}

#[derive(Debug, Args)]
pub struct BoostArgs {
    #[command(flatten)]
    pub target: DeviceRef,

    /// Countdown in seconds
    #[arg(default_value_t = 3600)]
    pub seconds: i64,
}

#[derive(Debug, Args)]
pub struct ProgramArgs {
    #[command(subcommand)]
    pub command: ProgramCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProgramCommand {
    /// Render the device's current program as the API sees it
    Show(DeviceRef),

    /// Apply a weekly program from a JSON file
    Apply {
        #[command(flatten)]
        target: DeviceRef,

        /// JSON object: {"program": {"monday": [{"start", "end", "value"}]}}
        #[arg(long, short = 'f')]
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Write an account profile to the config file
    Init {
        /// Account e-mail
        #[arg(long, short = 'u')]
        username: String,

        /// Environment variable holding the password
        #[arg(long)]
        password_env: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,

        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },
}
