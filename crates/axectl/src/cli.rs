//! Clap derive structures for the `axectl` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// axectl -- monitor and tune Bitaxe/AxeOS miners
#[derive(Debug, Parser)]
#[command(
    name = "axectl",
    version,
    about = "Monitor and tune Bitaxe/AxeOS miners from the command line",
    long_about = "Reads telemetry and settings from an AxeOS device over its local\n\
        REST API, validates setting changes against the device's ASIC model,\n\
        and reads every change back before reporting success.",
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
    /// Device profile to use
    #[arg(long, short = 'p', env = "AXECTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device address, bare host or URL (overrides profile)
    #[arg(long, short = 'd', env = "AXECTL_DEVICE", global = true)]
    pub device: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AXECTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AXECTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show every telemetry value and setting
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Read one control point
    Get(GetArgs),

    /// Change a setting and read it back
    Set(SetArgs),

    /// Trigger a device command (restart, identify)
    Press(PressArgs),

    /// List the legal values of a setting for this device
    #[command(alias = "opts")]
    Options(OptionsArgs),

    /// List every known control point and command (no device needed)
    Points,

    /// Poll the device and print each new reading until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Only show one kind of control point
    #[arg(long, short = 'k')]
    pub kind: Option<PointKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PointKind {
    Sensor,
    Number,
    Select,
    Switch,
    Text,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Control point key (see `axectl points`)
    pub key: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Control point key (see `axectl points`)
    pub key: String,

    /// New value: a number, an option, a label, on/off, or text
    pub value: String,
}

#[derive(Debug, Args)]
pub struct PressArgs {
    /// Command key: restart or identify
    pub command: String,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Control point key (see `axectl points`)
    pub key: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Control points to print (default: a telemetry summary)
    pub keys: Vec<String>,

    /// Poll interval in seconds (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration
    Show,

    /// Add or replace a device profile
    Add {
        /// Profile name
        name: String,

        /// Device address, bare host or URL
        host: String,

        /// Display label for the device
        #[arg(long)]
        label: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Poll interval in seconds (0 disables polling)
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a device profile
    Remove {
        /// Profile name
        name: String,
    },

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
