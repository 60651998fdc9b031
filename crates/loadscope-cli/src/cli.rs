//! Command-line surface of the appliance.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "loadscope",
    about = "Network-traffic observability appliance: TZSP capture, per-class load, ARIMA prediction",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the appliance: capture, analyzers, cleaner, display.
    Run,

    /// Administer the traffic-class catalog.
    Types(TypesArgs),
}

#[derive(Debug, Args)]
pub struct TypesArgs {
    #[command(subcommand)]
    pub command: TypesCommand,
}

#[derive(Debug, Subcommand)]
pub enum TypesCommand {
    /// List all traffic classes as JSON.
    List,

    /// Show one traffic class.
    Show { id: i64 },

    /// Create a traffic class. Zero protocol/port values are wildcards.
    Create {
        name: String,
        #[arg(long, default_value_t = 0)]
        network_protocol: u32,
        #[arg(long, default_value_t = 0)]
        transport_protocol: u32,
        #[arg(long, default_value_t = 0)]
        port: u32,
        /// Enable ARIMA forecasting for this class.
        #[arg(long)]
        forecasting: bool,
    },

    /// Update fields of an existing traffic class.
    Set {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        network_protocol: Option<u32>,
        #[arg(long)]
        transport_protocol: Option<u32>,
        #[arg(long)]
        port: Option<u32>,
        #[arg(long)]
        forecasting: Option<bool>,
    },

    /// Delete a traffic class and its orphaned records.
    Rm { id: i64 },
}
