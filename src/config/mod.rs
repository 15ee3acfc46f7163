pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "serde-blocklist")]
#[command(about = "Resolve and inspect a serialization blocklist")]
pub struct CliConfig {
    #[arg(long, short = 'c', help = "Path to the blocklist TOML file")]
    pub config: PathBuf,

    #[arg(long = "check", value_name = "NAME", help = "Report whether a type name is blocked")]
    pub checks: Vec<String>,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
