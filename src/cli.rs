use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "swipedeck")]
#[command(about = "Client directory with swipe-to-reveal edit and delete actions")]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// TOML file holding the client list (overrides config)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Width reserved for the row actions (overrides config)
    #[arg(long)]
    pub action_width: Option<f32>,

    /// Idle time before an open row closes itself, in milliseconds (overrides config)
    #[arg(long)]
    pub auto_close_ms: Option<u64>,

    /// Write logs to this file; filtered by RUST_LOG
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
