//! CLI module for the gateway
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP gateway
//! - `analyze` - Run a single analysis request and print the result
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start server with default config
//! kabu-gateway serve
//!
//! # One-off ranking request
//! GEMINI_API_KEY=... kabu-gateway analyze --type ranking
//!
//! # Generate shell completions
//! kabu-gateway completions bash > ~/.bash_completion.d/kabu-gateway
//! ```

pub mod analyze;
pub mod completions;
pub mod config;
pub mod serve;

pub use analyze::run_analyze;
pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// kabu-gateway - market analysis gateway for a generative-AI backend
#[derive(Parser, Debug)]
#[command(
    name = "kabu-gateway",
    version,
    about = "Market analysis gateway in front of a generative-AI endpoint"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve(ServeArgs),
    /// Run one analysis request and print the result
    Analyze(AnalyzeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "kabu.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "KABU_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "KABU_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "KABU_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Request category (market_data, ranking, dividend_ranking, yutai_list;
    /// anything else is a free-form question)
    #[arg(short = 't', long = "type")]
    pub category: Option<String>,

    /// Free-form question, or the period for yutai_list
    #[arg(short, long)]
    pub query: Option<String>,

    /// Replacement system instruction for free-form questions
    #[arg(long)]
    pub prompt: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "kabu.toml")]
    pub config: PathBuf,

    /// Print compact JSON instead of pretty output
    #[arg(long)]
    pub raw: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "kabu.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
