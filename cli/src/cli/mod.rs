pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "unicorn-balancer")]
#[command(author, version, about = "Load balancer front for Plex transcoding sessions")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/unicorn-balancer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the balancer
    Start {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and whether the balancer is running
    Status,

    /// List sessions tracked by the running balancer
    Sessions,

    /// Rewrite a transcoder invocation offline and print the result
    Rewrite {
        /// Environment variable passed through with the arguments (KEY=VALUE)
        #[arg(short, long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,

        /// Transcoder arguments
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))
}
