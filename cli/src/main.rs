use clap::Parser;

use unicorn_core::config::load_config;

mod cli;
mod logging;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging first so config discovery is visible
    let logging = logging::Logging::init()?;
    let config = load_config(cli.config.clone())?;
    logging.apply_level(&config.logging.level)?;

    match cli.command {
        Commands::Start { port } => {
            cli::commands::start::run(config, port).await?;
        }
        Commands::Status => {
            cli::commands::status::run(&config).await?;
        }
        Commands::Sessions => {
            cli::commands::sessions::run(&config).await?;
        }
        Commands::Rewrite { env, args } => {
            cli::commands::rewrite::run(&config, env, args)?;
        }
    }

    Ok(())
}
