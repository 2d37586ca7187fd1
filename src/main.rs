//! ReChisel CLI entry point.

use anyhow::Result;
use clap::Parser;

use rechisel::cli::{commands, Cli, Commands};
use rechisel::infrastructure::logging::{LogConfig, LoggerImpl};
use rechisel::infrastructure::ConfigLoader;

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &config, cli.json).await,
        Commands::Solve(args) => commands::solve::execute(args, &config, cli.json).await,
        Commands::Eval(args) => commands::eval::execute(args, cli.json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = dispatch(cli).await {
        rechisel::cli::handle_error(err, json_mode);
    }
}
