use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use deckcheck::cli::{handlers, Cli, Commands};
use deckcheck::utils::LogCapture;
use deckcheck::{Config, Result};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deckcheck=info"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load()?.with_overrides(cli.host.clone(), cli.port, cli.secure);

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            // Logs go to the UI panel; writing to stderr would corrupt the alternate screen
            let (capture, log_rx) = LogCapture::new();
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(capture)
                .init();

            handlers::run_tui(config, log_rx).await
        }
        Commands::Validate { deck } => {
            init_stderr_logging();
            handlers::validate_deck(config, deck).await
        }
        Commands::History { index } => {
            init_stderr_logging();
            handlers::show_history(config, index).await
        }
        Commands::Config { save } => {
            init_stderr_logging();
            handlers::show_config(config, save)
        }
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
