use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "deckcheck")]
#[command(about = "Check Commander decks against the bracket rules service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Validation service host (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Validation service port (overrides config)
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Use wss/https to reach the service
    #[arg(long, global = true)]
    pub secure: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Interactive terminal UI (default)
    Tui,
    /// Validate one deck and print the report
    Validate {
        /// Moxfield deck URL or deck ID
        deck: String,
    },
    /// List stored reports, or show one in full
    History {
        /// Position in the list (1-based) to show in full
        index: Option<usize>,
    },
    /// Print the effective configuration
    Config {
        /// Write it (including --host/--port/--secure) to the config file
        #[arg(long)]
        save: bool,
    },
}
