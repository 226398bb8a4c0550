pub mod commands;

use clap::{Parser, Subcommand};
use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "news-search")]
#[command(about = "Search a news feed from a web form, with short-lived result caching")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one search and print the rendered HTML fragment
    Search {
        /// Search term
        query: String,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init { force } => {
                commands::init_logging(self.debug, self.verbose, &Default::default())?;
                commands::init(self.config, force)
            }
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                Ok(())
            }
            Commands::Serve { host, port } => {
                let mut config = Config::load_or_default(self.config.as_deref())?;
                let _guard = commands::init_logging(self.debug, self.verbose, &config.logging)?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                commands::serve(config).await
            }
            Commands::Search { query } => {
                let config = Config::load_or_default(self.config.as_deref())?;
                let _guard = commands::init_logging(self.debug, self.verbose, &config.logging)?;
                commands::search(&config, query).await
            }
        }
    }
}
