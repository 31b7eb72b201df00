//! # Souls CLI Module
//!
//! This module implements the CLI interface for Souls.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `create` - Create a soul
//! - `delete` - Delete a soul
//! - `list` - List every soul
//! - `get` - Show one soul
//! - `login` - Check a soul's credentials
//! - `relate` - Apply a relationship action

mod commands;

use crate::config::{Backend, SoulsConfig};
use clap::{Parser, Subcommand};
use souls_core::SoulError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Souls - identity and relationship server
///
/// Named identities with salted credentials and ally/block/hostile edges.
#[derive(Parser, Debug)]
#[command(name = "souls")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./souls.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the soul database (overrides config)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a soul
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        password: String,
    },

    /// Delete a soul
    Delete {
        #[arg(short, long)]
        name: String,
    },

    /// List every soul
    List,

    /// Show one soul
    Get {
        #[arg(short, long)]
        name: String,
    },

    /// Check a soul's credentials and print its id
    Login {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        password: String,
    },

    /// Apply a relationship action (addAlly, removeAlly, addBlock, ...)
    Relate {
        /// Acting soul
        #[arg(short, long)]
        name: String,

        /// Action to apply
        #[arg(short, long)]
        action: String,

        /// Target soul
        #[arg(short, long)]
        target: String,
    },
}

impl Cli {
    /// Resolve the effective configuration: file, then env, then flags.
    pub fn resolve_config(&self) -> Result<SoulsConfig, SoulError> {
        let mut config = SoulsConfig::load(self.config.as_deref())?;
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
        if let Some(path) = &self.database {
            config.storage.path = path.clone();
        }
        Ok(config)
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SoulError> {
    let mut config = cli.resolve_config()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Create { name, password }) => {
            cmd_create(&config, json_mode, &name, &password)
        }
        Some(Commands::Delete { name }) => cmd_delete(&config, json_mode, &name),
        Some(Commands::List) => cmd_list(&config, json_mode),
        Some(Commands::Get { name }) => cmd_get(&config, json_mode, &name),
        Some(Commands::Login { name, password }) => {
            cmd_login(&config, json_mode, &name, &password)
        }
        Some(Commands::Relate {
            name,
            action,
            target,
        }) => cmd_relate(&config, json_mode, &name, &action, &target),
        None => {
            // No subcommand - list souls by default
            cmd_list(&config, json_mode)
        }
    }
}
