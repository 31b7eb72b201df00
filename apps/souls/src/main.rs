//! # Souls - Identity and Relationship Server
//!
//! The main binary for Souls.
//!
//! This application provides:
//! - HTTP JSON API server (axum-based)
//! - CLI interface for identity and relationship operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/souls (THE BINARY)           │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌──────────────┐                │
//! │              │  souls-core  │                │
//! │              │ (THE LOGIC)  │                │
//! │              └──────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! souls server --host 0.0.0.0 --port 6060
//!
//! # CLI operations
//! souls create -n alice -p secret1
//! souls relate -n alice -a addAlly -t bob
//! souls list --json-mode
//! ```

use clap::Parser;
use souls::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SOULS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SOULS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "souls=info,souls_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!(kind = %e.kind(), "Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Souls startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗ ██████╗ ██╗   ██╗██╗     ███████╗
  ██╔════╝██╔═══██╗██║   ██║██║     ██╔════╝
  ███████╗██║   ██║██║   ██║██║     ███████╗
  ╚════██║██║   ██║██║   ██║██║     ╚════██║
  ███████║╚██████╔╝╚██████╔╝███████╗███████║
  ╚══════╝ ╚═════╝  ╚═════╝ ╚══════╝╚══════╝

  Identity & Relationship Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
