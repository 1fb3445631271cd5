//! # attackgraph
//!
//! The main binary of the synthetic attack-graph generator.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        apps/attackgraph (THE BINARY)         │
//! │                                              │
//! │   ┌────────────┐        ┌──────────────┐     │
//! │   │    CLI     │        │  Dataset I/O │     │
//! │   │  (clap)    │        │   (files)    │     │
//! │   └─────┬──────┘        └──────┬───────┘     │
//! │         └────────────┬─────────┘             │
//! │                      ▼                       │
//! │             ┌──────────────────┐             │
//! │             │ attackgraph-core │             │
//! │             │   (THE ENGINE)   │             │
//! │             └──────────────────┘             │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Generate the reference topology and save it
//! attackgraph generate --schema enterprise_a --seed 42 --output a.agds
//!
//! # Inspect and fingerprint a saved dataset
//! attackgraph stats --input a.agds --instances
//! attackgraph hash --input a.agds
//!
//! # Check a custom schema
//! attackgraph validate --schema my_network.toml
//! ```

use attackgraph::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // ATTACKGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("ATTACKGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose {
        "attackgraph=debug,attackgraph_core=debug"
    } else {
        "attackgraph=info,attackgraph_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so --json-mode output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  attackgraph v{}
  Seeded • Labeled • Schema-driven
"#,
        env!("CARGO_PKG_VERSION")
    );
}
