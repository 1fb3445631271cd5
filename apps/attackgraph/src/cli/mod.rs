//! # attackgraph CLI Module
//!
//! This module implements the CLI interface for attackgraph.
//!
//! ## Available Commands
//!
//! - `generate` - Run the pipeline and optionally save the dataset
//! - `stats` - Distribution statistics of a saved dataset
//! - `validate` - Resolve a schema and report the first problem
//! - `schemas` - List built-in presets or print one as TOML
//! - `hash` - Compute BLAKE3 digest of a dataset file

mod commands;

use attackgraph_core::AttackGraphError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// attackgraph - synthetic enterprise graphs with labeled attack paths
///
/// Generates seeded, schema-driven activity graphs, injects multi-hop
/// attack motifs and exports node/edge tensors for anomaly detection.
#[derive(Parser, Debug)]
#[command(name = "attackgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

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
    /// Generate a labeled graph
    Generate {
        /// Preset name or path to a TOML schema
        #[arg(short, long, default_value = "enterprise_a")]
        schema: String,

        /// Seed of the random stream
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Minimum number of attack instances
        #[arg(long)]
        min_attacks: Option<usize>,

        /// Maximum number of attack instances
        #[arg(long)]
        max_attacks: Option<usize>,

        /// Write the dataset to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show distribution statistics of a saved dataset
    Stats {
        /// Dataset file
        #[arg(short, long)]
        input: PathBuf,

        /// List every attack instance
        #[arg(long)]
        instances: bool,
    },

    /// Validate a schema
    Validate {
        /// Preset name or path to a TOML schema
        #[arg(short, long)]
        schema: String,
    },

    /// List built-in schemas
    Schemas {
        /// Print the named preset as TOML
        #[arg(long)]
        dump: Option<String>,
    },

    /// Compute BLAKE3 cryptographic hash of a dataset file
    Hash {
        /// Dataset file
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AttackGraphError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Generate {
            schema,
            seed,
            min_attacks,
            max_attacks,
            output,
        }) => cmd_generate(
            json_mode,
            &schema,
            seed,
            min_attacks,
            max_attacks,
            output.as_deref(),
        ),
        Some(Commands::Stats { input, instances }) => cmd_stats(json_mode, &input, instances),
        Some(Commands::Validate { schema }) => cmd_validate(json_mode, &schema),
        Some(Commands::Schemas { dump }) => cmd_schemas(json_mode, dump.as_deref()),
        Some(Commands::Hash { input }) => cmd_hash(json_mode, &input),
        None => {
            // No subcommand - list schemas by default
            cmd_schemas(json_mode, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_defaults() {
        let cli = Cli::try_parse_from(["attackgraph", "generate"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Generate {
                ref schema,
                seed: 42,
                min_attacks: None,
                max_attacks: None,
                output: None,
            }) if schema == "enterprise_a"
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["attackgraph", "schemas", "--json-mode", "-q"])
            .expect("parse");
        assert!(cli.json_mode);
        assert!(cli.quiet);
    }

    #[test]
    fn stats_requires_input() {
        assert!(Cli::try_parse_from(["attackgraph", "stats"]).is_err());
    }
}
