//! # Hydronet CLI Module
//!
//! ## Available Commands
//!
//! - `build` - Build a model from a TOML network description
//! - `add-node` - Add (or replace) a node in a saved model
//! - `add-link` - Add a link between two nodes of a saved model
//! - `validate` - Run whole-model validation
//! - `status` - Show model metrics
//! - `rules` - Print connectivity and degree rules
//! - `export` - Export the model as JSON row sets
//! - `import` - Import a model from JSON row sets
//! - `hash` - Compute checksum and BLAKE3 hash of the model

mod commands;

use crate::network::parse_row;
use clap::{Parser, Subcommand};
use hydronet_core::{AttributeRow, HydronetError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Hydronet - hydrological network topology builder
///
/// Builds typed node/link networks and checks every structural rule the
/// solver relies on.
#[derive(Parser, Debug)]
#[command(name = "hydronet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the binary model file
    #[arg(short, long, global = true, default_value = "model.hnet")]
    pub model: PathBuf,

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
    /// Build a model from a TOML network description
    Build {
        /// Path to the network description
        #[arg(short, long)]
        input: PathBuf,

        /// Overwrite an existing model file
        #[arg(short, long)]
        force: bool,
    },

    /// Add a node to the model
    AddNode {
        /// Node kind (e.g. Basin, tabulated_rating_curve)
        #[arg(short, long)]
        kind: String,

        /// Explicit node ID (default: one above the current maximum)
        #[arg(long)]
        id: Option<u32>,

        /// X coordinate
        #[arg(short, long, default_value = "0.0", allow_negative_numbers = true)]
        x: f64,

        /// Y coordinate
        #[arg(short, long, default_value = "0.0", allow_negative_numbers = true)]
        y: f64,

        /// Node name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Subnetwork ID
        #[arg(long)]
        subnetwork_id: Option<u32>,

        /// Route priority
        #[arg(long)]
        route_priority: Option<u32>,

        /// Mark the node's time series as cyclic
        #[arg(long)]
        cyclic_time: bool,

        /// Attribute row as TABLE or TABLE:FIELDS, e.g. "profile: area = 0.01, level = 0.0" (repeatable)
        #[arg(long = "row", value_name = "TABLE[:FIELDS]", value_parser = parse_row)]
        rows: Vec<AttributeRow>,

        /// Replace the node registered under --id; its old attribute rows are
        /// dropped and only the given --row values are kept
        #[arg(short, long, requires = "id")]
        replace: bool,
    },

    /// Add a link between two nodes
    AddLink {
        /// Source node ID
        #[arg(short, long)]
        from: u32,

        /// Target node ID
        #[arg(short, long)]
        to: u32,

        /// Explicit link ID (default: one above the current maximum)
        #[arg(long)]
        id: Option<u32>,

        /// Link name
        #[arg(short, long, default_value = "")]
        name: String,
    },

    /// Validate the whole model
    Validate,

    /// Show model status
    Status,

    /// Print connectivity and degree rules
    Rules {
        /// Restrict output to one node kind
        kind: Option<String>,
    },

    /// Export the model as JSON row sets
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a model from JSON row sets
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Overwrite an existing model file
        #[arg(short, long)]
        force: bool,
    },

    /// Compute checksum and BLAKE3 hash of the model
    Hash,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), HydronetError> {
    let json_mode = cli.json_mode;
    let verbose = cli.verbose;

    match cli.command {
        Some(Commands::Build { input, force }) => cmd_build(&cli.model, &input, force, json_mode),
        Some(Commands::AddNode {
            kind,
            id,
            x,
            y,
            name,
            subnetwork_id,
            route_priority,
            cyclic_time,
            rows,
            replace,
        }) => {
            let node = NodeArgs {
                kind,
                id,
                x,
                y,
                name,
                subnetwork_id,
                route_priority,
                cyclic_time,
                rows,
            };
            cmd_add_node(&cli.model, node, replace, json_mode)
        }
        Some(Commands::AddLink { from, to, id, name }) => {
            cmd_add_link(&cli.model, from, to, id, &name, json_mode)
        }
        Some(Commands::Validate) => cmd_validate(&cli.model, json_mode, verbose),
        Some(Commands::Status) => cmd_status(&cli.model, json_mode, verbose),
        Some(Commands::Rules { kind }) => cmd_rules(kind.as_deref(), json_mode),
        Some(Commands::Export { output }) => cmd_export(&cli.model, &output),
        Some(Commands::Import { input, force }) => cmd_import(&cli.model, &input, force),
        Some(Commands::Hash) => cmd_hash(&cli.model, json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.model, json_mode, verbose)
        }
    }
}
