//! # Hydronet - Network Topology Builder
//!
//! The command-line front end for the hydronet topology engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/hydronet (THE BINARY)         │
//! │                                               │
//! │  ┌─────────────┐          ┌────────────────┐  │
//! │  │   CLI       │          │  TOML network  │  │
//! │  │  (clap)     │          │  descriptions  │  │
//! │  └──────┬──────┘          └───────┬────────┘  │
//! │         └────────────┬────────────┘           │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │ hydronet-core │                │
//! │              │ (THE ENGINE)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! hydronet build -i network.toml
//! hydronet add-node -k Pump --id 7 -x 1.5 -y 2.0
//! hydronet add-link -f 1 -t 7
//! hydronet validate
//! hydronet rules basin
//! ```

use clap::Parser;
use hydronet::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // HYDRONET_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("HYDRONET_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hydronet=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

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
  ~~~ hydronet v{} ~~~
  Typed nodes, typed links, checked before the solver runs.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
