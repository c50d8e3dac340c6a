// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Strata CLI
//!
//! The `strata` binary drives one workspace manifest: it plans atoms from a
//! request, stores them in the knowledge store, and exposes the store for
//! inspection and status updates.
//!
//! ## Commands
//!
//! - `strata init` - Open or initialize the workspace manifest
//! - `strata plan` - Decompose, order and persist a request
//! - `strata atoms|ready|layers|validate` - Inspect the manifest
//! - `strata status ID STATUS` - Update an atom's status
//! - `strata config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use strata_core::domain::config::{LoggingConfig, StrataConfigManifest};
use strata_orchestrator::commands::{self, ConfigCommand, PlanArgs};

/// Strata - dependency-ordered planning for incremental code generation
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "STRATA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Workspace root (overrides spec.workspace.root)
    #[arg(short, long, global = true, env = "STRATA_WORKSPACE", value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "STRATA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true, env = "STRATA_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open or initialize the workspace manifest
    #[command(name = "init")]
    Init {
        /// Project name for a new manifest
        #[arg(long)]
        name: Option<String>,

        /// Root namespace for a new manifest
        #[arg(long)]
        namespace: Option<String>,

        /// Target framework for a new manifest
        #[arg(long)]
        framework: Option<String>,
    },

    /// Plan a request into ordered atoms and store them
    #[command(name = "plan")]
    Plan(PlanArgs),

    /// List atoms
    #[command(name = "atoms")]
    Atoms {
        /// Only atoms with this status
        #[arg(long)]
        status: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List pending atoms whose dependencies are completed
    #[command(name = "ready")]
    Ready {
        #[arg(long)]
        json: bool,
    },

    /// Update an atom's status
    #[command(name = "status")]
    Status {
        /// Atom id
        id: String,

        /// New status (Pending, InProgress, Review, Completed, Failed)
        status: String,

        /// Reject transitions off the lifecycle path
        #[arg(long)]
        strict: bool,
    },

    /// Run the dependency validator over the manifest
    #[command(name = "validate")]
    Validate,

    /// Show the layer policy
    #[command(name = "layers")]
    Layers,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // No command provided - show help
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    // Config commands load (and report on) the config themselves
    let config = if matches!(command, Commands::Config { .. }) {
        StrataConfigManifest::default()
    } else {
        StrataConfigManifest::load_or_default(cli.config.clone())
            .context("Failed to load configuration")?
    };
    let logging = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.logging.as_ref());
    init_logging(cli.log_level.as_deref(), cli.log_format.as_deref(), logging)?;

    let workspace = cli.workspace;
    match command {
        Commands::Init {
            name,
            namespace,
            framework,
        } => commands::workspace::init(config, workspace, name, namespace, framework),
        Commands::Plan(args) => commands::plan::execute(config, workspace, args).await,
        Commands::Atoms { status, json } => {
            commands::workspace::atoms(config, workspace, status, json)
        }
        Commands::Ready { json } => commands::workspace::ready(config, workspace, json),
        Commands::Status { id, status, strict } => {
            commands::workspace::status(config, workspace, &id, &status, strict)
        }
        Commands::Validate => commands::workspace::validate(config, workspace),
        Commands::Layers => commands::workspace::layers(config, workspace),
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

/// Initialize tracing subscriber for logging.
///
/// Flags win over the config file; `RUST_LOG` wins over both for the filter.
fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
    config: Option<&LoggingConfig>,
) -> Result<()> {
    let level = level
        .or(config.map(|c| c.level.as_str()))
        .unwrap_or("warn");
    let format = format
        .or(config.map(|c| c.format.as_str()))
        .unwrap_or("text");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
