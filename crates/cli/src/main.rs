//! Marigold CLI - snapshot inspection and maintenance tools.
//!
//! Works on the data directory of a storefront started with
//! `MARIGOLD_DATA_DIR`.
//!
//! # Usage
//!
//! ```bash
//! # List every snapshot, or only those of one device
//! mg-cli --data-dir ./data snapshots list
//! mg-cli snapshots list --device 7f0c...
//!
//! # Print one snapshot
//! mg-cli snapshots show "device/7f0c.../cart:anonymous"
//!
//! # Delete one snapshot, or everything stored for a device
//! mg-cli snapshots purge "device/7f0c.../cart:anonymous"
//! mg-cli snapshots purge --device 7f0c...
//!
//! # Show a device's cart with checkout totals
//! mg-cli carts show --device 7f0c... [--user 1b9d...]
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use marigold_core::{DeviceId, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "mg-cli")]
#[command(author, version, about = "Marigold CLI tools")]
struct Cli {
    /// Storefront data directory
    #[arg(long, env = "MARIGOLD_DATA_DIR", global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and delete raw snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotAction,
    },
    /// Inspect carts
    Carts {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// List snapshot keys
    List {
        /// Only list snapshots of this device
        #[arg(short, long)]
        device: Option<DeviceId>,
    },
    /// Print a snapshot as formatted JSON
    Show {
        /// Full snapshot key
        key: String,
    },
    /// Delete a snapshot, or every snapshot of a device
    Purge {
        /// Full snapshot key
        #[arg(required_unless_present = "device", conflicts_with = "device")]
        key: Option<String>,

        /// Delete every snapshot of this device
        #[arg(short, long)]
        device: Option<DeviceId>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print a device's cart and its checkout totals
    Show {
        /// Device whose cart to show
        #[arg(short, long)]
        device: DeviceId,

        /// Show the user's cart instead of the guest cart
        #[arg(short, long)]
        user: Option<UserId>,
    },
}

fn main() {
    // Load .env before parsing so `MARIGOLD_DATA_DIR` can come from it
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), commands::CliError> {
    let backend = commands::open(&cli.data_dir)?;

    match cli.command {
        Commands::Snapshots { action } => match action {
            SnapshotAction::List { device } => commands::snapshots::list(&backend, device)?,
            SnapshotAction::Show { key } => commands::snapshots::show(&backend, &key)?,
            SnapshotAction::Purge { key, device } => {
                commands::snapshots::purge(&backend, key.as_deref(), device)?;
            }
        },
        Commands::Carts { action } => match action {
            CartAction::Show { device, user } => commands::carts::show(backend, device, user)?,
        },
    }
    Ok(())
}
