//! # Aksi Pricing CLI
//!
//! Replays a script of cart edits against a price list and prints, as JSON
//! lines, exactly what the order screen would receive.
//!
//! ## Commands
//! ```text
//! aksi-pricing price       --catalog demo/catalog.toml --edits demo/edits.json
//! aksi-pricing replay      --catalog demo/catalog.toml --edits demo/edits.json --delay-ms 20
//! aksi-pricing init-config [--path recalc.toml]
//! ```
//!
//! ## Replay Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  edits.json ──► replay() ──► snapshots ──► observe_cart ──► stdout      │
//! │                    │                            │                       │
//! │                    ▼                            ▼                       │
//! │              {"event":"rejected"}     {"event":"published" | "failed"}  │
//! │                                                                         │
//! │  end of stream ──► {"event":"summary"}                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default filter.

mod catalog_file;
mod edits;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aksi_core::{compute_breakdown, Cart, PriceBreakdown};
use aksi_recalc::{
    derive_signature, observe_cart, ComputeError, InputSignature, LocalEngine, Publication,
    RecalcConfig,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::edits::EditRejection;

/// Cart id used for replayed orders.
const REPLAY_CART_ID: &str = "replay";

#[derive(Debug, Parser)]
#[command(name = "aksi-pricing", version, about = "Dry-cleaning order pricing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply every edit and price the final cart once.
    Price(InputArgs),

    /// Stream every intermediate cart through the recalculation scheduler.
    Replay {
        #[command(flatten)]
        input: InputArgs,

        /// Scheduler config file (defaults to the platform config dir).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overrides the configured debounce window.
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Pause between edits, simulating an operator.
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },

    /// Write a default scheduler config file.
    InitConfig {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Price list (TOML).
    #[arg(long)]
    catalog: PathBuf,

    /// Edit script (JSON array).
    #[arg(long)]
    edits: PathBuf,
}

// =============================================================================
// Output Events
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutputEvent<'a> {
    Rejected(&'a EditRejection),
    Priced {
        signature: &'a InputSignature,
        breakdown: &'a PriceBreakdown,
    },
    Published {
        signature: &'a InputSignature,
        published_at: DateTime<Utc>,
        breakdown: &'a PriceBreakdown,
    },
    Failed {
        signature: &'a InputSignature,
        published_at: DateTime<Utc>,
        error: &'a ComputeError,
    },
    Summary {
        snapshots: usize,
        rejected: usize,
        publications: usize,
        failures: usize,
        final_total: Option<i64>,
    },
}

fn emit(event: &OutputEvent<'_>) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn emit_publication(publication: &Publication) -> Result<()> {
    match &publication.result {
        Ok(breakdown) => emit(&OutputEvent::Published {
            signature: &publication.signature,
            published_at: publication.published_at,
            breakdown,
        }),
        Err(error) => emit(&OutputEvent::Failed {
            signature: &publication.signature,
            published_at: publication.published_at,
            error,
        }),
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Applies the edit script, emitting rejections. Returns the accepted
/// snapshots and the number of rejected edits.
fn load_snapshots(input: &InputArgs) -> Result<(Vec<Cart>, usize)> {
    let catalog = catalog_file::load_catalog(&input.catalog)?;
    let script = edits::load_edits(&input.edits)?;

    let (snapshots, rejections) = edits::replay(REPLAY_CART_ID, &catalog, &script);
    for rejection in &rejections {
        emit(&OutputEvent::Rejected(rejection))?;
    }

    info!(
        accepted = snapshots.len(),
        rejected = rejections.len(),
        "Edit script applied"
    );
    Ok((snapshots, rejections.len()))
}

fn price(input: InputArgs) -> Result<()> {
    let (snapshots, _) = load_snapshots(&input)?;
    let cart = snapshots
        .last()
        .cloned()
        .unwrap_or_else(|| Cart::with_id(REPLAY_CART_ID));

    let signature = derive_signature(&cart)?;
    let breakdown = compute_breakdown(&cart);
    emit(&OutputEvent::Priced {
        signature: &signature,
        breakdown: &breakdown,
    })
}

async fn replay(
    input: InputArgs,
    config_path: Option<PathBuf>,
    debounce_ms: Option<u64>,
    delay_ms: u64,
) -> Result<()> {
    let mut config = RecalcConfig::load(config_path).context("Failed to load scheduler config")?;
    if let Some(ms) = debounce_ms {
        config = config.with_debounce_ms(ms);
        config.validate()?;
    }

    let (snapshots, rejected) = load_snapshots(&input)?;
    let snapshot_count = snapshots.len();
    let delay = Duration::from_millis(delay_ms);

    let carts = stream::iter(snapshots).then(move |cart| async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        cart
    });

    let mut publications = Box::pin(observe_cart(carts, Arc::new(LocalEngine), config));
    let mut published = 0;
    let mut failures = 0;
    let mut final_total = None;

    while let Some(publication) = publications.next().await {
        published += 1;
        match &publication.result {
            Ok(breakdown) => final_total = Some(breakdown.total.minor()),
            Err(_) => failures += 1,
        }
        emit_publication(&publication)?;
    }

    emit(&OutputEvent::Summary {
        snapshots: snapshot_count,
        rejected,
        publications: published,
        failures,
        final_total,
    })
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = RecalcConfig::default()
        .save(path)
        .context("Failed to write scheduler config")?;
    println!("{}", path.display());
    Ok(())
}

/// Initializes tracing/logging on stderr.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,aksi=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Price(input) => price(input),
        Command::Replay {
            input,
            config,
            debounce_ms,
            delay_ms,
        } => replay(input, config, debounce_ms, delay_ms).await,
        Command::InitConfig { path } => init_config(path),
    }
}
