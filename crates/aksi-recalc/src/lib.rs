//! # aksi-recalc: Recalculation Scheduler for Aksi Order Pricing
//!
//! Re-prices the cart automatically, exactly once per distinct input, while
//! the user edits the order.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Recalculation Architecture                          │
//! │                                                                         │
//! │  Cart editor ── Cart snapshot ──► SchedulerHandle::submit               │
//! │                                        │                                │
//! │                                        ▼ derive_signature (sha256)      │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 Scheduler actor (one tokio task per cart)        │  │
//! │  │                                                                  │  │
//! │  │  unchanged signature ──► skip                                    │  │
//! │  │  idle          ──► (debounce) ──► PricingEngine::compute         │  │
//! │  │  computing     ──► queue newest, discard stale result            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┴─────────────────────┐                  │
//! │         ▼                                           ▼                   │
//! │  broadcast<Publication>                      watch<PricingView>         │
//! │  (signature, breakdown | error)              last good + last error     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Scheduler configuration (TOML + environment)
//! - [`engine`] - `PricingEngine` seam and the in-process `LocalEngine`
//! - [`error`] - Scheduler and computation error types
//! - [`scheduler`] - Single-flight, last-signature-wins scheduler
//! - [`signature`] - Input signature derivation
//! - [`stream`] - `observe_cart` stream adapter

pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod signature;
pub mod stream;

#[cfg(test)]
mod testing;

pub use config::{RecalcConfig, SchedulerSettings};
pub use engine::{LocalEngine, PricingEngine};
pub use error::{ComputeError, RecalcError, RecalcResult};
pub use scheduler::{
    ComputeResult, FailedSnapshot, PricedSnapshot, PricingView, Publication, RecalcScheduler,
    SchedulerHandle, SchedulerState, SchedulerStats,
};
pub use signature::{derive_signature, InputSignature};
pub use stream::observe_cart;
