//! # Cart Stream Adapter
//!
//! `observe_cart` is the single entry point for collaborators that already
//! produce a stream of cart snapshots (one per edit). It runs a scheduler
//! for the stream and yields every publication.
//!
//! ```text
//!   Stream<Cart> ──► feed task ──► SchedulerHandle::submit ──► scheduler
//!                                                                 │
//!   Stream<Publication> ◄── BroadcastStream ◄── publications ◄────┘
//! ```
//!
//! When the input stream ends, outstanding work is finished and published,
//! then the output stream ends.

use std::sync::Arc;

use aksi_core::Cart;
use futures_util::{future, pin_mut, Stream, StreamExt};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::config::RecalcConfig;
use crate::engine::PricingEngine;
use crate::error::RecalcError;
use crate::scheduler::{Publication, RecalcScheduler, SchedulerHandle};

/// Observes a stream of cart snapshots and yields `(signature, result)`
/// publications.
///
/// Must be called from within a tokio runtime.
pub fn observe_cart<S>(
    carts: S,
    engine: Arc<dyn PricingEngine>,
    config: RecalcConfig,
) -> impl Stream<Item = Publication> + Send + 'static
where
    S: Stream<Item = Cart> + Send + 'static,
{
    let handle = RecalcScheduler::new(engine, config).start();
    let publications = BroadcastStream::new(handle.subscribe());

    tokio::spawn(feed(carts, handle));

    publications.filter_map(|item| {
        future::ready(match item {
            Ok(publication) => Some(publication),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Publication consumer lagging, older publications dropped");
                None
            }
        })
    })
}

/// Forwards cart snapshots to the scheduler, then closes it.
async fn feed<S>(carts: S, handle: SchedulerHandle)
where
    S: Stream<Item = Cart> + Send,
{
    pin_mut!(carts);

    while let Some(cart) = carts.next().await {
        let cart_id = cart.id().to_string();
        match handle.submit(cart).await {
            Ok(_) => {}
            Err(RecalcError::SignatureFailed(reason)) => {
                warn!(%cart_id, %reason, "Skipping cart snapshot");
            }
            Err(e) => {
                warn!(%cart_id, error = %e, "Scheduler stopped accepting snapshots");
                break;
            }
        }
    }

    if let Err(e) = handle.close().await {
        debug!(error = %e, "Scheduler already stopped");
    }
}
