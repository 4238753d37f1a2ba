//! # Recalculation Scheduler
//!
//! Decides when the pricing engine runs. One scheduler serves one cart.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Scheduler States                                     │
//! │                                                                         │
//! │          submit(sig ≠ requested)                                        │
//! │   ┌──────┐  debounce off   ┌─────────────┐                              │
//! │   │ IDLE │ ───────────────►│ COMPUTING(S)│◄─────────────┐               │
//! │   └──────┘                 └──────┬──────┘              │               │
//! │      ▲  │ debounce on             │ done                │ newer sig     │
//! │      │  ▼                         │                     │ was queued:   │
//! │   ┌────────────┐ quiet period     ▼                     │ discard,      │
//! │   │ DEBOUNCING │ ─────────► ┌───────────┐  pending?  ───┘ start next    │
//! │   └────────────┘ elapsed    │ complete  │                               │
//! │                             └─────┬─────┘                               │
//! │                                   │ nothing newer                       │
//! │                                   ▼                                     │
//! │                        publish (S, breakdown | error) ──► IDLE          │
//! │                                                                         │
//! │  Unchanged signature ──► no transition (counted as duplicate)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - At most one computation in flight
//! - Every publication carries the signature it answers
//! - A result whose signature was superseded before completion is never
//!   published
//! - A failed computation keeps the last good breakdown visible
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order wizard                                                           │
//! │                                                                         │
//! │  quantity 1 → 2 → 3 typed quickly                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  handle.submit(cart) × 3                                                │
//! │       │                                                                 │
//! │       ├── qty 1: starts computing                                       │
//! │       ├── qty 2: queued                                                 │
//! │       └── qty 3: replaces qty 2 in the queue                            │
//! │                                                                         │
//! │  qty 1 result discarded, qty 3 computed and published                   │
//! │  Total on screen always matches the latest quantity                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aksi_core::{Cart, PriceBreakdown};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::config::RecalcConfig;
use crate::engine::{LocalEngine, PricingEngine};
use crate::error::{ComputeError, RecalcError, RecalcResult};
use crate::signature::{derive_signature, InputSignature};

/// Outcome of one computation.
pub type ComputeResult = Result<PriceBreakdown, ComputeError>;

// =============================================================================
// Published Types
// =============================================================================

/// A computation answer, tagged with the signature it answers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub signature: InputSignature,
    pub result: ComputeResult,
    pub published_at: DateTime<Utc>,
}

impl Publication {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Scheduler state as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    #[default]
    Idle,
    /// A new signature is waiting for the debounce quiet period.
    Debouncing,
    Computing,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "idle"),
            SchedulerState::Debouncing => write!(f, "debouncing"),
            SchedulerState::Computing => write!(f, "computing"),
        }
    }
}

/// Counters kept by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    /// Submit commands received.
    pub submissions: u64,
    /// Submissions whose signature matched the one already requested.
    pub duplicates_skipped: u64,
    /// Retrigger commands received.
    pub retriggers: u64,
    pub computations_started: u64,
    /// Successful breakdowns published.
    pub published: u64,
    /// Results discarded because a newer signature arrived meanwhile.
    pub superseded: u64,
    /// Failures published.
    pub failed: u64,
}

/// Last successful answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedSnapshot {
    pub signature: InputSignature,
    pub breakdown: PriceBreakdown,
    pub published_at: DateTime<Utc>,
}

/// Last failed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSnapshot {
    pub signature: InputSignature,
    pub error: ComputeError,
    pub published_at: DateTime<Utc>,
}

/// What the order screen renders.
///
/// `last_good` survives failures; `last_error` is cleared by the next
/// successful publication.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingView {
    pub state: SchedulerState,
    /// Latest signature requested by the collaborator.
    pub requested: Option<InputSignature>,
    /// Signature of the latest publication, success or failure.
    pub answered: Option<InputSignature>,
    pub last_good: Option<PricedSnapshot>,
    pub last_error: Option<FailedSnapshot>,
    pub stats: SchedulerStats,
}

impl PricingView {
    /// True when the published answer matches the latest request.
    pub fn is_current(&self) -> bool {
        self.state == SchedulerState::Idle && self.requested == self.answered
    }

    /// Breakdown to display, if any computation ever succeeded.
    pub fn breakdown(&self) -> Option<&PriceBreakdown> {
        self.last_good.as_ref().map(|s| &s.breakdown)
    }
}

// =============================================================================
// Scheduler Handle
// =============================================================================

/// Commands for the scheduler.
#[derive(Debug)]
enum SchedulerCommand {
    /// A new cart snapshot.
    Submit {
        signature: InputSignature,
        cart: Cart,
    },
    /// Re-run the latest signature.
    Retrigger,
    /// Finish outstanding work, then stop.
    Close,
    /// Stop immediately, abandoning any computation.
    Shutdown,
}

/// Handle for talking to a running scheduler. Cheap to clone.
#[derive(Clone)]
pub struct SchedulerHandle {
    cmd_tx: mpsc::Sender<SchedulerCommand>,
    view_rx: watch::Receiver<PricingView>,
    publish_tx: broadcast::Sender<Publication>,
    /// Submit and retrigger commands accepted by the channel.
    sent: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Submits a cart snapshot and returns its signature.
    ///
    /// Cheap for unchanged carts: the scheduler drops the duplicate without
    /// computing. Safe to call on every keystroke.
    pub async fn submit(&self, cart: Cart) -> RecalcResult<InputSignature> {
        let signature = derive_signature(&cart)?;
        self.send(SchedulerCommand::Submit {
            signature: signature.clone(),
            cart,
        })
        .await?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(signature)
    }

    /// Re-runs the latest signature when idle (manual retry after an error).
    /// Ignored while a computation is running.
    pub async fn retrigger(&self) -> RecalcResult<()> {
        self.send(SchedulerCommand::Retrigger).await?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Lets outstanding work finish, publishes it, then stops the scheduler.
    pub async fn close(&self) -> RecalcResult<()> {
        self.send(SchedulerCommand::Close).await
    }

    /// Stops the scheduler without waiting for the computation in flight.
    pub async fn shutdown(&self) -> RecalcResult<()> {
        self.send(SchedulerCommand::Shutdown).await
    }

    /// Returns the current pricing view.
    pub fn view(&self) -> PricingView {
        self.view_rx.borrow().clone()
    }

    /// Returns the current counters.
    pub fn stats(&self) -> SchedulerStats {
        self.view_rx.borrow().stats
    }

    /// Subscribes to pricing view changes.
    pub fn watch(&self) -> watch::Receiver<PricingView> {
        self.view_rx.clone()
    }

    /// Subscribes to publications made from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Publication> {
        self.publish_tx.subscribe()
    }

    /// Waits until every command sent through this handle (and its clones)
    /// has been processed and the scheduler is idle.
    pub async fn settled(&self) -> RecalcResult<PricingView> {
        let sent = self.sent.load(Ordering::SeqCst);
        let mut rx = self.view_rx.clone();
        let view = rx
            .wait_for(|view| {
                view.state == SchedulerState::Idle
                    && view.stats.submissions + view.stats.retriggers >= sent
            })
            .await
            .map_err(|_| RecalcError::ShuttingDown)?;
        Ok((*view).clone())
    }

    async fn send(&self, cmd: SchedulerCommand) -> RecalcResult<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| RecalcError::ChannelError("Scheduler channel closed".into()))
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Recalculation scheduler, before it is started.
pub struct RecalcScheduler {
    engine: Arc<dyn PricingEngine>,
    config: RecalcConfig,
}

impl RecalcScheduler {
    /// Creates a scheduler around an engine.
    pub fn new(engine: Arc<dyn PricingEngine>, config: RecalcConfig) -> Self {
        RecalcScheduler { engine, config }
    }

    /// Creates a scheduler around the in-process engine.
    pub fn local(config: RecalcConfig) -> Self {
        Self::new(Arc::new(LocalEngine), config)
    }

    /// Starts the scheduler task and returns a handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let capacity = self.config.channel_capacity().max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
        let (view_tx, view_rx) = watch::channel(PricingView::default());
        let (publish_tx, _) = broadcast::channel(capacity);

        let actor = SchedulerActor {
            engine: self.engine,
            debounce: self.config.debounce(),
            compute_timeout: self.config.compute_timeout(),
            in_flight: None,
            pending: None,
            debounce_deadline: None,
            answered: None,
            last_good: None,
            last_error: None,
            closing: false,
            stats: SchedulerStats::default(),
            tasks: JoinSet::new(),
            view_tx,
            publish_tx: publish_tx.clone(),
        };

        tokio::spawn(actor.run(cmd_rx));

        SchedulerHandle {
            cmd_tx,
            view_rx,
            publish_tx,
            sent: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Task-owned scheduler state. Nothing here is shared.
struct SchedulerActor {
    engine: Arc<dyn PricingEngine>,
    debounce: Option<Duration>,
    compute_timeout: Option<Duration>,
    /// Input being computed.
    in_flight: Option<(InputSignature, Cart)>,
    /// Newest input not yet started.
    pending: Option<(InputSignature, Cart)>,
    /// Set only while idle with a pending input.
    debounce_deadline: Option<Instant>,
    /// Input of the latest publication.
    answered: Option<(InputSignature, Cart)>,
    last_good: Option<PricedSnapshot>,
    last_error: Option<FailedSnapshot>,
    closing: bool,
    stats: SchedulerStats,
    tasks: JoinSet<ComputeResult>,
    view_tx: watch::Sender<PricingView>,
    publish_tx: broadcast::Sender<Publication>,
}

impl SchedulerActor {
    /// Main scheduler loop.
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<SchedulerCommand>) {
        info!(
            engine = self.engine.name(),
            debounce_ms = self.debounce.map(|d| d.as_millis() as u64).unwrap_or(0),
            compute_timeout_ms = ?self.compute_timeout.map(|d| d.as_millis() as u64),
            "Recalculation scheduler started"
        );

        let mut accepting = true;

        loop {
            let computing = !self.tasks.is_empty();
            let deadline = self.debounce_deadline;

            tokio::select! {
                cmd = cmd_rx.recv(), if accepting => match cmd {
                    Some(SchedulerCommand::Submit { signature, cart }) => {
                        self.handle_submit(signature, cart);
                    }
                    Some(SchedulerCommand::Retrigger) => self.handle_retrigger(),
                    Some(SchedulerCommand::Close) => self.begin_close(),
                    Some(SchedulerCommand::Shutdown) => {
                        info!(stats = ?self.stats, "Recalculation scheduler shutting down");
                        self.tasks.abort_all();
                        self.in_flight = None;
                        self.pending = None;
                        self.debounce_deadline = None;
                        self.refresh_view();
                        break;
                    }
                    None => {
                        accepting = false;
                        self.begin_close();
                    }
                },
                Some(joined) = self.tasks.join_next(), if computing => {
                    self.handle_completion(joined);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.debounce_deadline = None;
                    self.start_pending();
                }
                else => break,
            }

            self.refresh_view();

            if self.closing && self.in_flight.is_none() && self.pending.is_none() {
                info!(stats = ?self.stats, "Recalculation scheduler drained and stopped");
                break;
            }
        }
    }

    fn handle_submit(&mut self, signature: InputSignature, cart: Cart) {
        self.stats.submissions += 1;

        if self.closing {
            warn!(signature = %signature.short(), "Scheduler closing, submission ignored");
            return;
        }

        if self.requested() == Some(&signature) {
            self.stats.duplicates_skipped += 1;
            debug!(signature = %signature.short(), "Signature unchanged, skipping");
            return;
        }

        // Back to the input that is computing, or to the last successful
        // answer: the queued input is stale and nothing new needs to run.
        let current = match &self.in_flight {
            Some((sig, _)) => sig == &signature,
            None => self.answered_successfully(&signature),
        };
        if current {
            debug!(signature = %signature.short(), "Reverted to current signature, dropping queued input");
            self.pending = None;
            self.debounce_deadline = None;
            return;
        }

        debug!(
            signature = %signature.short(),
            cart_id = %cart.id(),
            items = cart.item_count(),
            "New input signature"
        );
        self.pending = Some((signature, cart));

        if self.in_flight.is_some() {
            // Starts when the current computation completes.
            return;
        }

        match self.debounce {
            Some(quiet) => self.debounce_deadline = Some(Instant::now() + quiet),
            None => self.start_pending(),
        }
    }

    fn handle_retrigger(&mut self) {
        self.stats.retriggers += 1;

        if self.in_flight.is_some() {
            debug!("Retrigger ignored while computing");
            return;
        }

        if self.pending.is_some() {
            self.debounce_deadline = None;
            self.start_pending();
            return;
        }

        match self.answered.clone() {
            Some((signature, cart)) => {
                info!(signature = %signature.short(), "Retriggering price computation");
                self.start(signature, cart);
            }
            None => debug!("Nothing to retrigger"),
        }
    }

    fn begin_close(&mut self) {
        self.closing = true;
        if self.debounce_deadline.take().is_some() {
            self.start_pending();
        }
    }

    fn handle_completion(&mut self, joined: Result<ComputeResult, JoinError>) {
        let Some((signature, cart)) = self.in_flight.take() else {
            warn!("Computation finished with nothing in flight");
            return;
        };

        let result = joined.unwrap_or_else(|e| Err(ComputeError::Aborted(e.to_string())));

        if let Some((next, _)) = &self.pending {
            self.stats.superseded += 1;
            debug!(discarded = %signature.short(), "Discarding superseded result");

            if self.answered_successfully(next) {
                debug!(signature = %next.short(), "Queued input matches latest publication");
                self.pending = None;
            } else {
                self.start_pending();
            }
            return;
        }

        self.publish(signature, cart, result);
    }

    fn start_pending(&mut self) {
        if let Some((signature, cart)) = self.pending.take() {
            self.start(signature, cart);
        }
    }

    fn start(&mut self, signature: InputSignature, cart: Cart) {
        self.stats.computations_started += 1;
        debug!(signature = %signature.short(), "Starting price computation");

        let engine = Arc::clone(&self.engine);
        let timeout = self.compute_timeout;
        let snapshot = cart.clone();
        self.tasks.spawn(run_engine(engine, snapshot, timeout));

        self.in_flight = Some((signature, cart));
    }

    fn publish(&mut self, signature: InputSignature, cart: Cart, result: ComputeResult) {
        let published_at = Utc::now();

        match &result {
            Ok(breakdown) => {
                self.stats.published += 1;
                info!(
                    signature = %signature.short(),
                    total = %breakdown.total,
                    lines = breakdown.lines.len(),
                    "Published price breakdown"
                );
                self.last_good = Some(PricedSnapshot {
                    signature: signature.clone(),
                    breakdown: breakdown.clone(),
                    published_at,
                });
                self.last_error = None;
            }
            Err(error) => {
                self.stats.failed += 1;
                warn!(
                    signature = %signature.short(),
                    %error,
                    retryable = error.is_retryable(),
                    "Price computation failed"
                );
                self.last_error = Some(FailedSnapshot {
                    signature: signature.clone(),
                    error: error.clone(),
                    published_at,
                });
            }
        }

        self.answered = Some((signature.clone(), cart));

        let publication = Publication {
            signature,
            result,
            published_at,
        };
        if self.publish_tx.send(publication).is_err() {
            debug!("No publication subscribers");
        }
    }

    /// Whether the latest publication is a success for `signature`.
    fn answered_successfully(&self, signature: &InputSignature) -> bool {
        let answered = self.answered.as_ref().map(|(sig, _)| sig) == Some(signature);
        let failed = self.last_error.as_ref().map(|e| &e.signature) == Some(signature);
        answered && !failed
    }

    /// Latest signature the collaborator asked for.
    fn requested(&self) -> Option<&InputSignature> {
        self.pending
            .as_ref()
            .or(self.in_flight.as_ref())
            .or(self.answered.as_ref())
            .map(|(sig, _)| sig)
    }

    fn state(&self) -> SchedulerState {
        if self.in_flight.is_some() {
            SchedulerState::Computing
        } else if self.debounce_deadline.is_some() {
            SchedulerState::Debouncing
        } else {
            SchedulerState::Idle
        }
    }

    fn refresh_view(&self) {
        self.view_tx.send_replace(PricingView {
            state: self.state(),
            requested: self.requested().cloned(),
            answered: self.answered.as_ref().map(|(sig, _)| sig.clone()),
            last_good: self.last_good.clone(),
            last_error: self.last_error.clone(),
            stats: self.stats,
        });
    }
}

/// Runs one computation, bounded by the compute timeout.
async fn run_engine(
    engine: Arc<dyn PricingEngine>,
    cart: Cart,
    timeout: Option<Duration>,
) -> ComputeResult {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, engine.compute(cart)).await {
            Ok(result) => result,
            Err(_) => Err(ComputeError::Timeout(
                u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            )),
        },
        None => engine.compute(cart).await,
    }
}
