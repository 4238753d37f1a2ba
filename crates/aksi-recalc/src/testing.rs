//! Test engines and fixtures shared by the scheduler and stream tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use aksi_core::{
    compute_breakdown, Cart, CatalogItem, CategoryCode, GlobalModifiers, InMemoryCatalog,
    LineItem, Money, PriceBreakdown,
};
use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};

use crate::engine::PricingEngine;
use crate::error::ComputeError;

/// A one-line cart priced at 100.00 per unit.
pub fn cart_with_quantity(quantity: i64) -> Cart {
    let catalog = InMemoryCatalog::new()
        .with_item(CatalogItem {
            id: "coat".to_string(),
            name: "Wool coat".to_string(),
            unit_price: Money::from_minor(10000),
            category: CategoryCode::ClothingCleaning,
        })
        .unwrap();
    let item = LineItem::resolve(&catalog, "l1", "coat", quantity, &[]).unwrap();
    Cart::from_parts("order-1", [item], GlobalModifiers::default()).unwrap()
}

/// Answers immediately; can be told to fail or panic.
#[derive(Default)]
pub struct CountingEngine {
    calls: AtomicUsize,
    failure: Mutex<Option<ComputeError>>,
    panic_next: AtomicBool,
}

impl CountingEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, failure: Option<ComputeError>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PricingEngine for CountingEngine {
    async fn compute(&self, cart: Cart) -> Result<PriceBreakdown, ComputeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("engine exploded");
        }
        if let Some(failure) = self.failure.lock().unwrap().clone() {
            return Err(failure);
        }
        Ok(compute_breakdown(&cart))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Blocks every computation until the test releases a permit.
pub struct GatedEngine {
    gate: Semaphore,
    started: Mutex<Vec<i64>>,
    started_tx: mpsc::UnboundedSender<i64>,
    started_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<i64>>,
}

impl GatedEngine {
    pub fn new() -> Self {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        GatedEngine {
            gate: Semaphore::new(0),
            started: Mutex::new(Vec::new()),
            started_tx,
            started_rx: tokio::sync::Mutex::new(started_rx),
        }
    }

    /// Lets `n` computations finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Waits for the next computation to start; returns its quantity.
    pub async fn next_started(&self) -> i64 {
        self.started_rx.lock().await.recv().await.unwrap()
    }

    /// Quantities of every computation started so far.
    pub fn started_quantities(&self) -> Vec<i64> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl PricingEngine for GatedEngine {
    async fn compute(&self, cart: Cart) -> Result<PriceBreakdown, ComputeError> {
        let quantity = cart.total_quantity();
        self.started.lock().unwrap().push(quantity);
        let _ = self.started_tx.send(quantity);

        self.gate.acquire().await.unwrap().forget();
        Ok(compute_breakdown(&cart))
    }

    fn name(&self) -> &str {
        "gated"
    }
}
