//! # Pricing Engine
//!
//! The seam between the scheduler and whatever actually prices a cart.
//! [`LocalEngine`] runs [`compute_breakdown`] in-process. A remote price
//! calculator is plugged in by implementing [`PricingEngine`] and mapping its
//! transport failures onto [`ComputeError`].

use async_trait::async_trait;

use aksi_core::{compute_breakdown, Cart, PriceBreakdown};

use crate::error::ComputeError;

/// Prices a cart snapshot.
#[async_trait]
pub trait PricingEngine: Send + Sync {
    async fn compute(&self, cart: Cart) -> Result<PriceBreakdown, ComputeError>;

    /// Engine name for log lines.
    fn name(&self) -> &str {
        "engine"
    }
}

/// In-process engine backed by the pure calculation algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalEngine;

#[async_trait]
impl PricingEngine for LocalEngine {
    async fn compute(&self, cart: Cart) -> Result<PriceBreakdown, ComputeError> {
        Ok(compute_breakdown(&cart))
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_engine_matches_algorithm() {
        let cart = Cart::with_id("empty");
        let breakdown = LocalEngine.compute(cart.clone()).await.unwrap();
        assert_eq!(breakdown, compute_breakdown(&cart));
        assert_eq!(LocalEngine.name(), "local");
    }
}
