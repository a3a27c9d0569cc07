use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::listing::ListingId;
use crate::order::OrderId;

/// Receipt returned after a successful charge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub listing_id: ListingId,
    /// Amount charged, whole kronor.
    pub amount_sek: u64,
}

/// Errors from payment backends. Display text is shown to the buyer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Abstraction over payment providers.
///
/// A real integration maps its outcome onto the checkout's
/// `PaymentCompleted` / `PaymentFailed` actions.
#[allow(async_fn_in_trait)]
pub trait PaymentBackend {
    /// Charge `amount_sek` for `listing_id`.
    async fn charge(&mut self, listing_id: ListingId, amount_sek: u64) -> Result<PaymentReceipt, PaymentError>;

    /// Human-readable backend name (e.g. "simulated").
    fn backend_name(&self) -> &str;
}

/// Local stand-in for a payment provider. Succeeds unless told to decline.
#[derive(Debug)]
pub struct SimulatedPayment {
    rng: StdRng,
    issued: BTreeSet<OrderId>,
    decline_next: Option<String>,
}

impl SimulatedPayment {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic ids for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            issued: BTreeSet::new(),
            decline_next: None,
        }
    }

    /// Make the next charge fail with `reason`.
    pub fn decline_next(&mut self, reason: impl Into<String>) {
        self.decline_next = Some(reason.into());
    }

    /// Order ids issued so far in this session.
    pub fn issued(&self) -> &BTreeSet<OrderId> {
        &self.issued
    }

    fn next_order_id(&mut self) -> OrderId {
        loop {
            let id = OrderId::generate(&mut self.rng);
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}

impl Default for SimulatedPayment {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentBackend for SimulatedPayment {
    async fn charge(&mut self, listing_id: ListingId, amount_sek: u64) -> Result<PaymentReceipt, PaymentError> {
        if let Some(reason) = self.decline_next.take() {
            tracing::debug!(%listing_id, %reason, "simulated payment declined");
            return Err(PaymentError::Declined(reason));
        }
        let order_id = self.next_order_id();
        tracing::debug!(%listing_id, %order_id, amount_sek, "simulated payment accepted");
        Ok(PaymentReceipt {
            order_id,
            listing_id,
            amount_sek,
        })
    }

    fn backend_name(&self) -> &str {
        "simulated"
    }
}
