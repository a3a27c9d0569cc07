//! Runs a checkout session against real collaborators.
//!
//! The reducer in `loppis_common::checkout` stays pure; this is where the
//! catalog fetch, the payment charge and the sold-status write happen.

use chrono::Utc;
use loppis_common::checkout::{CheckoutAction, CheckoutError, CheckoutState, CheckoutStep};
use loppis_common::listing::UserId;
use loppis_common::order::Order;
use loppis_common::payment::{PaymentBackend, PaymentError};

use crate::fetch::CatalogFetch;
use crate::service::ListingSource;

pub struct CheckoutDriver<S, P> {
    source: S,
    payment: P,
    state: CheckoutState,
}

impl<S: ListingSource, P: PaymentBackend> CheckoutDriver<S, P> {
    pub fn new(source: S, payment: P, viewer: Option<UserId>) -> Self {
        Self {
            source,
            payment,
            state: CheckoutState::new(viewer),
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn payment_mut(&mut self) -> &mut P {
        &mut self.payment
    }

    /// Feed one action through the reducer.
    pub fn dispatch(&mut self, action: CheckoutAction) -> &CheckoutState {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(action);
        &self.state
    }

    /// Request a fresh catalog and start fetching it in the background.
    ///
    /// Feed [`CatalogFetch::finish`] or [`CatalogFetch::abandon`] back
    /// through [`dispatch`](Self::dispatch).
    pub fn start_catalog_fetch(&mut self) -> Option<CatalogFetch> {
        let ticket = self.dispatch(CheckoutAction::CatalogRequested).pending_fetch?;
        let source = self.source.clone();
        Some(CatalogFetch::spawn(ticket, async move { source.fetch_listings().await }))
    }

    /// Fetch the catalog and wait for it. A failure ends up as browse error text.
    pub async fn load_catalog(&mut self) -> &CheckoutState {
        match self.start_catalog_fetch() {
            Some(fetch) => {
                let action = fetch.finish().await;
                self.dispatch(action)
            }
            None => &self.state,
        }
    }

    /// Charge the draft's amount and record the outcome.
    ///
    /// On success the listing is marked sold locally and then on the
    /// service (see [`sync_sold`](Self::sync_sold)).
    ///
    /// # Errors
    ///
    /// Nothing is charged unless the session is at the payment step.
    pub async fn pay(&mut self) -> Result<&CheckoutState, CheckoutError> {
        let step = self.state.step;
        let listing_id = match self.state.draft.listing_id {
            Some(id) if step == CheckoutStep::Payment => id,
            _ => {
                return Err(CheckoutError::InvalidAction {
                    step,
                    action: "paying",
                })
            }
        };
        let amount = self.state.draft.amount_sek;

        tracing::info!(%listing_id, amount, backend = self.payment.backend_name(), "charging");
        match self.payment.charge(listing_id, amount).await {
            Ok(receipt) => {
                tracing::info!(%listing_id, order_id = %receipt.order_id, "payment completed");
                self.dispatch(CheckoutAction::PaymentCompleted(receipt));
                if self.state.step == CheckoutStep::Confirmation {
                    self.sync_sold().await;
                }
            }
            Err(e) => {
                tracing::warn!(%listing_id, error = %e, "payment failed");
                let reason = match e {
                    PaymentError::Declined(reason) => reason,
                    unavailable @ PaymentError::Unavailable(_) => unavailable.to_string(),
                };
                self.dispatch(CheckoutAction::PaymentFailed(reason));
            }
        }
        Ok(&self.state)
    }

    /// Write pending overlay statuses to the service.
    ///
    /// Failures are logged and the entry stays pending for the next call.
    /// Returns how many entries were accepted.
    pub async fn sync_sold(&mut self) -> usize {
        let mut synced = 0;
        for (id, status) in self.state.catalog.pending_sync() {
            match self.source.set_status(id, status).await {
                Ok(_) => {
                    tracing::debug!(listing_id = %id, %status, "status synced");
                    self.state.catalog.mark_synced(id);
                    synced += 1;
                }
                Err(e) => {
                    tracing::warn!(listing_id = %id, %status, error = %e, "failed to sync listing status");
                }
            }
        }
        synced
    }

    /// The placed order, once the session reached confirmation.
    pub fn order(&self) -> Option<Order> {
        self.state.order(Utc::now())
    }
}
