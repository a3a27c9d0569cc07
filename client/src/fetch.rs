use std::future::Future;

use loppis_common::checkout::{CheckoutAction, FetchTicket};
use loppis_common::listing::Listing;
use tokio::task::JoinHandle;

use crate::error::ServiceError;

/// An in-flight catalog fetch. Dropping it aborts the request.
#[derive(Debug)]
pub struct CatalogFetch {
    ticket: FetchTicket,
    handle: JoinHandle<Result<Vec<Listing>, ServiceError>>,
}

impl CatalogFetch {
    /// Run `fetch` on the tokio runtime under `ticket`.
    pub fn spawn<F>(ticket: FetchTicket, fetch: F) -> Self
    where
        F: Future<Output = Result<Vec<Listing>, ServiceError>> + Send + 'static,
    {
        Self {
            ticket,
            handle: tokio::spawn(fetch),
        }
    }

    pub fn ticket(&self) -> FetchTicket {
        self.ticket
    }

    /// Wait for the fetch and turn it into the action the reducer expects.
    pub async fn finish(mut self) -> CheckoutAction {
        let outcome = match (&mut self.handle).await {
            Ok(Ok(listings)) => {
                tracing::debug!(count = listings.len(), ticket = self.ticket.0, "catalog fetched");
                Ok(listings)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, ticket = self.ticket.0, "catalog fetch failed");
                Err(format!("could not load listings: {e}"))
            }
            Err(e) if e.is_cancelled() => Err("loading listings was cancelled".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, ticket = self.ticket.0, "catalog fetch task failed");
                Err("could not load listings".to_string())
            }
        };
        CheckoutAction::CatalogFetched {
            ticket: self.ticket,
            outcome,
        }
    }

    /// Abort the fetch. The returned action drops the pending ticket.
    pub fn abandon(self) -> CheckoutAction {
        tracing::debug!(ticket = self.ticket.0, "catalog fetch abandoned");
        CheckoutAction::CatalogAbandoned
    }
}

impl Drop for CatalogFetch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
