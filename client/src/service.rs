//! HTTP client for the Listing Service.

use std::future::Future;

use loppis_common::category::Category;
use loppis_common::listing::{Listing, ListingId, ListingStatus, ListingUpdate, NewListing};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ServiceError;

/// What the checkout driver needs from a listing backend.
///
/// Futures are `Send` so a fetch can run on a spawned task.
pub trait ListingSource: Clone + Send + Sync + 'static {
    fn fetch_listings(&self) -> impl Future<Output = Result<Vec<Listing>, ServiceError>> + Send;

    fn set_status(
        &self,
        id: ListingId,
        status: ListingStatus,
    ) -> impl Future<Output = Result<Listing, ServiceError>> + Send;
}

/// Client for the Listing Service REST API.
#[derive(Debug, Clone)]
pub struct ListingService {
    config: ClientConfig,
    http: Client,
}

impl ListingService {
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built (TLS backend init).
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// `GET /listings/`. One request, no retry.
    pub async fn list_listings(&self) -> Result<Vec<Listing>, ServiceError> {
        let path = "/listings/";
        self.send_json(self.http.get(self.url(path)), path).await
    }

    /// `GET /listings/{id}`.
    pub async fn get_listing(&self, id: ListingId) -> Result<Listing, ServiceError> {
        let path = format!("/listings/{id}");
        self.send_json(self.http.get(self.url(&path)), &path).await
    }

    /// `POST /listings/` with a JSON body. Returns the stored listing.
    pub async fn create_listing(&self, listing: &NewListing) -> Result<Listing, ServiceError> {
        let path = "/listings/";
        self.send_json(self.http.post(self.url(path)).json(listing), path)
            .await
    }

    /// `PUT /listings/{id}` with the fields present in `update`.
    pub async fn update_listing(&self, id: ListingId, update: &ListingUpdate) -> Result<Listing, ServiceError> {
        let path = format!("/listings/{id}");
        self.send_json(self.http.put(self.url(&path)).json(update), &path)
            .await
    }

    /// `DELETE /listings/{id}`.
    pub async fn delete_listing(&self, id: ListingId) -> Result<(), ServiceError> {
        let path = format!("/listings/{id}");
        tracing::debug!(%path, "DELETE");
        let response = self.http.delete(self.url(&path)).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// `GET /categories/`, the full category forest.
    pub async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        let path = "/categories/";
        self.send_json(self.http.get(self.url(path)), path).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ServiceError> {
        tracing::debug!(%path, "listing service request");
        let response = check_status(request.send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ServiceError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, %body, "listing service error");
    Err(ServiceError::Status { status, body })
}

impl ListingSource for ListingService {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, ServiceError> {
        self.list_listings().await
    }

    async fn set_status(&self, id: ListingId, status: ListingStatus) -> Result<Listing, ServiceError> {
        self.update_listing(id, &ListingUpdate::status(status)).await
    }
}
