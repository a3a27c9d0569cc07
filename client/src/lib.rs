//! Listing Service client, local store and checkout driver.

pub mod auth;
pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod service;
pub mod store;

pub use config::ClientConfig;
pub use driver::CheckoutDriver;
pub use error::{ConfigError, ServiceError, StoreError};
pub use fetch::CatalogFetch;
pub use service::{ListingService, ListingSource};
pub use store::LocalStore;
