pub mod cart;
pub mod catalog;
pub mod category;
pub mod checkout;
pub mod currency;
pub mod delivery;
pub mod favorites;
pub mod listing;
pub mod location;
pub mod order;
pub mod payment;

pub use catalog::{Catalog, CategoryFilter, ListingFilter};
pub use checkout::{CheckoutAction, CheckoutError, CheckoutState, CheckoutStep, ContactForm};
pub use listing::{Listing, ListingId, ListingStatus, UserId};
