//! The buyer's checkout flow as a pure reducer.
//!
//! [`CheckoutState::reduce`] takes the current state and one
//! [`CheckoutAction`] and returns the next state. Nothing here performs I/O:
//! catalog fetches and payment charges happen elsewhere and are fed back in
//! as actions.
//!
//! ```text
//! Browsing ─select─▶ ListingDetail ─buy─▶ Delivery ─continue─▶ Contact ─submit─▶ Payment ─paid─▶ Confirmation
//!                                                                                 │  ▲
//!                                                                          failed ▼  │ retry
//!                                                                            PaymentFailed
//! ```

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ListingFilter};
use crate::delivery::{validate_pickup_message, DeliveryType, PickupRequest, ShippingProvider};
use crate::listing::{Listing, ListingId, UserId};
use crate::order::{Order, OrderDraft};
use crate::payment::PaymentReceipt;

/// Wizard steps, with `Browsing` as the implicit pre-state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckoutStep {
    #[default]
    Browsing,
    ListingDetail,
    Delivery,
    Contact,
    Payment,
    PaymentFailed,
    Confirmation,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutStep::Browsing => "browsing",
            CheckoutStep::ListingDetail => "listing detail",
            CheckoutStep::Delivery => "delivery",
            CheckoutStep::Contact => "contact",
            CheckoutStep::Payment => "payment",
            CheckoutStep::PaymentFailed => "payment failed",
            CheckoutStep::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

/// Identifies one catalog fetch. Results carrying a stale ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(pub u64);

/// Outcome of the last catalog fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogLoad {
    #[default]
    NotLoaded,
    Loaded,
    /// User-visible error text.
    Failed(String),
}

/// Raw contact/address form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Contact form fields, for field-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactField {
    Name,
    Email,
    Address,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactField::Name => write!(f, "name"),
            ContactField::Email => write!(f, "email"),
            ContactField::Address => write!(f, "address"),
        }
    }
}

/// One rejected contact field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ContactError {
    pub field: ContactField,
    pub message: String,
}

impl ContactForm {
    /// Every failing field is reported, in form order.
    pub fn validate(&self) -> Result<(), Vec<ContactError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ContactError::new(ContactField::Name, "is required"));
        }
        let email = self.email.trim();
        if email.is_empty() {
            errors.push(ContactError::new(ContactField::Email, "is required"));
        } else if !looks_like_email(email) {
            errors.push(ContactError::new(ContactField::Email, "is not a valid email address"));
        }
        if self.address.trim().is_empty() {
            errors.push(ContactError::new(ContactField::Address, "is required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ContactError {
    fn new(field: ContactField, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'))
}

fn describe_fields(errors: &[ContactError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Why an action was rejected (or, for payment, why it failed).
///
/// The `Display` text is meant for the buyer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("no listing selected")]
    NoSelection,
    #[error("listing {0} was not found")]
    ListingNotFound(ListingId),
    #[error("this item is sold")]
    ListingSold,
    #[error("you cannot buy your own listing")]
    OwnListing,
    #[error("choose a shipping provider to continue")]
    MissingShippingProvider,
    #[error("a shipping provider can only be chosen for fixed shipping")]
    ProviderRequiresShipping,
    #[error("pickup requests are only available for pickup delivery")]
    PickupRequiresPickup,
    #[error("message is {len} characters long; the limit is {max}")]
    PickupMessageTooLong { len: usize, max: usize },
    #[error("{}", describe_fields(.0))]
    InvalidContact(Vec<ContactError>),
    #[error("payment failed: {0}")]
    PaymentFailed(String),
    #[error("payment receipt has no order id")]
    EmptyOrderId,
    #[error("payment receipt is for listing {got}, not {expected}")]
    ReceiptListingMismatch { expected: ListingId, got: ListingId },
    #[error("charged {charged} SEK but the order is for {expected} SEK")]
    AmountMismatch { expected: u64, charged: u64 },
    #[error("{action} is not available at the {step} step")]
    InvalidAction { step: CheckoutStep, action: &'static str },
}

impl CheckoutError {
    /// Field-level errors, when the contact form was rejected.
    pub fn field_errors(&self) -> &[ContactError] {
        match self {
            CheckoutError::InvalidContact(errors) => errors,
            _ => &[],
        }
    }
}

/// Everything that can happen to a checkout session.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutAction {
    CatalogRequested,
    CatalogFetched {
        ticket: FetchTicket,
        outcome: Result<Vec<Listing>, String>,
    },
    /// The view waiting on the fetch went away; a late result must be dropped.
    CatalogAbandoned,
    SelectListing(ListingId),
    BuyNow,
    ChooseDelivery(DeliveryType),
    ChooseProvider(ShippingProvider),
    EditPickupMessage(String),
    SubmitPickupRequest,
    DismissPickupAck,
    ContinueToContact,
    SubmitContact(ContactForm),
    PaymentCompleted(PaymentReceipt),
    PaymentFailed(String),
    RetryPayment,
    Back,
    Reset,
}

impl CheckoutAction {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutAction::CatalogRequested => "loading listings",
            CheckoutAction::CatalogFetched { .. } => "receiving listings",
            CheckoutAction::CatalogAbandoned => "abandoning the listing fetch",
            CheckoutAction::SelectListing(_) => "selecting a listing",
            CheckoutAction::BuyNow => "buy now",
            CheckoutAction::ChooseDelivery(_) => "choosing delivery",
            CheckoutAction::ChooseProvider(_) => "choosing a shipping provider",
            CheckoutAction::EditPickupMessage(_) => "editing the pickup message",
            CheckoutAction::SubmitPickupRequest => "sending a pickup request",
            CheckoutAction::DismissPickupAck => "dismissing the pickup notice",
            CheckoutAction::ContinueToContact => "continuing to contact details",
            CheckoutAction::SubmitContact(_) => "submitting contact details",
            CheckoutAction::PaymentCompleted(_) => "completing payment",
            CheckoutAction::PaymentFailed(_) => "failing payment",
            CheckoutAction::RetryPayment => "retrying payment",
            CheckoutAction::Back => "going back",
            CheckoutAction::Reset => "starting over",
        }
    }
}

/// What the browsing view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseView<'a> {
    pub listings: Vec<Cow<'a, Listing>>,
    pub loading: bool,
    pub error: Option<&'a str>,
}

/// How an accepted action affected the state.
enum Applied {
    Changed,
    /// Catalog bookkeeping; the current step's error is left alone.
    Background,
    /// Accepted, but the result is an error the buyer must see.
    Surfaced(CheckoutError),
    /// Dropped without effect (stale fetch result).
    Ignored,
}

/// Complete state of one buyer session: catalog plus the checkout wizard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutState {
    /// The signed-in user, if any. Used for the own-listing guard.
    pub viewer: Option<UserId>,
    pub catalog: Catalog,
    pub catalog_load: CatalogLoad,
    pub pending_fetch: Option<FetchTicket>,
    next_ticket: u64,
    pub step: CheckoutStep,
    pub draft: OrderDraft,
    pub pickup: PickupRequest,
    /// Inline error text for the current step.
    pub error: Option<CheckoutError>,
}

impl CheckoutState {
    pub fn new(viewer: Option<UserId>) -> Self {
        Self {
            viewer,
            ..Self::default()
        }
    }

    /// A session over an already fetched catalog.
    pub fn with_catalog(viewer: Option<UserId>, listings: Vec<Listing>) -> Self {
        Self {
            viewer,
            catalog: Catalog::new(listings),
            catalog_load: CatalogLoad::Loaded,
            ..Self::default()
        }
    }

    /// Apply one action. Rejected actions leave everything but `error` untouched.
    pub fn reduce(mut self, action: CheckoutAction) -> Self {
        let from = self.step;
        let name = action.name();
        match self.apply(action) {
            Ok(Applied::Changed) => {
                tracing::debug!(%from, to = %self.step, action = name, "checkout transition");
                self.error = None;
            }
            Ok(Applied::Surfaced(err)) => {
                tracing::debug!(%from, to = %self.step, action = name, error = %err, "checkout transition with error");
                self.error = Some(err);
            }
            Ok(Applied::Background) => {
                tracing::debug!(step = %from, action = name, "catalog update");
            }
            Ok(Applied::Ignored) => {
                tracing::debug!(step = %from, action = name, "checkout action ignored");
            }
            Err(err) => {
                tracing::debug!(step = %from, action = name, error = %err, "checkout action rejected");
                self.error = Some(err);
            }
        }
        self
    }

    fn apply(&mut self, action: CheckoutAction) -> Result<Applied, CheckoutError> {
        use CheckoutStep as S;

        let step = self.step;
        let invalid = |action: &CheckoutAction| CheckoutError::InvalidAction {
            step,
            action: action.name(),
        };

        match action {
            CheckoutAction::CatalogRequested => {
                let ticket = FetchTicket(self.next_ticket);
                self.next_ticket += 1;
                self.pending_fetch = Some(ticket);
                Ok(Applied::Background)
            }
            CheckoutAction::CatalogFetched { ticket, outcome } => {
                if self.pending_fetch != Some(ticket) {
                    return Ok(Applied::Ignored);
                }
                self.pending_fetch = None;
                match outcome {
                    Ok(listings) => {
                        self.catalog.replace(listings);
                        self.catalog_load = CatalogLoad::Loaded;
                    }
                    Err(message) => self.catalog_load = CatalogLoad::Failed(message),
                }
                Ok(Applied::Background)
            }
            CheckoutAction::CatalogAbandoned => {
                self.pending_fetch = None;
                Ok(Applied::Background)
            }

            CheckoutAction::SelectListing(id) => {
                if step == S::Confirmation {
                    return Err(invalid(&CheckoutAction::SelectListing(id)));
                }
                let listing = self.catalog.get(id).ok_or(CheckoutError::ListingNotFound(id))?;
                self.draft = OrderDraft::for_listing(&listing);
                self.pickup = PickupRequest::default();
                self.step = S::ListingDetail;
                Ok(Applied::Changed)
            }
            CheckoutAction::BuyNow => {
                if step != S::ListingDetail {
                    return Err(invalid(&CheckoutAction::BuyNow));
                }
                let id = self.draft.listing_id.ok_or(CheckoutError::NoSelection)?;
                let listing = self.catalog.get(id).ok_or(CheckoutError::ListingNotFound(id))?;
                if let Some(blocker) = buy_blocker(&listing, self.viewer) {
                    return Err(blocker);
                }
                self.step = S::Delivery;
                Ok(Applied::Changed)
            }

            CheckoutAction::ChooseDelivery(delivery_type) => {
                if step != S::Delivery {
                    return Err(invalid(&CheckoutAction::ChooseDelivery(delivery_type)));
                }
                self.draft.set_delivery_type(delivery_type);
                self.pickup.acknowledged = false;
                Ok(Applied::Changed)
            }
            CheckoutAction::ChooseProvider(provider) => {
                if step != S::Delivery {
                    return Err(invalid(&CheckoutAction::ChooseProvider(provider)));
                }
                if self.draft.delivery_type != DeliveryType::Flat {
                    return Err(CheckoutError::ProviderRequiresShipping);
                }
                self.draft.shipping_provider = Some(provider);
                Ok(Applied::Changed)
            }
            CheckoutAction::EditPickupMessage(text) => {
                if step != S::Delivery {
                    return Err(invalid(&CheckoutAction::EditPickupMessage(text)));
                }
                if self.draft.delivery_type != DeliveryType::Pickup {
                    return Err(CheckoutError::PickupRequiresPickup);
                }
                self.pickup.message = text;
                Ok(Applied::Changed)
            }
            CheckoutAction::SubmitPickupRequest => {
                if step != S::Delivery {
                    return Err(invalid(&CheckoutAction::SubmitPickupRequest));
                }
                if self.draft.delivery_type != DeliveryType::Pickup {
                    return Err(CheckoutError::PickupRequiresPickup);
                }
                validate_pickup_message(&self.pickup.message)?;
                let message = std::mem::take(&mut self.pickup.message);
                let trimmed = message.trim();
                if !trimmed.is_empty() {
                    self.draft.message = Some(trimmed.to_string());
                }
                self.pickup.acknowledged = true;
                Ok(Applied::Changed)
            }
            CheckoutAction::DismissPickupAck => {
                self.pickup.acknowledged = false;
                Ok(Applied::Changed)
            }
            CheckoutAction::ContinueToContact => {
                if step != S::Delivery {
                    return Err(invalid(&CheckoutAction::ContinueToContact));
                }
                if !self.draft.delivery_complete() {
                    return Err(CheckoutError::MissingShippingProvider);
                }
                self.step = S::Contact;
                Ok(Applied::Changed)
            }

            CheckoutAction::SubmitContact(form) => {
                if step != S::Contact {
                    return Err(invalid(&CheckoutAction::SubmitContact(form)));
                }
                form.validate().map_err(CheckoutError::InvalidContact)?;
                self.draft.name = Some(form.name.trim().to_string());
                self.draft.email = Some(form.email.trim().to_string());
                self.draft.address = match self.draft.delivery_type {
                    DeliveryType::Flat => Some(form.address.trim().to_string()),
                    DeliveryType::Pickup => None,
                };
                self.step = S::Payment;
                Ok(Applied::Changed)
            }

            CheckoutAction::PaymentCompleted(receipt) => {
                if step != S::Payment {
                    return Err(invalid(&CheckoutAction::PaymentCompleted(receipt)));
                }
                let listing_id = self.draft.listing_id.ok_or(CheckoutError::NoSelection)?;
                if receipt.order_id.is_empty() {
                    return Err(CheckoutError::EmptyOrderId);
                }
                if receipt.listing_id != listing_id {
                    return Err(CheckoutError::ReceiptListingMismatch {
                        expected: listing_id,
                        got: receipt.listing_id,
                    });
                }
                if receipt.amount_sek != self.draft.amount_sek {
                    return Err(CheckoutError::AmountMismatch {
                        expected: self.draft.amount_sek,
                        charged: receipt.amount_sek,
                    });
                }
                if !self.catalog.mark_sold(listing_id) {
                    tracing::warn!(%listing_id, "paid listing no longer in catalog");
                }
                self.draft.order_id = Some(receipt.order_id);
                self.step = S::Confirmation;
                Ok(Applied::Changed)
            }
            CheckoutAction::PaymentFailed(reason) => {
                if step != S::Payment {
                    return Err(invalid(&CheckoutAction::PaymentFailed(reason)));
                }
                self.step = S::PaymentFailed;
                Ok(Applied::Surfaced(CheckoutError::PaymentFailed(reason)))
            }
            CheckoutAction::RetryPayment => {
                if step != S::PaymentFailed {
                    return Err(invalid(&CheckoutAction::RetryPayment));
                }
                self.step = S::Payment;
                Ok(Applied::Changed)
            }

            CheckoutAction::Back => {
                self.step = match step {
                    S::ListingDetail => {
                        self.draft = OrderDraft::default();
                        self.pickup = PickupRequest::default();
                        S::Browsing
                    }
                    S::Delivery => S::ListingDetail,
                    S::Contact => S::Delivery,
                    S::Payment => S::Contact,
                    S::PaymentFailed => S::Payment,
                    S::Browsing | S::Confirmation => return Err(invalid(&CheckoutAction::Back)),
                };
                Ok(Applied::Changed)
            }
            CheckoutAction::Reset => {
                self.step = S::Browsing;
                self.draft = OrderDraft::default();
                self.pickup = PickupRequest::default();
                Ok(Applied::Changed)
            }
        }
    }

    /// The listing the draft is bound to, overlay applied.
    pub fn selected_listing(&self) -> Option<Cow<'_, Listing>> {
        self.catalog.get(self.draft.listing_id?)
    }

    /// Reason "buy now" is disabled for `id`, if it is.
    pub fn buy_blocker(&self, id: ListingId) -> Option<CheckoutError> {
        match self.catalog.get(id) {
            Some(listing) => buy_blocker(&listing, self.viewer),
            None => Some(CheckoutError::ListingNotFound(id)),
        }
    }

    pub fn can_buy(&self, id: ListingId) -> bool {
        self.buy_blocker(id).is_none()
    }

    /// Listings for the browsing view. A failed fetch shows its error and
    /// whatever was loaded before (nothing, on first load).
    pub fn browse(&self, filter: &ListingFilter) -> BrowseView<'_> {
        BrowseView {
            listings: self.catalog.iter().filter(|l| filter.matches(l)).collect(),
            loading: self.pending_fetch.is_some(),
            error: match &self.catalog_load {
                CatalogLoad::Failed(message) => Some(message.as_str()),
                _ => None,
            },
        }
    }

    /// The placed order, once confirmed.
    pub fn order(&self, now: DateTime<Utc>) -> Option<Order> {
        if self.step != CheckoutStep::Confirmation {
            return None;
        }
        let listing = self.selected_listing()?;
        self.draft.to_order(&listing, self.viewer, now)
    }
}

/// Only two things disable "buy now": the item is sold, or the viewer sells it.
pub fn buy_blocker(listing: &Listing, viewer: Option<UserId>) -> Option<CheckoutError> {
    if listing.is_sold() {
        Some(CheckoutError::ListingSold)
    } else if listing.is_own(viewer) {
        Some(CheckoutError::OwnListing)
    } else {
        None
    }
}
