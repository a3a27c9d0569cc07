use std::fmt;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::delivery::{DeliveryType, ShippingProvider};
use crate::listing::{Listing, ListingId, UserId};

/// Prefix of every generated order identifier.
pub const ORDER_ID_PREFIX: &str = "ORDER-";
const ORDER_ID_SUFFIX_LEN: usize = 10;

/// User-presentable order identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Fixed prefix followed by a random uppercase alphanumeric suffix.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let suffix: String = (0..ORDER_ID_SUFFIX_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
            .collect();
        OrderId(format!("{ORDER_ID_PREFIX}{suffix}"))
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checkout inputs accumulated step by step.
///
/// Empty (`Default`) until a listing is selected. `shipping_provider` and
/// `address` are only ever set while `delivery_type` is `Flat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub listing_id: Option<ListingId>,
    pub amount_sek: u64,
    pub delivery_type: DeliveryType,
    pub shipping_provider: Option<ShippingProvider>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub message: Option<String>,
    pub order_id: Option<OrderId>,
}

impl OrderDraft {
    /// A fresh draft bound to `listing`.
    pub fn for_listing(listing: &Listing) -> Self {
        Self {
            listing_id: Some(listing.id),
            amount_sek: listing.price_sek,
            ..Self::default()
        }
    }

    /// Switch delivery type, dropping the shipping-only fields on pickup.
    pub fn set_delivery_type(&mut self, delivery_type: DeliveryType) {
        self.delivery_type = delivery_type;
        if delivery_type == DeliveryType::Pickup {
            self.shipping_provider = None;
            self.address = None;
        }
    }

    /// True once everything needed to leave the delivery step is set.
    pub fn delivery_complete(&self) -> bool {
        match self.delivery_type {
            DeliveryType::Pickup => true,
            DeliveryType::Flat => self.shipping_provider.is_some(),
        }
    }

    /// The order record sent to the seller once payment completes.
    pub fn to_order(&self, listing: &Listing, buyer: Option<UserId>, now: DateTime<Utc>) -> Option<Order> {
        let order_id = self.order_id.clone()?;
        let flat = self.delivery_type == DeliveryType::Flat;
        Some(Order {
            id: order_id,
            buyer_id: buyer,
            listing_id: listing.id,
            seller_id: listing.user_id,
            amount_sek: self.amount_sek,
            delivery_type: self.delivery_type,
            shipping_provider: self.shipping_provider.filter(|_| flat),
            delivery_address: self.address.clone().filter(|_| flat),
            message: self.message.clone(),
            status: OrderStatus::Created,
            created_at: now,
        })
    }
}

/// Status of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: Option<UserId>,
    pub listing_id: ListingId,
    pub seller_id: Option<UserId>,
    pub amount_sek: u64,
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_provider: Option<ShippingProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
