use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checkout::CheckoutError;

/// Longest pickup message a buyer may send to the seller, in characters.
pub const PICKUP_MESSAGE_MAX_CHARS: usize = 500;

/// How the item reaches the buyer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Buyer collects in person.
    #[default]
    Pickup,
    /// Fixed-rate shipping via a named carrier.
    Flat,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryType::Pickup => "pickup",
            DeliveryType::Flat => "flat",
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryType::Pickup => write!(f, "Pickup"),
            DeliveryType::Flat => write!(f, "Fixed shipping"),
        }
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(DeliveryType::Pickup),
            "flat" => Ok(DeliveryType::Flat),
            other => Err(format!("unknown delivery type '{other}'")),
        }
    }
}

/// Carrier for flat-rate shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingProvider {
    Postnord,
    Instabox,
}

impl ShippingProvider {
    pub fn all() -> &'static [ShippingProvider] {
        &[ShippingProvider::Postnord, ShippingProvider::Instabox]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShippingProvider::Postnord => "postnord",
            ShippingProvider::Instabox => "instabox",
        }
    }
}

impl fmt::Display for ShippingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShippingProvider::Postnord => write!(f, "PostNord"),
            ShippingProvider::Instabox => write!(f, "Instabox"),
        }
    }
}

impl std::str::FromStr for ShippingProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShippingProvider::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown shipping provider '{s}'"))
    }
}

/// The pickup-request side form shown while `Pickup` is selected.
///
/// Submitting it never advances the checkout; it only raises a transient
/// acknowledgement until dismissed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupRequest {
    pub message: String,
    pub acknowledged: bool,
}

/// Reject messages over the character bound.
pub fn validate_pickup_message(message: &str) -> Result<(), CheckoutError> {
    let len = message.chars().count();
    if len > PICKUP_MESSAGE_MAX_CHARS {
        return Err(CheckoutError::PickupMessageTooLong {
            len,
            max: PICKUP_MESSAGE_MAX_CHARS,
        });
    }
    Ok(())
}
