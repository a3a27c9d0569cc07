use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::location::GeoLocation;

/// Listing identifier as assigned by the Listing Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A marketplace user (seller or buyer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Physical condition of the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Used,
    NeedsRepair,
}

impl Condition {
    pub fn all() -> &'static [Condition] {
        &[
            Condition::New,
            Condition::LikeNew,
            Condition::Good,
            Condition::Used,
            Condition::NeedsRepair,
        ]
    }

    /// Wire name, e.g. `like_new`.
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::LikeNew => "like_new",
            Condition::Good => "good",
            Condition::Used => "used",
            Condition::NeedsRepair => "needs_repair",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::LikeNew => "like new",
            Condition::Good => "good",
            Condition::Used => "used",
            Condition::NeedsRepair => "needs repair",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown condition '{s}'"))
    }
}

/// Publication status of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    #[default]
    Published,
    Paused,
    Sold,
    Removed,
}

impl ListingStatus {
    pub fn all() -> &'static [ListingStatus] {
        &[
            ListingStatus::Draft,
            ListingStatus::Published,
            ListingStatus::Paused,
            ListingStatus::Sold,
            ListingStatus::Removed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Published => "published",
            ListingStatus::Paused => "paused",
            ListingStatus::Sold => "sold",
            ListingStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingStatus::all()
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("unknown status '{s}'"))
    }
}

/// Image renditions attached to a listing. Every URL is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    #[serde(default)]
    pub url_full: Option<String>,
    #[serde(default)]
    pub url_card: Option<String>,
    #[serde(default)]
    pub url_thumb: Option<String>,
    #[serde(default)]
    pub blurhash: Option<String>,
}

/// A single item offered for sale, as returned by `GET /listings/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// Seller. Absent on some legacy records.
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Whole kronor.
    pub price_sek: u64,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub category_id: Option<u32>,
    /// Human readable category label, when the service embeds one.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Missing or `null` status decodes as published.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ListingStatus,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub images: Vec<ListingImage>,
    /// RFC 3339, or a naive timestamp taken as UTC.
    #[serde(default, deserialize_with = "utc_or_naive")]
    pub published_at: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value: Option<T> = Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

fn utc_or_naive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(at) = raw.parse::<DateTime<Utc>>() {
        return Ok(Some(at));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}

impl Listing {
    pub fn is_sold(&self) -> bool {
        self.status == ListingStatus::Sold
    }

    /// True when `viewer` is the seller of this listing.
    pub fn is_own(&self, viewer: Option<UserId>) -> bool {
        matches!((self.user_id, viewer), (Some(seller), Some(v)) if seller == v)
    }

    pub fn location(&self) -> Option<GeoLocation> {
        Some(GeoLocation::new(self.latitude?, self.longitude?))
    }

    /// Card image of the first rendition, if any.
    pub fn card_image(&self) -> Option<&str> {
        self.images.first().and_then(|img| img.url_card.as_deref())
    }

    /// First `max_chars` characters of the description, with an ellipsis when cut.
    pub fn teaser(&self, max_chars: usize) -> String {
        let mut chars = self.description.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Body of `POST /listings/`: the listing shape minus server-assigned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    /// Seller publishing the listing.
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub price_sek: u64,
    pub condition: Condition,
    pub category_id: Option<u32>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: ListingStatus,
}

/// Body of `PUT /listings/{id}`. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_sek: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
}

impl ListingUpdate {
    pub fn status(status: ListingStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the present fields to a local copy.
    pub fn apply_to(&self, listing: &mut Listing) {
        if let Some(title) = &self.title {
            listing.title = title.clone();
        }
        if let Some(description) = &self.description {
            listing.description = description.clone();
        }
        if let Some(price) = self.price_sek {
            listing.price_sek = price;
        }
        if let Some(condition) = self.condition {
            listing.condition = Some(condition);
        }
        if let Some(category_id) = self.category_id {
            listing.category_id = Some(category_id);
        }
        if let Some(city) = &self.city {
            listing.city = Some(city.clone());
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
    }
}
