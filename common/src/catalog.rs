use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::listing::{Listing, ListingId, ListingStatus};
use crate::location::GeoLocation;

/// Local status change not yet known to be reflected by the Listing Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStatus {
    pub status: ListingStatus,
    /// Set once the service accepted the change.
    pub synced: bool,
}

/// Fetched listings plus a local overlay of optimistic status changes.
///
/// The fetched sequence is never mutated in place; views apply the overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    listings: Vec<Listing>,
    overlay: BTreeMap<ListingId, PendingStatus>,
}

impl Catalog {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            overlay: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Listing with the overlay applied.
    pub fn get(&self, id: ListingId) -> Option<Cow<'_, Listing>> {
        let listing = self.listings.iter().find(|l| l.id == id)?;
        Some(self.overlaid(listing))
    }

    /// All listings, in fetch order, with the overlay applied.
    pub fn iter(&self) -> impl Iterator<Item = Cow<'_, Listing>> + '_ {
        self.listings.iter().map(|l| self.overlaid(l))
    }

    /// Listings matching `filter`, overlay applied. Pure; never re-fetches.
    pub fn filter<'a>(&'a self, filter: &'a ListingFilter) -> impl Iterator<Item = Cow<'a, Listing>> + 'a {
        self.iter().filter(move |l| filter.matches(l))
    }

    fn overlaid<'a>(&self, listing: &'a Listing) -> Cow<'a, Listing> {
        match self.overlay.get(&listing.id) {
            Some(pending) if pending.status != listing.status => {
                let mut patched = listing.clone();
                patched.status = pending.status;
                Cow::Owned(patched)
            }
            _ => Cow::Borrowed(listing),
        }
    }

    /// Optimistically mark a listing sold. Returns false for unknown ids.
    pub fn mark_sold(&mut self, id: ListingId) -> bool {
        if !self.listings.iter().any(|l| l.id == id) {
            return false;
        }
        self.overlay.insert(
            id,
            PendingStatus {
                status: ListingStatus::Sold,
                synced: false,
            },
        );
        true
    }

    /// Overlay entries the service has not yet accepted.
    pub fn pending_sync(&self) -> Vec<(ListingId, ListingStatus)> {
        self.overlay
            .iter()
            .filter(|(_, p)| !p.synced)
            .map(|(id, p)| (*id, p.status))
            .collect()
    }

    pub fn mark_synced(&mut self, id: ListingId) {
        if let Some(pending) = self.overlay.get_mut(&id) {
            pending.synced = true;
        }
    }

    pub fn overlay(&self) -> &BTreeMap<ListingId, PendingStatus> {
        &self.overlay
    }

    /// Replace the fetched listings with a fresh fetch and reconcile the overlay.
    ///
    /// An overlay entry is dropped when the fresh data already carries its
    /// status or the listing is gone; otherwise it stays applied.
    pub fn replace(&mut self, fresh: Vec<Listing>) {
        self.overlay.retain(|id, pending| {
            fresh
                .iter()
                .find(|l| l.id == *id)
                .is_some_and(|l| l.status != pending.status)
        });
        self.listings = fresh;
    }
}

/// Category criterion of a [`ListingFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    /// Case-insensitive match against the listing's category label.
    Label(String),
    Id(u32),
}

/// Client-side filter over already fetched listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub category: Option<CategoryFilter>,
    /// Inclusive upper bound.
    pub max_price_sek: Option<u64>,
    /// Case-insensitive substring of `"{title} {city}"`.
    pub query: Option<String>,
    /// Only listings within this many km of the point. Listings without
    /// coordinates are excluded while set.
    pub near: Option<(GeoLocation, f64)>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(category) = &self.category {
            let ok = match category {
                CategoryFilter::Label(label) => listing
                    .category
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase() == label.to_lowercase()),
                CategoryFilter::Id(id) => listing.category_id == Some(*id),
            };
            if !ok {
                return false;
            }
        }

        if self.max_price_sek.is_some_and(|max| listing.price_sek > max) {
            return false;
        }

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let haystack = format!(
                "{} {}",
                listing.title,
                listing.city.as_deref().unwrap_or_default()
            )
            .to_lowercase();
            if !haystack.contains(&query.to_lowercase()) {
                return false;
            }
        }

        if let Some((origin, radius_km)) = &self.near {
            match listing.location() {
                Some(loc) if origin.within_km(&loc, *radius_km) => {}
                _ => return false,
            }
        }

        true
    }
}
