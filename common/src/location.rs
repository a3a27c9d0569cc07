use serde::{Deserialize, Serialize};

/// A point in decimal degrees, as carried on listings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance in kilometers.
    pub fn distance_km(&self, other: &GeoLocation) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let half_dlat = (other.latitude - self.latitude).to_radians() / 2.0;
        let half_dlon = (other.longitude - self.longitude).to_radians() / 2.0;

        let h = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
    }

    /// True when `other` lies within `radius_km` of this point.
    pub fn within_km(&self, other: &GeoLocation, radius_km: f64) -> bool {
        self.distance_km(other) <= radius_km
    }
}
