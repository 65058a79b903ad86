//! Structured forms of a weather question, before and after location resolution.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use weather_query::LatLon;
///
/// let prague = LatLon(50.0755, 14.4378);
/// assert_eq!(prague.0, 50.0755); // Latitude
/// assert!(prague.is_valid());
/// assert!(!LatLon(91.0, 0.0).is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// `true` when latitude is within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.0) && (-180.0..=180.0).contains(&self.1)
    }
}

/// A weather question reduced to location, inclusive date range and granularity.
///
/// Produced by [`crate::QueryNormalizer`]; `date_from <= date_to` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Free-text place name, as understood by the geocoder.
    pub location: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Requested spacing between returned data points, in minutes. Always positive.
    #[serde(rename = "granularity")]
    pub granularity_minutes: u32,
}

impl StructuredQuery {
    /// Attaches resolved coordinates, consuming the query.
    pub fn resolve(self, coordinates: LatLon) -> ResolvedQuery {
        ResolvedQuery {
            query: self,
            latitude: coordinates.0,
            longitude: coordinates.1,
        }
    }
}

/// A [`StructuredQuery`] with range-valid coordinates attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedQuery {
    #[serde(flatten)]
    pub query: StructuredQuery,
    pub latitude: f64,
    pub longitude: f64,
}

impl ResolvedQuery {
    pub fn coordinates(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolved_query_serializes_flat() {
        let query = StructuredQuery {
            location: "Prague".to_string(),
            date_from: NaiveDate::from_ymd_opt(2025, 4, 9).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            granularity_minutes: 120,
        };
        let resolved = query.resolve(LatLon(50.0755, 14.4378));

        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({
                "location": "Prague",
                "date_from": "2025-04-09",
                "date_to": "2025-04-10",
                "granularity": 120,
                "latitude": 50.0755,
                "longitude": 14.4378
            })
        );
        assert_eq!(resolved.coordinates(), LatLon(50.0755, 14.4378));
    }
}
