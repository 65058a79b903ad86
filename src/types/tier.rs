//! Defines the resolution tiers exposed by the weather provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete resolution level of the Open-Meteo time-series payloads.
///
/// Each tier corresponds to a top-level key in the provider's JSON response
/// (`minutely_15`, `hourly`, `daily`) and has a fixed native interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// 15-minute data. Only offered by the forecast endpoint, for spans up to 31 days.
    #[serde(rename = "minutely_15")]
    Minutely15,
    /// Hourly data.
    Hourly,
    /// Pre-aggregated daily summaries. Never downsampled.
    Daily,
}

impl Tier {
    /// Every tier, finest first.
    pub const ALL: [Tier; 3] = [Tier::Minutely15, Tier::Hourly, Tier::Daily];

    /// The provider's query parameter and response key for this tier.
    pub fn key(&self) -> &'static str {
        match self {
            Tier::Minutely15 => "minutely_15",
            Tier::Hourly => "hourly",
            Tier::Daily => "daily",
        }
    }

    /// Native spacing between two points of this tier, in minutes.
    pub fn base_interval_minutes(&self) -> u32 {
        match self {
            Tier::Minutely15 => 15,
            Tier::Hourly => 60,
            Tier::Daily => 1440,
        }
    }
}

/// Formats a `Tier` using its provider key.
///
/// # Examples
///
/// ```
/// use weather_query::Tier;
///
/// assert_eq!(Tier::Minutely15.to_string(), "minutely_15");
/// assert_eq!(format!("{}", Tier::Daily), "daily");
/// ```
impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
