//! Query parameters for the archive and forecast endpoints.
//!
//! The archive only serves hourly and daily data. The forecast endpoint also serves
//! 15-minute data, but only for spans of at most [`MINUTELY_15_MAX_DAYS`] days.

use crate::types::query::LatLon;
use crate::types::tier::Tier;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest span, in days and inclusive of both ends, for which `minutely_15` may be requested.
pub const MINUTELY_15_MAX_DAYS: i64 = 31;

const ARCHIVE_HOURLY: &str = "temperature_2m,precipitation,wind_speed_10m";
const ARCHIVE_DAILY: &str = "temperature_2m_mean,precipitation_sum,wind_speed_10m_max";
const ARCHIVE_DAILY_SOLAR: &str = "sunrise,sunset,daylight_duration";

const FORECAST_MINUTELY_15: &str = "temperature_2m,precipitation";
const FORECAST_HOURLY: &str = "temperature_2m,precipitation_probability,wind_speed_10m,uv_index";
const FORECAST_DAILY: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max";
const FORECAST_DAILY_SOLAR: &str = "sunrise,sunset,uv_index_max,daylight_duration";

/// Key/value query parameters for one backend request.
///
/// Serializes as a flat string map, which is what the provider receives. The
/// requested tiers and any builder notices ride along but are never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    params: BTreeMap<String, String>,
    #[serde(skip)]
    tiers: Vec<Tier>,
    #[serde(skip)]
    notices: Vec<String>,
}

impl ParamSet {
    fn base(lat_lon: LatLon, start: NaiveDate, end: NaiveDate) -> Self {
        let mut set = ParamSet::default();
        set.insert("latitude", lat_lon.latitude().to_string());
        set.insert("longitude", lat_lon.longitude().to_string());
        set.insert("start_date", start.format("%Y-%m-%d").to_string());
        set.insert("end_date", end.format("%Y-%m-%d").to_string());
        set.insert("timezone", "auto");
        set
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Tiers this request asks the provider for, finest first.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn requests(&self, tier: Tier) -> bool {
        self.tiers.contains(&tier)
    }

    /// Degradations decided while building the request.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn request_tier(&mut self, tier: Tier, variables: impl Into<String>) {
        self.insert(tier.key(), variables);
        if !self.tiers.contains(&tier) {
            self.tiers.push(tier);
            self.tiers.sort();
        }
    }

    fn add_notice(&mut self, notice: String) {
        info!("{}", notice);
        self.notices.push(notice);
    }
}

/// Inclusive number of days between `start` and `end`.
fn day_span(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Builds archive parameters for `[start, end]`.
///
/// Daily granularity (`>= 1440` minutes) requests the full daily variable list;
/// anything finer requests hourly data. The daily solar summary is always included.
pub fn build_past_params(
    lat_lon: LatLon,
    start: NaiveDate,
    end: NaiveDate,
    granularity_minutes: u32,
) -> ParamSet {
    let mut params = ParamSet::base(lat_lon, start, end);
    if granularity_minutes >= Tier::Daily.base_interval_minutes() {
        params.request_tier(Tier::Daily, format!("{ARCHIVE_DAILY},{ARCHIVE_DAILY_SOLAR}"));
    } else {
        params.request_tier(Tier::Hourly, ARCHIVE_HOURLY);
        params.request_tier(Tier::Daily, ARCHIVE_DAILY_SOLAR);
    }
    debug!(
        "Archive params for {}..{} at {} min: {:?}",
        start,
        end,
        granularity_minutes,
        params.tiers()
    );
    params
}

/// Builds forecast parameters for `[start, end]`.
///
/// | granularity        | tier requested                                  |
/// |--------------------|-------------------------------------------------|
/// | `< 30`             | `minutely_15` (hourly if the span exceeds 31 days) |
/// | `30 ..< 1440`      | `hourly`                                        |
/// | `>= 1440`          | `daily`, full variable list                     |
///
/// The daily solar summary (sunrise, sunset, UV max, daylight) is always included.
pub fn build_forecast_params(
    lat_lon: LatLon,
    start: NaiveDate,
    end: NaiveDate,
    granularity_minutes: u32,
) -> ParamSet {
    let mut params = ParamSet::base(lat_lon, start, end);
    if granularity_minutes >= Tier::Daily.base_interval_minutes() {
        params.request_tier(
            Tier::Daily,
            format!("{FORECAST_DAILY},{FORECAST_DAILY_SOLAR}"),
        );
    } else {
        if granularity_minutes < 30 {
            let span = day_span(start, end);
            if span <= MINUTELY_15_MAX_DAYS {
                params.request_tier(Tier::Minutely15, FORECAST_MINUTELY_15);
            } else {
                params.add_notice(format!(
                    "Forecast range of {span} days exceeds {MINUTELY_15_MAX_DAYS} days, \
                     requesting hourly instead of minutely_15"
                ));
                params.request_tier(Tier::Hourly, FORECAST_HOURLY);
            }
        } else {
            params.request_tier(Tier::Hourly, FORECAST_HOURLY);
        }
        params.request_tier(Tier::Daily, FORECAST_DAILY_SOLAR);
    }
    debug!(
        "Forecast params for {}..{} at {} min: {:?}",
        start,
        end,
        granularity_minutes,
        params.tiers()
    );
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRAGUE: LatLon = LatLon(50.0755, 14.4378);

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_base_keys(params: &ParamSet) {
        for key in ["latitude", "longitude", "start_date", "end_date", "timezone"] {
            assert!(params.contains(key), "missing {key}");
        }
        assert_eq!(params.get("timezone"), Some("auto"));
    }

    #[test]
    fn test_base_keys_present_for_every_granularity() {
        for g in [1, 15, 29, 30, 60, 120, 1439, 1440, 10_080] {
            let past = build_past_params(PRAGUE, date(2025, 1, 1), date(2025, 1, 1), g);
            let forecast = build_forecast_params(PRAGUE, date(2025, 1, 1), date(2025, 3, 1), g);
            assert_base_keys(&past);
            assert_base_keys(&forecast);
        }
    }

    #[test]
    fn test_past_hourly_with_solar_summary() {
        let params = build_past_params(PRAGUE, date(2025, 4, 1), date(2025, 4, 3), 60);

        assert_eq!(params.get("start_date"), Some("2025-04-01"));
        assert_eq!(params.get("end_date"), Some("2025-04-03"));
        assert_eq!(params.get("latitude"), Some("50.0755"));
        assert_eq!(params.get("hourly"), Some(ARCHIVE_HOURLY));
        assert_eq!(params.get("daily"), Some("sunrise,sunset,daylight_duration"));
        assert!(!params.contains("minutely_15"));
        assert_eq!(params.tiers(), &[Tier::Hourly, Tier::Daily]);
    }

    #[test]
    fn test_past_daily_has_no_uv() {
        let params = build_past_params(PRAGUE, date(2025, 4, 1), date(2025, 4, 3), 1440);

        assert!(!params.contains("hourly"));
        let daily = params.get("daily").unwrap();
        assert!(daily.starts_with("temperature_2m_mean,"));
        assert!(daily.ends_with("sunrise,sunset,daylight_duration"));
        assert!(!daily.contains("uv_index"));
    }

    #[test]
    fn test_forecast_tier_selection() {
        let start = date(2025, 4, 20);
        let end = date(2025, 4, 22);

        let fine = build_forecast_params(PRAGUE, start, end, 15);
        assert_eq!(fine.tiers(), &[Tier::Minutely15, Tier::Daily]);
        assert_eq!(fine.get("minutely_15"), Some(FORECAST_MINUTELY_15));
        assert!(fine.notices().is_empty());

        let half_hour = build_forecast_params(PRAGUE, start, end, 30);
        assert_eq!(half_hour.tiers(), &[Tier::Hourly, Tier::Daily]);
        assert_eq!(half_hour.get("daily"), Some(FORECAST_DAILY_SOLAR));

        let daily = build_forecast_params(PRAGUE, start, end, 1440);
        assert_eq!(daily.tiers(), &[Tier::Daily]);
        assert_eq!(
            daily.get("daily"),
            Some(
                "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max,\
                 sunrise,sunset,uv_index_max,daylight_duration"
            )
        );
    }

    #[test]
    fn test_forecast_minutely_falls_back_to_hourly_on_long_span() {
        // 31 days inclusive is still allowed.
        let edge = build_forecast_params(PRAGUE, date(2025, 5, 1), date(2025, 5, 31), 15);
        assert!(edge.requests(Tier::Minutely15));

        let long = build_forecast_params(PRAGUE, date(2025, 5, 1), date(2025, 6, 1), 15);
        assert!(!long.requests(Tier::Minutely15));
        assert!(long.requests(Tier::Hourly));
        assert_eq!(long.notices().len(), 1);
        assert!(long.notices()[0].contains("32 days"));
    }

    #[test]
    fn test_serializes_only_provider_params() {
        let params = build_forecast_params(PRAGUE, date(2025, 5, 1), date(2025, 6, 1), 15);
        let value = serde_json::to_value(&params).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 7);
        assert!(object.values().all(|v| v.is_string()));
        assert!(!object.contains_key("tiers"));
        assert!(!object.contains_key("notices"));
    }
}
