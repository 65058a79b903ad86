//! Reduces fetched time series to the caller's requested spacing.
//!
//! Open-Meteo always returns its native resolution. Points are kept on a grid
//! anchored at the first timestamp of each block, so the output spacing matches the
//! request even when the provider leaves gaps.

use crate::types::fetch_result::FetchResult;
use crate::types::tier::Tier;
use crate::types::time_series::{TimeSeriesBlock, WeatherPayload};
use crate::utils::parse_timestamp;
use chrono::Duration;
use log::{debug, info, warn};

/// Keeps only the points of `block` that land on a `requested_minutes` grid.
///
/// The block is returned as-is when it is empty, when `requested_minutes` is not
/// coarser than `base_interval_minutes`, when the request is daily or coarser, or when
/// the first timestamp cannot be parsed. Otherwise index `i` is kept when its
/// timestamp reaches the next grid target, and the target then moves forward by
/// whole intervals past that timestamp. Timestamps that fail to parse are dropped.
pub fn downsample(
    block: TimeSeriesBlock,
    base_interval_minutes: u32,
    requested_minutes: u32,
) -> TimeSeriesBlock {
    if block.is_empty()
        || requested_minutes <= base_interval_minutes
        || requested_minutes >= Tier::Daily.base_interval_minutes()
    {
        return block;
    }

    let Some(anchor) = parse_timestamp(&block.time[0]) else {
        warn!(
            "Cannot parse anchor timestamp '{}', returning data unfiltered",
            block.time[0]
        );
        return block;
    };

    let interval = Duration::minutes(i64::from(requested_minutes));
    let mut target = anchor;
    let mut keep = Vec::with_capacity(block.len());

    for (i, raw) in block.time.iter().enumerate() {
        let Some(timestamp) = parse_timestamp(raw) else {
            debug!("Skipping unparseable timestamp '{}'", raw);
            continue;
        };
        if timestamp >= target {
            keep.push(i);
            target += interval;
            while target <= timestamp {
                target += interval;
            }
        }
    }

    if keep.len() == block.len() {
        return block;
    }
    debug!(
        "Downsampled {} points to {} at {} min",
        block.len(),
        keep.len(),
        requested_minutes
    );
    block.select(&keep)
}

fn downsample_tier(payload: &mut WeatherPayload, tier: Tier, requested_minutes: u32) {
    let slot = payload.tier_slot(tier);
    if let Some(block) = slot.take() {
        *slot = Some(downsample(
            block,
            tier.base_interval_minutes(),
            requested_minutes,
        ));
    }
}

fn drop_tier(payload: &mut WeatherPayload, tier: Tier, side: &str) {
    if payload.remove_tier(tier).is_some() {
        debug!("Removed {}.{}", side, tier);
    }
}

fn filter_forecast(forecast: &mut WeatherPayload, requested: u32, notices: &mut Vec<String>) {
    if requested < Tier::Hourly.base_interval_minutes() {
        if forecast.minutely_15.is_some() {
            downsample_tier(forecast, Tier::Minutely15, requested);
            drop_tier(forecast, Tier::Hourly, "forecast");
        } else if forecast.hourly.is_some() {
            notices.push(format!(
                "Requested {requested} min, but only hourly forecast data is available"
            ));
            downsample_tier(forecast, Tier::Hourly, requested);
        } else {
            notices.push(format!(
                "Requested {requested} min, but no minutely_15 or hourly forecast data is available"
            ));
        }
    } else if requested < Tier::Daily.base_interval_minutes() {
        drop_tier(forecast, Tier::Minutely15, "forecast");
        if forecast.hourly.is_some() {
            downsample_tier(forecast, Tier::Hourly, requested);
        } else {
            notices.push(format!(
                "Requested {requested} min, but no hourly forecast data is available"
            ));
        }
    } else {
        drop_tier(forecast, Tier::Minutely15, "forecast");
        drop_tier(forecast, Tier::Hourly, "forecast");
    }
}

fn filter_past(past: &mut WeatherPayload, requested: u32, notices: &mut Vec<String>) {
    drop_tier(past, Tier::Minutely15, "past");
    if requested < Tier::Daily.base_interval_minutes() {
        if past.hourly.is_some() {
            if requested < Tier::Hourly.base_interval_minutes() {
                notices.push(format!(
                    "Requested {requested} min, but past data is only available hourly"
                ));
            }
            downsample_tier(past, Tier::Hourly, requested);
        } else {
            notices.push(format!(
                "Requested {requested} min, but no hourly past data is available"
            ));
        }
    } else {
        drop_tier(past, Tier::Hourly, "past");
    }
}

/// Applies the requested granularity to both halves of a fetch result.
///
/// Tiers finer than the request are downsampled and redundant tiers are removed.
/// `daily` is never touched. Degradations are appended to
/// [`QueryDetails::notices`](crate::QueryDetails::notices).
pub fn filter_by_granularity(mut result: FetchResult, requested_minutes: u32) -> FetchResult {
    info!("Filtering fetched data to {} min", requested_minutes);
    let mut notices = Vec::new();

    if let Some(forecast) = result.forecast.as_mut() {
        filter_forecast(forecast, requested_minutes, &mut notices);
    }
    if let Some(past) = result.past.as_mut() {
        filter_past(past, requested_minutes, &mut notices);
    }

    for notice in notices {
        warn!("{}", notice);
        result.push_notice(notice);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fetch_result::QueryDetails;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn hourly_block(times: &[&str]) -> TimeSeriesBlock {
        let temps: Vec<f64> = (0..times.len()).map(|i| i as f64).collect();
        TimeSeriesBlock::new(times.iter().map(|t| t.to_string()).collect())
            .with_field("temperature_2m", json!(temps))
            .with_field("units", json!("°C"))
    }

    fn six_hours() -> TimeSeriesBlock {
        hourly_block(&[
            "2025-04-20T00:00",
            "2025-04-20T01:00",
            "2025-04-20T02:00",
            "2025-04-20T03:00",
            "2025-04-20T04:00",
            "2025-04-20T05:00",
        ])
    }

    fn result_with(past: Option<WeatherPayload>, forecast: Option<WeatherPayload>) -> FetchResult {
        let day = NaiveDate::from_ymd_opt(2025, 4, 20).unwrap();
        FetchResult {
            query_details: QueryDetails {
                latitude: 50.0,
                longitude: 14.0,
                date_from: day,
                date_to: day,
                requested_granularity_minutes: 60,
                fetched_resolution: "hourly".to_string(),
                request_time_utc: Utc::now(),
                notices: Vec::new(),
            },
            past,
            forecast,
            errors: None,
        }
    }

    fn daily_block() -> TimeSeriesBlock {
        TimeSeriesBlock::new(vec!["2025-04-20".into()])
            .with_field("sunrise", json!(["2025-04-20T05:58"]))
            .with_field("daylight_duration", json!([50_580.0]))
    }

    #[test]
    fn test_two_hour_steps_keep_every_other_point() {
        let filtered = downsample(six_hours(), 60, 120);

        assert_eq!(
            filtered.time,
            vec!["2025-04-20T00:00", "2025-04-20T02:00", "2025-04-20T04:00"]
        );
        assert_eq!(filtered.fields["temperature_2m"], json!([0.0, 2.0, 4.0]));
        assert_eq!(filtered.fields["units"], json!("°C"));
    }

    #[test]
    fn test_request_not_coarser_than_base_is_identity() {
        for requested in [15, 45, 60] {
            assert_eq!(downsample(six_hours(), 60, requested), six_hours());
        }
        assert_eq!(downsample(six_hours(), 60, 1440), six_hours());
    }

    #[test]
    fn test_unparseable_anchor_leaves_block_untouched() {
        let mut block = six_hours();
        block.time[0] = "garbage".to_string();

        assert_eq!(downsample(block.clone(), 60, 120), block);
    }

    #[test]
    fn test_unparseable_timestamp_is_skipped() {
        let mut block = six_hours();
        block.time[2] = "garbage".to_string();

        let filtered = downsample(block, 60, 120);

        // 03:00 takes the 02:00 slot, 04:00 still sits on the grid.
        assert_eq!(
            filtered.time,
            vec!["2025-04-20T00:00", "2025-04-20T03:00", "2025-04-20T04:00"]
        );
    }

    #[test]
    fn test_gap_realigns_to_anchor_grid() {
        let block = hourly_block(&[
            "2025-04-20T00:00",
            "2025-04-20T01:00",
            "2025-04-20T05:00",
            "2025-04-20T06:00",
            "2025-04-20T07:00",
            "2025-04-20T08:00",
        ]);

        let filtered = downsample(block, 60, 120);

        assert_eq!(
            filtered.time,
            vec!["2025-04-20T00:00", "2025-04-20T05:00", "2025-04-20T06:00", "2025-04-20T08:00"]
        );
        assert_eq!(filtered.fields["temperature_2m"], json!([0.0, 2.0, 3.0, 5.0]));
    }

    #[test]
    fn test_minutely_to_half_hour() {
        let block = hourly_block(&[
            "2025-04-20T10:00",
            "2025-04-20T10:15",
            "2025-04-20T10:30",
            "2025-04-20T10:45",
            "2025-04-20T11:00",
        ]);

        let filtered = downsample(block, 15, 30);

        assert_eq!(
            filtered.time,
            vec!["2025-04-20T10:00", "2025-04-20T10:30", "2025-04-20T11:00"]
        );
    }

    #[test]
    fn test_daily_request_keeps_only_daily() {
        let forecast = WeatherPayload {
            minutely_15: Some(hourly_block(&["2025-04-20T00:00", "2025-04-20T00:15"])),
            hourly: Some(six_hours()),
            daily: Some(daily_block()),
            ..Default::default()
        };
        let past = WeatherPayload {
            hourly: Some(six_hours()),
            daily: Some(daily_block()),
            ..Default::default()
        };

        let filtered = filter_by_granularity(result_with(Some(past), Some(forecast)), 1440);

        let forecast = filtered.forecast.unwrap();
        assert!(forecast.minutely_15.is_none());
        assert!(forecast.hourly.is_none());
        assert_eq!(forecast.daily, Some(daily_block()));
        let past = filtered.past.unwrap();
        assert!(past.hourly.is_none());
        assert_eq!(past.daily, Some(daily_block()));
        assert!(filtered.query_details.notices.is_empty());
    }

    #[test]
    fn test_sub_hourly_prefers_minutely_and_drops_hourly() {
        let forecast = WeatherPayload {
            minutely_15: Some(hourly_block(&[
                "2025-04-20T00:00",
                "2025-04-20T00:15",
                "2025-04-20T00:30",
            ])),
            hourly: Some(six_hours()),
            ..Default::default()
        };

        let filtered = filter_by_granularity(result_with(None, Some(forecast)), 30);

        let forecast = filtered.forecast.unwrap();
        assert!(forecast.hourly.is_none());
        assert_eq!(forecast.minutely_15.unwrap().len(), 2);
    }

    #[test]
    fn test_sub_hourly_falls_back_to_hourly_with_notice() {
        let forecast = WeatherPayload {
            hourly: Some(six_hours()),
            ..Default::default()
        };
        let past = WeatherPayload {
            hourly: Some(six_hours()),
            ..Default::default()
        };

        let filtered = filter_by_granularity(result_with(Some(past), Some(forecast)), 15);

        assert_eq!(filtered.forecast.unwrap().hourly, Some(six_hours()));
        assert_eq!(filtered.past.unwrap().hourly, Some(six_hours()));
        assert_eq!(filtered.query_details.notices.len(), 2);
    }

    #[test]
    fn test_multi_hour_filters_hourly_and_drops_minutely() {
        let forecast = WeatherPayload {
            minutely_15: Some(hourly_block(&["2025-04-20T00:00"])),
            hourly: Some(six_hours()),
            daily: Some(daily_block()),
            ..Default::default()
        };

        let filtered = filter_by_granularity(result_with(None, Some(forecast)), 180);

        let forecast = filtered.forecast.unwrap();
        assert!(forecast.minutely_15.is_none());
        assert_eq!(
            forecast.hourly.unwrap().time,
            vec!["2025-04-20T00:00", "2025-04-20T03:00"]
        );
        assert_eq!(forecast.daily, Some(daily_block()));
    }

    #[test]
    fn test_missing_hourly_is_noticed() {
        let forecast = WeatherPayload {
            daily: Some(daily_block()),
            ..Default::default()
        };

        let filtered = filter_by_granularity(result_with(None, Some(forecast)), 120);

        assert_eq!(filtered.query_details.notices.len(), 1);
        assert!(filtered.query_details.notices[0].contains("no hourly forecast"));
    }

    #[test]
    fn test_empty_block_is_returned_unchanged() {
        let empty = TimeSeriesBlock::new(vec![]).with_field("temperature_2m", json!([]));

        assert_eq!(downsample(empty.clone(), 60, 120), empty);
    }

    #[test]
    fn test_daily_only_payloads_at_sub_hourly_are_noticed() {
        let forecast = WeatherPayload {
            daily: Some(daily_block()),
            ..Default::default()
        };
        let past = WeatherPayload {
            daily: Some(daily_block()),
            ..Default::default()
        };

        let filtered = filter_by_granularity(result_with(Some(past), Some(forecast)), 15);

        assert_eq!(
            filtered.query_details.notices,
            vec![
                "Requested 15 min, but no minutely_15 or hourly forecast data is available",
                "Requested 15 min, but no hourly past data is available",
            ]
        );
        let forecast = filtered.forecast.unwrap();
        assert!(forecast.minutely_15.is_none());
        assert!(forecast.hourly.is_none());
        assert_eq!(forecast.daily, Some(daily_block()));
        assert_eq!(filtered.past.unwrap().daily, Some(daily_block()));
    }
}
