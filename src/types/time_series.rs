//! Typed views over the provider's time-series JSON.
//!
//! Open-Meteo returns each resolution tier as an object with a `time` array and one
//! array per requested variable. Those arrays are kept as raw JSON values so any
//! variable the provider sends survives filtering untouched, while the tiers
//! themselves are named fields on [`WeatherPayload`].

use crate::types::tier::Tier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One resolution tier of a provider response.
///
/// `time` holds ISO-8601 timestamps in ascending order. Every entry of `fields` is
/// expected to be an array of the same length as `time`; entries that are not
/// (units, metadata) are carried through every transformation unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TimeSeriesBlock {
    pub fn new(time: Vec<String>) -> Self {
        Self {
            time,
            fields: Map::new(),
        }
    }

    /// Adds or replaces a variable column, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Returns the values of a variable column if it is an array.
    pub fn values(&self, name: &str) -> Option<&Vec<Value>> {
        self.fields.get(name).and_then(Value::as_array)
    }

    /// Returns a copy keeping only the points at `indices`.
    ///
    /// Array fields whose length equals `time` are re-indexed in lockstep; every
    /// other field is cloned as-is. Indices must be in range for `time`.
    pub(crate) fn select(&self, indices: &[usize]) -> TimeSeriesBlock {
        let point_count = self.time.len();
        let time = indices.iter().map(|&i| self.time[i].clone()).collect();
        let fields = self
            .fields
            .iter()
            .map(|(key, value)| {
                let selected = match value {
                    Value::Array(items) if items.len() == point_count => {
                        Value::Array(indices.iter().map(|&i| items[i].clone()).collect())
                    }
                    other => other.clone(),
                };
                (key.clone(), selected)
            })
            .collect();
        TimeSeriesBlock { time, fields }
    }
}

/// A single backend response (archive or forecast).
///
/// The three resolution tiers are typed; every other top-level key of the provider
/// response (coordinates, elevation, timezone, `*_units` objects, ...) lands in
/// `extra` and is serialized back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutely_15: Option<TimeSeriesBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<TimeSeriesBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<TimeSeriesBlock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeatherPayload {
    pub fn tier(&self, tier: Tier) -> Option<&TimeSeriesBlock> {
        match tier {
            Tier::Minutely15 => self.minutely_15.as_ref(),
            Tier::Hourly => self.hourly.as_ref(),
            Tier::Daily => self.daily.as_ref(),
        }
    }

    pub(crate) fn tier_slot(&mut self, tier: Tier) -> &mut Option<TimeSeriesBlock> {
        match tier {
            Tier::Minutely15 => &mut self.minutely_15,
            Tier::Hourly => &mut self.hourly,
            Tier::Daily => &mut self.daily,
        }
    }

    /// Removes a tier, returning it if it was present.
    pub fn remove_tier(&mut self, tier: Tier) -> Option<TimeSeriesBlock> {
        self.tier_slot(tier).take()
    }

    /// The tiers present in this payload, finest first.
    pub fn tiers_present(&self) -> Vec<Tier> {
        Tier::ALL
            .into_iter()
            .filter(|tier| self.tier(*tier).is_some())
            .collect()
    }
}
