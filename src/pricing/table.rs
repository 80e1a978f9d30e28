//! Price table for cache storage, cache creation and input tokens.
//!
//! Every dimension is either one price for all models or a per-model map with a
//! mandatory `default`. In config files and JSON bodies a dimension is written as
//! a bare number or as a table:
//!
//! ```toml
//! [pricing]
//! creation_per_million = 0.075
//! storage_per_million_per_hour = { default = 1.0, "gemini-2.5-pro" = 4.5 }
//! ```
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::error::{ExtractError, Result};
use crate::models::canonical_model;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_KEY: &str = "default";

/// One price dimension, in USD per million tokens (storage prices are additionally per hour).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPrice", into = "RawPrice")]
pub enum PriceDimension {
    /// A single price applied to every model.
    Scalar(f64),
    /// Exact model-name prices with a fallback for everything else.
    PerModel {
        default: f64,
        models: BTreeMap<String, f64>,
    },
}

/// Untyped wire form: a number, or a map that must carry `default`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Scalar(f64),
    Map(BTreeMap<String, f64>),
}

impl TryFrom<RawPrice> for PriceDimension {
    type Error = ExtractError;

    fn try_from(raw: RawPrice) -> Result<Self> {
        let dimension = match raw {
            RawPrice::Scalar(value) => PriceDimension::Scalar(value),
            RawPrice::Map(mut map) => {
                let default = map.remove(DEFAULT_KEY).ok_or_else(|| {
                    ExtractError::InvalidPricing(
                        "per-model price map is missing the mandatory 'default' entry".to_string(),
                    )
                })?;
                PriceDimension::per_model(default, map)
            }
        };
        dimension.validate()?;
        Ok(dimension)
    }
}

impl From<PriceDimension> for RawPrice {
    fn from(dimension: PriceDimension) -> Self {
        match dimension {
            PriceDimension::Scalar(value) => RawPrice::Scalar(value),
            PriceDimension::PerModel { default, mut models } => {
                models.insert(DEFAULT_KEY.to_string(), default);
                RawPrice::Map(models)
            }
        }
    }
}

impl PriceDimension {
    /// Build a per-model dimension. Model names are canonicalised so lookups match
    /// regardless of `models/` prefixes, casing or date suffixes.
    pub fn per_model<I, K>(default: f64, models: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        PriceDimension::PerModel {
            default,
            models: models
                .into_iter()
                .map(|(name, price)| (canonical_model(name.as_ref()), price))
                .collect(),
        }
    }

    /// Resolve the price for a model: exact model match, else `default`.
    pub fn resolve(&self, model: &str) -> f64 {
        match self {
            PriceDimension::Scalar(value) => *value,
            PriceDimension::PerModel { default, models } => models
                .get(&canonical_model(model))
                .copied()
                .unwrap_or(*default),
        }
    }

    /// Reject negative, NaN and infinite prices.
    pub fn validate(&self) -> Result<()> {
        let check = |label: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ExtractError::InvalidPricing(format!(
                    "price for '{}' must be a finite non-negative number, got {}",
                    label, value
                )))
            }
        };

        match self {
            PriceDimension::Scalar(value) => check(DEFAULT_KEY, *value),
            PriceDimension::PerModel { default, models } => {
                check(DEFAULT_KEY, *default)?;
                models.iter().try_for_each(|(model, value)| check(model.as_str(), *value))
            }
        }
    }
}

/// Active prices used by the cache ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    /// Cache storage, USD per million tokens per hour.
    #[serde(default = "default_storage_price")]
    pub storage_per_million_per_hour: PriceDimension,

    /// One-time cache creation, USD per million tokens.
    #[serde(default = "default_creation_price")]
    pub creation_per_million: PriceDimension,

    /// Regular (uncached) input tokens, USD per million tokens.
    #[serde(default = "default_input_price")]
    pub input_per_million: PriceDimension,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            storage_per_million_per_hour: default_storage_price(),
            creation_per_million: default_creation_price(),
            input_per_million: default_input_price(),
        }
    }
}

impl PricingTable {
    pub fn storage_price(&self, model: &str) -> f64 {
        self.storage_per_million_per_hour.resolve(model)
    }

    pub fn creation_price(&self, model: &str) -> f64 {
        self.creation_per_million.resolve(model)
    }

    pub fn input_price(&self, model: &str) -> f64 {
        self.input_per_million.resolve(model)
    }

    pub fn validate(&self) -> Result<()> {
        self.storage_per_million_per_hour.validate()?;
        self.creation_per_million.validate()?;
        self.input_per_million.validate()
    }
}

/// Partial replacement of a [`PricingTable`]. Omitted dimensions keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_per_million_per_hour: Option<PriceDimension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_per_million: Option<PriceDimension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_per_million: Option<PriceDimension>,
}

impl PricingUpdate {
    pub fn is_empty(&self) -> bool {
        self.storage_per_million_per_hour.is_none()
            && self.creation_per_million.is_none()
            && self.input_per_million.is_none()
    }

    /// Produce the merged table. Every supplied dimension is validated before any
    /// of them is applied, so a bad value never half-updates the table.
    pub fn apply_to(&self, current: &PricingTable) -> Result<PricingTable> {
        for dimension in [
            &self.storage_per_million_per_hour,
            &self.creation_per_million,
            &self.input_per_million,
        ]
        .into_iter()
        .flatten()
        {
            dimension.validate()?;
        }

        let mut merged = current.clone();
        if let Some(storage) = &self.storage_per_million_per_hour {
            merged.storage_per_million_per_hour = storage.clone();
        }
        if let Some(creation) = &self.creation_per_million {
            merged.creation_per_million = creation.clone();
        }
        if let Some(input) = &self.input_per_million {
            merged.input_per_million = input.clone();
        }
        Ok(merged)
    }
}

// Gemini list prices (USD)
fn default_storage_price() -> PriceDimension {
    PriceDimension::per_model(1.0, [("gemini-2.5-pro", 4.5), ("gemini-1.5-pro", 4.5)])
}

fn default_creation_price() -> PriceDimension {
    PriceDimension::per_model(0.075, [("gemini-2.5-pro", 0.3125)])
}

fn default_input_price() -> PriceDimension {
    PriceDimension::per_model(
        0.30,
        [("gemini-2.5-flash-lite", 0.10), ("gemini-2.5-pro", 1.25)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let price = PriceDimension::per_model(1.0, [("model-a", 2.0)]);
        assert_eq!(price.resolve("model-a"), 2.0);
        assert_eq!(price.resolve("model-b"), 1.0);
        // no prefix matching beyond canonicalisation
        assert_eq!(price.resolve("model-a-large"), 1.0);
        assert_eq!(price.resolve("models/Model-A"), 2.0);
    }

    #[test]
    fn test_scalar_applies_to_all_models() {
        let price = PriceDimension::Scalar(0.15);
        assert_eq!(price.resolve("gemini-2.5-pro"), 0.15);
        assert_eq!(price.resolve("anything"), 0.15);
    }

    #[test]
    fn test_deserialize_scalar_and_map() {
        let scalar: PriceDimension = serde_json::from_str("0.5").unwrap();
        assert_eq!(scalar, PriceDimension::Scalar(0.5));

        let map: PriceDimension =
            serde_json::from_str(r#"{"default": 1.0, "model-a": 2.0}"#).unwrap();
        assert_eq!(map, PriceDimension::per_model(1.0, [("model-a", 2.0)]));
    }

    #[test]
    fn test_map_without_default_is_rejected() {
        let result = serde_json::from_str::<PriceDimension>(r#"{"model-a": 2.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_and_non_numeric_prices_are_rejected() {
        assert!(serde_json::from_str::<PriceDimension>("-1.0").is_err());
        assert!(serde_json::from_str::<PriceDimension>(r#""cheap""#).is_err());
        assert!(serde_json::from_str::<PriceDimension>(r#"{"default": 1.0, "m": -2.0}"#).is_err());
        assert!(PriceDimension::Scalar(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_serialize_round_trips_default_key() {
        let price = PriceDimension::per_model(1.0, [("model-a", 2.0)]);
        let json = serde_json::to_value(&price).unwrap();
        assert_eq!(json["default"], 1.0);
        assert_eq!(json["model-a"], 2.0);
    }

    #[test]
    fn test_update_replaces_only_supplied_dimensions() {
        let current = PricingTable::default();
        let update = PricingUpdate {
            input_per_million: Some(PriceDimension::Scalar(0.15)),
            ..Default::default()
        };

        let merged = update.apply_to(&current).unwrap();
        assert_eq!(merged.input_price("gemini-2.5-pro"), 0.15);
        assert_eq!(merged.storage_per_million_per_hour, current.storage_per_million_per_hour);
        assert_eq!(merged.creation_per_million, current.creation_per_million);
    }

    #[test]
    fn test_invalid_update_is_rejected_whole() {
        let current = PricingTable::default();
        let update = PricingUpdate {
            input_per_million: Some(PriceDimension::Scalar(0.15)),
            storage_per_million_per_hour: Some(PriceDimension::PerModel {
                default: 1.0,
                models: [("gemini-2.5-pro".to_string(), -4.5)].into_iter().collect(),
            }),
            ..Default::default()
        };

        assert!(matches!(
            update.apply_to(&current),
            Err(ExtractError::InvalidPricing(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let table = PricingTable::default();
        assert_eq!(table.storage_price("gemini-2.5-pro"), 4.5);
        assert_eq!(table.storage_price("gemini-2.5-flash"), 1.0);
        assert_eq!(table.input_price("gemini-2.5-flash-lite"), 0.10);
        assert!(table.validate().is_ok());
    }
}
