//! Token status-message parser
//!
//! Turns the free-form text posted by the token tracker bots into a flat
//! [`FeatureMap`]. Every field is produced by an entry of a declarative rule
//! table (see [`rules`]); fields the text does not mention fall back to the
//! rule's defaults, so the map is always total over [`FEATURE_NAMES`].
//!
//! Pipeline:
//! 1. Pattern rules (market cap, liquidity, volume, age, holders, ...)
//! 2. Fields the current message format never carries (constants)
//! 3. Derived features (log transforms, ratios, sums)

pub mod rules;
pub mod units;

use crate::error::ParseError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

pub use rules::{ExtractionRule, Fallback, RULES};

/// A single extracted value; integers stay integers in JSON output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Int(v) => v as f64,
            FeatureValue::Float(v) => v,
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            FeatureValue::Int(v) => serializer.serialize_i64(v),
            FeatureValue::Float(v) => serializer.serialize_f64(v),
        }
    }
}

/// Named features extracted from one message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureMap {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.values.get(name).copied()
    }

    /// Numeric view of a field, `None` when absent
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    /// Like [`get_f64`](Self::get_f64) but absent fields read as zero
    pub fn value(&self, name: &str) -> f64 {
        self.get_f64(name).unwrap_or(0.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, FeatureValue)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Fields the current message format never carries
pub const CONSTANT_FIELDS: &[(&str, FeatureValue)] = &[
    ("last_volume_multiplier", FeatureValue::Float(1.0)),
    ("insiders_count", FeatureValue::Int(0)),
    ("insiders_percent", FeatureValue::Float(0.0)),
    ("snipers_count", FeatureValue::Int(0)),
    ("bundle_total", FeatureValue::Int(0)),
    ("bundle_supply_percent", FeatureValue::Float(0.0)),
];

const PRIMARY_HOLDERS: [&str; 4] = [
    "green_holders",
    "blue_holders",
    "yellow_holders",
    "circle_holders",
];

/// Every key a successful parse produces
pub const FEATURE_NAMES: &[&str] = &[
    "market_cap",
    "liquidity",
    "volume_1min",
    "last_volume",
    "last_volume_multiplier",
    "token_age_numeric",
    "green_holders",
    "blue_holders",
    "yellow_holders",
    "circle_holders",
    "clown_holders",
    "sun_holders",
    "half_moon_holders",
    "dark_moon_holders",
    "total_holders",
    "top10_percent",
    "total_now_percent",
    "total_percent",
    "dev_holds_percent",
    "insiders_count",
    "insiders_percent",
    "snipers_count",
    "bundle_total",
    "bundle_supply_percent",
    "volume_to_liquidity",
    "log_market_cap",
    "log_liquidity",
    "log_volume_1min",
    "log_last_volume",
    "holder_concentration",
    "total_risk_percent",
];

/// Parse a token status message into features
pub fn parse_token_data(text: &str) -> Result<FeatureMap, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut features = FeatureMap::new();
    let mut matched = 0usize;

    for rule in RULES.iter() {
        if rule.apply(text, &mut features)? {
            matched += 1;
        }
    }

    for (name, value) in CONSTANT_FIELDS {
        features.insert(*name, *value);
    }

    add_derived_features(&mut features);

    debug!(
        "Parsed token text: {}/{} rules matched, {} features",
        matched,
        RULES.len(),
        features.len()
    );

    Ok(features)
}

/// Sum of the primary holder groups, saturating at `i64::MAX`
fn primary_holder_sum(features: &FeatureMap) -> i64 {
    PRIMARY_HOLDERS
        .iter()
        .map(|name| match features.get(name) {
            Some(FeatureValue::Int(v)) => v,
            Some(FeatureValue::Float(v)) => v as i64,
            None => 0,
        })
        .fold(0i64, i64::saturating_add)
}

fn add_derived_features(features: &mut FeatureMap) {
    let holder_sum = primary_holder_sum(features);

    if !features.contains("total_holders") {
        features.insert("total_holders", FeatureValue::Int(holder_sum));
    }

    let volume = features.value("volume_1min");
    let liquidity = features.value("liquidity");
    let market_cap = features.value("market_cap");

    // No distinct source for the previous volume in the current format
    features.insert("last_volume", FeatureValue::Float(volume));

    let volume_to_liquidity = if liquidity > 0.0 {
        volume.ln_1p() / (liquidity + 1.0).ln_1p()
    } else {
        0.0
    };
    features.insert(
        "volume_to_liquidity",
        FeatureValue::Float(volume_to_liquidity),
    );

    features.insert("log_market_cap", FeatureValue::Float(market_cap.ln_1p()));
    features.insert("log_liquidity", FeatureValue::Float(liquidity.ln_1p()));
    features.insert("log_volume_1min", FeatureValue::Float(volume.ln_1p()));
    features.insert("log_last_volume", FeatureValue::Float(volume.ln_1p()));

    features.insert("holder_concentration", FeatureValue::Int(holder_sum));

    let risk = features.value("dev_holds_percent") + features.value("insiders_percent");
    features.insert("total_risk_percent", FeatureValue::Float(risk));
}
