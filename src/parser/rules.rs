//! Declarative extraction rules
//!
//! Each rule names the fields it fills, the patterns tried in order (first
//! match wins), how capture groups become values, and what to write when no
//! pattern matches. Adding a field is an edit to [`RULE_SPECS`].

use super::units::{duration_minutes, parse_count, parse_money, parse_number};
use super::{FeatureMap, FeatureValue};
use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Turns the captures of a matched pattern into one value per field
pub type Converter = fn(&'static [&'static str], &Captures<'_>) -> Result<Vec<FeatureValue>, ParseError>;

/// What a rule writes when none of its patterns match
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    Constant(&'static [FeatureValue]),
    /// Fields stay unset and are computed from other features afterwards
    Derived,
}

/// Static description of a rule, compiled into [`ExtractionRule`]
pub struct RuleSpec {
    pub fields: &'static [&'static str],
    pub patterns: &'static [&'static str],
    pub convert: Converter,
    pub fallback: Fallback,
}

pub const RULE_SPECS: &[RuleSpec] = &[
    // "MC: $136.8K"
    RuleSpec {
        fields: &["market_cap"],
        patterns: &[r"(?i)MC:\s*\$?([0-9,.]+)([KMB]?)"],
        convert: money,
        fallback: Fallback::Constant(&[FeatureValue::Int(0)]),
    },
    // "Liq: $42.4K / SOL pooled: 111.02"
    RuleSpec {
        fields: &["liquidity"],
        patterns: &[r"(?i)Liq:\s*\$?([0-9,.]+)([KMB]?)"],
        convert: money,
        fallback: Fallback::Constant(&[FeatureValue::Int(0)]),
    },
    // "1 min: ... Volume: $12,129.12", else the 5 min block
    RuleSpec {
        fields: &["volume_1min"],
        patterns: &[
            r"(?s)1 min:.*?Volume:\s*\$?([0-9,.]+)",
            r"(?s)5 min:.*?Volume:\s*\$?([0-9,.]+)",
        ],
        convert: floats,
        fallback: Fallback::Constant(&[FeatureValue::Int(0)]),
    },
    // "Token age: 1h 5m 30s", every part optional
    RuleSpec {
        fields: &["token_age_numeric"],
        patterns: &[r"(?i)Token age:\s*(?:([0-9]+)h\s*)?(?:([0-9]+)m\s*)?(?:([0-9]+)s\s*)?"],
        convert: age_minutes,
        fallback: Fallback::Constant(&[FeatureValue::Int(0)]),
    },
    // "🟢: 8 | 🔵: 5 | 🟡: 12 | ⭕️: 42", all four or nothing
    RuleSpec {
        fields: &[
            "green_holders",
            "blue_holders",
            "yellow_holders",
            "circle_holders",
        ],
        patterns: &[r"🟢:\s*([0-9]+)\s*\|\s*🔵:\s*([0-9]+)\s*\|\s*🟡:\s*([0-9]+)\s*\|\s*⭕\x{FE0F}?:\s*([0-9]+)"],
        convert: counts,
        fallback: Fallback::Constant(&[FeatureValue::Int(0); 4]),
    },
    // "🤡: 0 | 🌞: 0 | 🌗: 0 | 🌚: 3"
    RuleSpec {
        fields: &[
            "clown_holders",
            "sun_holders",
            "half_moon_holders",
            "dark_moon_holders",
        ],
        patterns: &[r"🤡:\s*([0-9]+)\s*\|\s*🌞:\s*([0-9]+)\s*\|\s*🌗:\s*([0-9]+)\s*\|\s*🌚:\s*([0-9]+)"],
        convert: counts,
        fallback: Fallback::Constant(&[FeatureValue::Int(0); 4]),
    },
    // "Total: 168"
    RuleSpec {
        fields: &["total_holders"],
        patterns: &[r"Total:\s*([0-9]+)"],
        convert: counts,
        fallback: Fallback::Derived,
    },
    // "Top 10: 23%"
    RuleSpec {
        fields: &["top10_percent"],
        patterns: &[r"Top 10:\s*([0-9.]+)%"],
        convert: floats,
        fallback: Fallback::Constant(&[FeatureValue::Float(50.0)]),
    },
    // "Current/Initial: 16.76% / 98.87%"
    RuleSpec {
        fields: &["total_now_percent", "total_percent"],
        patterns: &[r"Current/Initial:\s*([0-9.]+)%\s*/\s*([0-9.]+)%"],
        convert: floats,
        fallback: Fallback::Constant(&[FeatureValue::Float(50.0), FeatureValue::Float(100.0)]),
    },
    // "Dev current balance: 0%"
    RuleSpec {
        fields: &["dev_holds_percent"],
        patterns: &[r"Dev current balance:\s*([0-9.]+)%"],
        convert: floats,
        fallback: Fallback::Constant(&[FeatureValue::Float(0.0)]),
    },
];

/// A [`RuleSpec`] with its patterns compiled
pub struct ExtractionRule {
    pub fields: &'static [&'static str],
    patterns: Vec<Regex>,
    convert: Converter,
    pub fallback: Fallback,
}

pub static RULES: Lazy<Vec<ExtractionRule>> =
    Lazy::new(|| RULE_SPECS.iter().map(ExtractionRule::compile).collect());

impl ExtractionRule {
    fn compile(spec: &RuleSpec) -> Self {
        let patterns = spec
            .patterns
            .iter()
            .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("bad built-in pattern {p}: {e}")))
            .collect();

        Self {
            fields: spec.fields,
            patterns,
            convert: spec.convert,
            fallback: spec.fallback,
        }
    }

    /// Write this rule's fields into `out`; returns whether a pattern matched
    pub fn apply(&self, text: &str, out: &mut FeatureMap) -> Result<bool, ParseError> {
        let Some(caps) = self.patterns.iter().find_map(|re| re.captures(text)) else {
            if let Fallback::Constant(defaults) = self.fallback {
                for (name, value) in self.fields.iter().zip(defaults) {
                    out.insert(*name, *value);
                }
            }
            return Ok(false);
        };

        let values = (self.convert)(self.fields, &caps)?;
        for (name, value) in self.fields.iter().zip(values) {
            out.insert(*name, value);
        }

        Ok(true)
    }
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map(|m| m.as_str()).unwrap_or("")
}

fn money(fields: &'static [&'static str], caps: &Captures<'_>) -> Result<Vec<FeatureValue>, ParseError> {
    let value = parse_money(fields[0], group(caps, 1), group(caps, 2))?;
    Ok(vec![FeatureValue::Float(value)])
}

fn floats(fields: &'static [&'static str], caps: &Captures<'_>) -> Result<Vec<FeatureValue>, ParseError> {
    fields
        .iter()
        .enumerate()
        .map(|(i, &field)| parse_number(field, group(caps, i + 1)).map(FeatureValue::Float))
        .collect()
}

fn counts(fields: &'static [&'static str], caps: &Captures<'_>) -> Result<Vec<FeatureValue>, ParseError> {
    fields
        .iter()
        .enumerate()
        .map(|(i, &field)| parse_count(field, group(caps, i + 1)).map(FeatureValue::Int))
        .collect()
}

fn age_minutes(fields: &'static [&'static str], caps: &Captures<'_>) -> Result<Vec<FeatureValue>, ParseError> {
    let part = |i: usize| match caps.get(i) {
        Some(m) => parse_count(fields[0], m.as_str()),
        None => Ok(0),
    };
    let minutes = duration_minutes(part(1)?, part(2)?, part(3)?);
    Ok(vec![FeatureValue::Float(minutes)])
}
