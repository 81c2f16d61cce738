//! Configured amounts: a flat number or a table keyed by region, status or coverage level

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Lookup key used to resolve keyed amounts for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountKey<'a> {
    pub region: &'a str,
    pub status: &'a str,
    pub coverage_level: &'a str,
}

/// An amount that is either flat or keyed
///
/// JSON accepts either a bare number or an object such as
/// `{"byRegion": {"north": 1200}, "default": 1500}`. Table values are
/// themselves amounts, so keys can be nested (region, then coverage level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Flat(f64),
    Keyed(KeyedAmount),
}

/// Keyed amount table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyedAmount {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_region: BTreeMap<String, Amount>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_status: BTreeMap<String, Amount>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_coverage_level: BTreeMap<String, Amount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Box<Amount>>,
}

impl Amount {
    /// Look up the amount, trying region, then status, then coverage level, then the default
    pub fn lookup(&self, key: &AmountKey<'_>) -> Option<f64> {
        match self {
            Amount::Flat(value) => Some(*value),
            Amount::Keyed(table) => table.lookup(key),
        }
    }

    /// Resolve the amount or fail with a contract violation naming `what`
    pub fn resolve(&self, key: &AmountKey<'_>, what: &str) -> Result<f64> {
        self.lookup(key).ok_or_else(|| EngineError::MissingAmount {
            what: what.to_string(),
            region: key.region.to_string(),
            status: key.status.to_string(),
            coverage_level: key.coverage_level.to_string(),
        })
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Flat(value)
    }
}

impl KeyedAmount {
    fn lookup(&self, key: &AmountKey<'_>) -> Option<f64> {
        self.by_region
            .get(key.region)
            .and_then(|a| a.lookup(key))
            .or_else(|| self.by_status.get(key.status).and_then(|a| a.lookup(key)))
            .or_else(|| {
                self.by_coverage_level
                    .get(key.coverage_level)
                    .and_then(|a| a.lookup(key))
            })
            .or_else(|| self.default.as_ref().and_then(|a| a.lookup(key)))
    }
}
