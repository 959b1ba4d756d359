// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The per-VM memory overhead table.
//!
//! `Theta(m)` is the memory-overhead coefficient of one VM configured with
//! `m` GB. Only the memory sizes present in the table are candidates for
//! the allocation search.
//!
//! In configuration files the table is a map with string keys, since TOML
//! and JSON keys are always strings:
//!
//! ```toml
//! theta = { "4" = 0.6, "8" = 0.9, "16" = 1.4 }
//! ```

use crate::AllocError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Memory size (GB) → overhead coefficient, iterated in ascending size.
///
/// The order in which a config file lists its sizes is not kept. The
/// allocation search keeps the first of several equal-gain pairs, so on a
/// tie the smallest memory size wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ThetaTable {
    entries: BTreeMap<u32, f64>,
}

impl ThetaTable {
    /// Builds a table, rejecting zero sizes and non-positive coefficients.
    pub fn new(entries: BTreeMap<u32, f64>) -> Result<Self, AllocError> {
        for (&m, &theta) in &entries {
            if m == 0 {
                return Err(AllocError::InvalidConfig(
                    "Theta table has a 0 GB entry".into(),
                ));
            }
            if !theta.is_finite() || theta <= 0.0 {
                return Err(AllocError::InvalidConfig(format!(
                    "Theta({m}) = {theta} must be a positive number"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Returns `Theta(m)`.
    ///
    /// # Errors
    /// [`AllocError::MissingTheta`] if `m` is not in the table.
    pub fn get(&self, memory_gb: u32) -> Result<f64, AllocError> {
        self.entries
            .get(&memory_gb)
            .copied()
            .ok_or(AllocError::MissingTheta { memory_gb })
    }

    pub fn contains(&self, memory_gb: u32) -> bool {
        self.entries.contains_key(&memory_gb)
    }

    /// Candidate memory sizes in ascending order.
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().map(|(&m, &t)| (m, t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, f64>> for ThetaTable {
    type Error = AllocError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut entries = BTreeMap::new();
        for (key, theta) in raw {
            let m: u32 = key.trim().parse().map_err(|_| {
                AllocError::InvalidConfig(format!(
                    "Theta key '{key}' is not a memory size in GB"
                ))
            })?;
            entries.insert(m, theta);
        }
        Self::new(entries)
    }
}

impl From<ThetaTable> for BTreeMap<String, f64> {
    fn from(table: ThetaTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(m, t)| (m.to_string(), t))
            .collect()
    }
}

impl FromIterator<(u32, f64)> for ThetaTable {
    /// Collects without validation; prefer [`ThetaTable::new`] for
    /// untrusted input.
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_keys() {
        let t: ThetaTable = serde_json::from_str(r#"{"16": 1.4, "4": 0.6, "8": 0.9}"#).unwrap();
        assert_eq!(t.sizes().collect::<Vec<_>>(), vec![4, 8, 16]);
        assert_eq!(t.get(8).unwrap(), 0.9);
    }

    #[test]
    fn test_missing_entry() {
        let t: ThetaTable = [(4, 0.5)].into_iter().collect();
        assert!(matches!(t.get(8), Err(AllocError::MissingTheta { memory_gb: 8 })));
    }

    #[test]
    fn test_bad_key_rejected() {
        let err = serde_json::from_str::<ThetaTable>(r#"{"eight": 0.9}"#).unwrap_err();
        assert!(err.to_string().contains("eight"));
    }

    #[test]
    fn test_non_positive_rejected() {
        assert!(ThetaTable::new(BTreeMap::from([(4, 0.0)])).is_err());
        assert!(ThetaTable::new(BTreeMap::from([(0, 1.0)])).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let t = ThetaTable::new(BTreeMap::from([(4, 0.6), (32, 2.2)])).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        let back: ThetaTable = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
