// src/catalog/fanout.rs

//! Fan-outs: one task template replicated over a list of values.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::errors::{CycledagError, Result};

/// Values a metatask iterates over.
///
/// `side_tables` carry values that move in lockstep with `values`, so every
/// table has the same length as `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanOut {
    pub metatask: String,
    pub var: String,
    pub values: Vec<String>,
    pub side_tables: BTreeMap<String, Vec<String>>,
}

impl FanOut {
    pub fn new(metatask: impl Into<String>, var: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            metatask: metatask.into(),
            var: var.into(),
            values,
            side_tables: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.side_tables.insert(name.into(), values);
        self
    }

    /// Variable names a templated path may reference inside this fan-out.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.var.as_str()).chain(self.side_tables.keys().map(String::as_str))
    }

    pub fn check(&self, task: &str) -> Result<()> {
        if self.values.is_empty() {
            return Err(CycledagError::InvalidFanOut {
                task: task.to_string(),
                reason: format!("metatask '{}' has no values for '{}'", self.metatask, self.var),
            });
        }
        for (name, table) in &self.side_tables {
            if table.len() != self.values.len() {
                return Err(CycledagError::InvalidFanOut {
                    task: task.to_string(),
                    reason: format!(
                        "side table '{name}' has {} entries for {} values",
                        table.len(),
                        self.values.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Split `domain` into `groups` contiguous, near-equal runs.
///
/// Leading runs take the remainder (40 items into 6 groups gives
/// 7,7,7,7,6,6). The group count is clamped to `1..=domain.len()`.
pub fn partition<T: Clone>(domain: &[T], groups: usize) -> Vec<Vec<T>> {
    if domain.is_empty() {
        return Vec::new();
    }
    let n = groups.clamp(1, domain.len());
    if n != groups {
        warn!(
            requested = groups,
            used = n,
            domain = domain.len(),
            "fan-out group count clamped to domain size"
        );
    }
    let (base, extra) = (domain.len() / n, domain.len() % n);
    let mut out = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let len = base + usize::from(i < extra);
        out.push(domain[start..start + len].to_vec());
        start += len;
    }
    out
}

/// Forecast hours `fhmin..=fhmax` every `fhout`.
pub fn hour_range(fhmin: i64, fhmax: i64, fhout: i64) -> Vec<i64> {
    if fhout <= 0 || fhmax < fhmin {
        return Vec::new();
    }
    (fhmin..=fhmax).step_by(fhout as usize).collect()
}

/// High-frequency hours followed by the regular-interval tail up to `fhmax`.
pub fn two_rate_hours(fhmin: i64, fhmax_hf: i64, fhout_hf: i64, fhmax: i64, fhout: i64) -> Vec<i64> {
    let mut hours = hour_range(fhmin, fhmax_hf.min(fhmax), fhout_hf);
    let tail_start = match hours.last() {
        Some(last) => last + fhout,
        None => fhmin,
    };
    hours.extend(hour_range(tail_start, fhmax, fhout));
    hours
}

/// Forecast-hour groups with their anchor and member tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourGroups {
    /// `001`, `002`, ...
    pub labels: Vec<String>,
    /// Last hour label of each group (`f006`).
    pub anchors: Vec<String>,
    /// Hour labels of each group joined with `_` (`f000_f003_f006`).
    pub lists: Vec<String>,
}

pub fn hour_groups(hours: &[i64], groups: usize) -> HourGroups {
    let labelled: Vec<String> = hours.iter().map(|h| format!("f{h:03}")).collect();
    let parts = partition(&labelled, groups);
    HourGroups {
        labels: (1..=parts.len()).map(|i| format!("{i:03}")).collect(),
        anchors: parts
            .iter()
            .filter_map(|p| p.last().cloned())
            .collect(),
        lists: parts.iter().map(|p| p.join("_")).collect(),
    }
}

/// Two-digit ensemble member-group labels.
///
/// `members / per_group` groups (at least one), numbered from `first`.
pub fn member_groups(members: u32, per_group: u32, first: u32) -> Vec<String> {
    let count = (members / per_group.max(1)).max(1);
    (first..first + count).map(|g| format!("{g:02}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forty_into_six() {
        let domain: Vec<u32> = (1..=40).collect();
        let parts = partition(&domain, 6);
        let sizes: Vec<_> = parts.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![7, 7, 7, 7, 6, 6]);
        let anchors: Vec<_> = parts.iter().map(|p| *p.last().unwrap()).collect();
        assert_eq!(anchors, vec![7, 14, 21, 28, 34, 40]);
    }

    #[test]
    fn group_count_is_clamped() {
        assert_eq!(partition(&[1, 2], 5).len(), 2);
        assert_eq!(partition(&[1, 2, 3], 0), vec![vec![1, 2, 3]]);
        assert!(partition::<u8>(&[], 3).is_empty());
    }

    #[test]
    fn gfs_hours_switch_rate_after_high_frequency_window() {
        let hours = two_rate_hours(0, 6, 3, 24, 6);
        assert_eq!(hours, vec![0, 3, 6, 12, 18, 24]);
    }

    #[test]
    fn hour_groups_label_anchor_and_list() {
        let g = hour_groups(&[0, 3, 6, 9, 12], 2);
        assert_eq!(g.labels, vec!["001", "002"]);
        assert_eq!(g.anchors, vec!["f006", "f012"]);
        assert_eq!(g.lists, vec!["f000_f003_f006", "f009_f012"]);
    }

    #[test]
    fn member_group_labels() {
        assert_eq!(member_groups(80, 10, 1).len(), 8);
        assert_eq!(member_groups(80, 10, 1)[0], "01");
        assert_eq!(member_groups(4, 10, 0), vec!["00"]);
    }

    #[test]
    fn side_table_length_mismatch_is_rejected() {
        let f = FanOut::new("gdaspost", "grp", vec!["001".into(), "002".into()])
            .with_table("dep", vec!["f006".into()]);
        assert!(matches!(
            f.check("gdaspost"),
            Err(CycledagError::InvalidFanOut { .. })
        ));
    }
}
