use serde::{Deserialize, Serialize};
use skillgov_core::OrdinalLabel;
use std::collections::{BTreeMap, BTreeSet};

/// One row of the coherence table: an appraisal tuple and the skills it
/// admits. An empty `allowed` set means "only the default skill".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    pub labels: Vec<OrdinalLabel>,
    #[serde(default)]
    pub allowed: BTreeSet<String>,
}

/// Declarative mapping from appraisal-label tuples to admissible skill
/// sets, loaded from configuration per agent type.
///
/// Lookup substitutes the scale midpoint for missing dimensions, and falls
/// back to the nearest declared tuple by Hamming distance when the exact
/// tuple is absent. Ties resolve by smallest total ordinal distance, then
/// by lexicographically smallest tuple; fully deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RuleEntry>", into = "Vec<RuleEntry>")]
pub struct RuleTable {
    rules: BTreeMap<Vec<OrdinalLabel>, BTreeSet<String>>,
}

impl From<Vec<RuleEntry>> for RuleTable {
    fn from(entries: Vec<RuleEntry>) -> Self {
        let mut rules = BTreeMap::new();
        for entry in entries {
            rules.insert(entry.labels, entry.allowed);
        }
        Self { rules }
    }
}

impl From<RuleTable> for Vec<RuleEntry> {
    fn from(table: RuleTable) -> Self {
        table
            .rules
            .into_iter()
            .map(|(labels, allowed)| RuleEntry { labels, allowed })
            .collect()
    }
}

impl RuleTable {
    pub fn new(entries: Vec<RuleEntry>) -> Self {
        entries.into()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of dimensions the table's tuples carry.
    pub fn arity(&self) -> usize {
        self.rules.keys().next().map(Vec::len).unwrap_or(0)
    }

    /// The admissible skill set for `tuple`, via exact match or the
    /// nearest-tuple fallback. Returns `None` only for an empty table.
    pub fn admissible(&self, tuple: &[OrdinalLabel]) -> Option<&BTreeSet<String>> {
        if let Some(allowed) = self.rules.get(tuple) {
            return Some(allowed);
        }
        self.rules
            .iter()
            .min_by_key(|(labels, _)| {
                (
                    hamming(labels, tuple),
                    ordinal_distance(labels, tuple),
                    ranks(labels),
                )
            })
            .map(|(_, allowed)| allowed)
    }
}

/// Count of differing positions.
fn hamming(a: &[OrdinalLabel], b: &[OrdinalLabel]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
        + a.len().abs_diff(b.len())
}

/// Sum of absolute rank differences, for tie-breaking among equally
/// Hamming-distant tuples.
fn ordinal_distance(a: &[OrdinalLabel], b: &[OrdinalLabel]) -> u32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| u32::from(x.rank().abs_diff(y.rank())))
        .sum()
}

fn ranks(labels: &[OrdinalLabel]) -> Vec<u8> {
    labels.iter().map(|l| l.rank()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrdinalLabel::{High, Low, Medium, VeryHigh};

    fn table() -> RuleTable {
        RuleTable::new(vec![
            RuleEntry {
                labels: vec![High, High],
                allowed: ["elevate_house".to_string(), "buy_insurance".to_string()]
                    .into_iter()
                    .collect(),
            },
            RuleEntry {
                labels: vec![Low, Low],
                allowed: ["do_nothing".to_string()].into_iter().collect(),
            },
            RuleEntry {
                labels: vec![High, Low],
                allowed: BTreeSet::new(),
            },
        ])
    }

    #[test]
    fn test_exact_match() {
        let table = table();
        let allowed = table.admissible(&[High, High]).unwrap();
        assert!(allowed.contains("elevate_house"));
        assert!(allowed.contains("buy_insurance"));
    }

    #[test]
    fn test_nearest_tuple_by_hamming() {
        let table = table();
        // (VH, H) differs from (H, H) in one position, from (L, L) in two.
        let allowed = table.admissible(&[VeryHigh, High]).unwrap();
        assert!(allowed.contains("elevate_house"));
    }

    #[test]
    fn test_hamming_tie_breaks_by_ordinal_distance() {
        // (M, L) is Hamming-1 from both (L, L) and (H, L); ordinal distance
        // is 1 to each, so the lexicographically smaller tuple (L, L) wins.
        let table = table();
        let allowed = table.admissible(&[Medium, Low]).unwrap();
        assert!(allowed.contains("do_nothing"));
    }

    #[test]
    fn test_empty_allowed_set_preserved() {
        let table = table();
        assert!(table.admissible(&[High, Low]).unwrap().is_empty());
    }

    #[test]
    fn test_empty_table_returns_none() {
        let table = RuleTable::default();
        assert!(table.admissible(&[High, High]).is_none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&table()).unwrap();
        let back: RuleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.admissible(&[High, High]),
            table().admissible(&[High, High])
        );
    }
}
