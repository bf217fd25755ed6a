//! Header dictionary construction.

use std::collections::BTreeMap;

use tracing::debug;

use ud_model::PropertyConfig;

/// Which branch of a rule a canonical name reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Rule without a negative companion: the raw cell is always read.
    Plain,
    /// Primary name of a sign-split rule: read only for non-negative cells.
    Positive,
    /// Companion name of a sign-split rule: read only for negative cells.
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    positions: Vec<usize>,
    branch: Branch,
}

/// Canonical column name to source column positions, for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    entries: BTreeMap<String, IndexEntry>,
    unmatched: Vec<String>,
}

impl HeaderIndex {
    /// Resolve `headers` against the mapping rules.
    ///
    /// A header cell matches a rule when it equals the rule's source name.
    /// Matched positions are appended under the canonical name; a companion
    /// name is registered at the same position, replacing earlier positions.
    /// Unmatched cells are recorded and logged at debug level.
    pub fn build(headers: &[String], config: &PropertyConfig) -> Self {
        let mut index = Self::default();
        for (position, header) in headers.iter().enumerate() {
            let Some(rule) = config.mappings.get(header) else {
                debug!(header = %header, position, "header cell has no mapping rule");
                index.unmatched.push(header.clone());
                continue;
            };
            let negative = rule.negative_name();
            let branch = if negative.is_some() {
                Branch::Positive
            } else {
                Branch::Plain
            };
            index
                .entries
                .entry(rule.name.clone())
                .and_modify(|entry| {
                    entry.positions.push(position);
                    entry.branch = branch;
                })
                .or_insert_with(|| IndexEntry {
                    positions: vec![position],
                    branch,
                });
            if let Some(negative) = negative {
                index.entries.insert(
                    negative.to_string(),
                    IndexEntry {
                        positions: vec![position],
                        branch: Branch::Negative,
                    },
                );
            }
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Positions registered for a canonical name (exact match).
    pub fn positions(&self, name: &str) -> &[usize] {
        self.entries
            .get(name)
            .map(|entry| entry.positions.as_slice())
            .unwrap_or_default()
    }

    pub fn branch(&self, name: &str) -> Option<Branch> {
        self.entries.get(name).map(|entry| entry.branch)
    }

    /// Canonical names with their branch and positions, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Branch, &[usize])> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.branch, entry.positions.as_slice()))
    }

    /// Header cells that matched no rule, in header order.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    /// Canonical name a physical column is read under for a given raw cell.
    ///
    /// Sign-split columns resolve to the companion name when the cell is
    /// negative, otherwise to the primary name.
    pub fn name_for_column(&self, position: usize, raw: &str) -> Option<&str> {
        let negative = raw.trim_start().starts_with('-');
        let mut fallback = None;
        for (name, entry) in &self.entries {
            if !entry.positions.contains(&position) {
                continue;
            }
            match (entry.branch, negative) {
                (Branch::Negative, true) | (Branch::Positive, false) | (Branch::Plain, _) => {
                    return Some(name.as_str());
                }
                _ => fallback = fallback.or(Some(name.as_str())),
            }
        }
        fallback
    }
}

/// Positions of raw header cells equal to `name`, ignoring ASCII case.
pub fn column_positions(headers: &[String], name: &str) -> Vec<usize> {
    let name = name.trim();
    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| header.eq_ignore_ascii_case(name))
        .map(|(position, _)| position)
        .collect()
}
