//! Discrete group codes for sensitive and control attributes.

use std::collections::BTreeSet;

use crate::column::Column;

/// A derived column mapping every row to a discrete group.
///
/// Levels are sorted (numerically for numeric columns, lexicographically
/// for categorical ones) and rendered as text; `codes[row]` indexes into
/// `levels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    name: String,
    levels: Vec<String>,
    codes: Vec<usize>,
}

impl Grouping {
    /// Derive a grouping from a (typically bucketized) column.
    pub fn from_column(name: impl Into<String>, column: &Column) -> Self {
        let (levels, codes) = match column {
            Column::Numeric(values) => {
                let mut distinct = values.clone();
                distinct.sort_unstable_by(f64::total_cmp);
                distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());
                let codes = values
                    .iter()
                    .map(|v| {
                        distinct
                            .binary_search_by(|probe| probe.total_cmp(v))
                            .unwrap_or_default()
                    })
                    .collect();
                let levels = distinct.iter().map(|v| format!("{v}")).collect();
                (levels, codes)
            }
            Column::Categorical(values) => {
                let distinct: Vec<&String> = values.iter().collect::<BTreeSet<_>>().into_iter().collect();
                let codes = values
                    .iter()
                    .map(|v| distinct.binary_search(&v).unwrap_or_default())
                    .collect();
                let levels = distinct.into_iter().cloned().collect();
                (levels, codes)
            }
        };
        Self {
            name: name.into(),
            levels,
            codes,
        }
    }

    /// Return the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the sorted group levels.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Return the per-row level codes.
    #[must_use]
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    /// Return the number of levels.
    #[must_use]
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Return `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Return the level of row `row`.
    #[must_use]
    pub fn level_of(&self, row: usize) -> &str {
        &self.levels[self.codes[row]]
    }

    /// Return a grouping over the rows at `indices`, keeping every level.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            levels: self.levels.clone(),
            codes: indices.iter().map(|&i| self.codes[i]).collect(),
        }
    }
}
