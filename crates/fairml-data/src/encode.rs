//! One-hot encoding into a row-major feature matrix.

use std::collections::BTreeSet;

use crate::column::{Column, Table};
use crate::error::DataError;

/// Named, row-major feature matrix: `rows[sample][feature]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create a feature matrix, validating row widths.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::FeatureCountMismatch`] for the first row whose
    /// width differs from `names.len()`.
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, DataError> {
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(DataError::FeatureCountMismatch {
                    expected: names.len(),
                    got: row.len(),
                    row_index,
                });
            }
        }
        Ok(Self { names, rows })
    }

    /// Return the feature names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Return a matrix holding the rows at `indices`.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// One-hot encode a table.
///
/// Numeric columns pass through. A categorical column `c` becomes one
/// indicator column `c_v` per distinct value `v`, in sorted value order.
#[must_use]
pub fn one_hot(table: &Table) -> FeatureMatrix {
    let n_rows = table.n_rows();
    let mut names = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (name, column) in table.iter() {
        match column {
            Column::Numeric(values) => {
                names.push(name.to_string());
                columns.push(values.clone());
            }
            Column::Categorical(values) => {
                let levels: BTreeSet<&String> = values.iter().collect();
                for level in levels {
                    names.push(format!("{name}_{level}"));
                    columns.push(
                        values
                            .iter()
                            .map(|v| if v == level { 1.0 } else { 0.0 })
                            .collect(),
                    );
                }
            }
        }
    }

    let rows = (0..n_rows)
        .map(|r| columns.iter().map(|c| c[r]).collect())
        .collect();

    FeatureMatrix { names, rows }
}
