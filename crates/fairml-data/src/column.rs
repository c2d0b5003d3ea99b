//! Named columns and tables.

use std::collections::BTreeSet;

use crate::error::DataError;

/// A single table column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Continuous or integer-valued attribute.
    Numeric(Vec<f64>),
    /// String-valued attribute; passed through bucketization unchanged.
    Categorical(Vec<String>),
}

impl Column {
    /// Build a numeric column.
    #[must_use]
    pub fn numeric(values: Vec<f64>) -> Self {
        Self::Numeric(values)
    }

    /// Build a categorical column from anything string-like.
    pub fn categorical<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categorical(values.into_iter().map(Into::into).collect())
    }

    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    /// Return `true` if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return `true` for numeric columns.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Return the number of distinct values.
    #[must_use]
    pub fn n_unique(&self) -> usize {
        match self {
            Column::Numeric(v) => {
                let mut sorted = v.clone();
                sorted.sort_unstable_by(f64::total_cmp);
                sorted.dedup_by(|a, b| a.total_cmp(b).is_eq());
                sorted.len()
            }
            Column::Categorical(v) => v.iter().collect::<BTreeSet<_>>().len(),
        }
    }

    /// Render row `row` as text.
    #[must_use]
    pub fn display_value(&self, row: usize) -> String {
        match self {
            Column::Numeric(v) => format!("{}", v[row]),
            Column::Categorical(v) => v[row].clone(),
        }
    }

    /// Return a new column holding the rows at `indices`, in that order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        match self {
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A table of named, equal-length columns in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style.
    ///
    /// # Errors
    ///
    /// Same as [`Table::push_column`].
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self, DataError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::DuplicateColumn`] | A column with this name exists |
    /// | [`DataError::ColumnLengthMismatch`] | Length differs from existing columns |
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), DataError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(DataError::DuplicateColumn { name });
        }
        if let Some(first) = self.columns.first()
            && first.len() != column.len()
        {
            return Err(DataError::ColumnLengthMismatch {
                name,
                expected: first.len(),
                got: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Return the number of rows (0 for a table without columns).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Return the column names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over `(name, column)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Look up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownColumn`] if no column has this name.
    pub fn column(&self, name: &str) -> Result<&Column, DataError> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Return a copy of the table without the named column.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownColumn`] if no column has this name.
    pub fn drop(&self, name: &str) -> Result<Table, DataError> {
        let position = self.position(name)?;
        let mut table = self.clone();
        table.names.remove(position);
        table.columns.remove(position);
        Ok(table)
    }

    /// Remove the named column and return it.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownColumn`] if no column has this name.
    pub fn pop(&mut self, name: &str) -> Result<Column, DataError> {
        let position = self.position(name)?;
        self.names.remove(position);
        Ok(self.columns.remove(position))
    }

    /// Return a new table holding the rows at `indices`.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(indices)).collect(),
        }
    }

    fn position(&self, name: &str) -> Result<usize, DataError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DataError::UnknownColumn {
                name: name.to_string(),
            })
    }
}

/// Convert a 0/1 column into class labels.
///
/// Numeric columns must hold exactly `0.0` or `1.0`; categorical columns
/// must hold `"0"` or `"1"`.
///
/// # Errors
///
/// Returns [`DataError::NonBinaryLabel`] for the first other value.
pub fn binary_labels(column: &Column) -> Result<Vec<usize>, DataError> {
    let parse = |row_index: usize, value: Option<usize>| {
        value.ok_or_else(|| DataError::NonBinaryLabel {
            row_index,
            value: column.display_value(row_index),
        })
    };
    match column {
        Column::Numeric(values) => values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let label = if v == 0.0 {
                    Some(0)
                } else if v == 1.0 {
                    Some(1)
                } else {
                    None
                };
                parse(i, label)
            })
            .collect(),
        Column::Categorical(values) => values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let label = match v.trim() {
                    "0" => Some(0),
                    "1" => Some(1),
                    _ => None,
                };
                parse(i, label)
            })
            .collect(),
    }
}
