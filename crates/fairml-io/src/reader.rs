//! Delimited-text table reader with column type inference.

use std::path::{Path, PathBuf};

use fairml_data::{Column, Table};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads a delimited text file with a header row into a [`Table`].
///
/// - Cells are trimmed.
/// - A column is numeric when every cell parses as a finite float,
///   otherwise it is categorical.
/// - A leading column with an empty header is a saved row index and is
///   dropped.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different cell count than header |
/// | [`IoError::Data`] | Duplicate column name |
pub struct TableReader {
    path: PathBuf,
    delimiter: u8,
}

impl TableReader {
    /// Create a comma-delimited reader for the given file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: b',',
        }
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read the file and infer column types.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Table, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that short rows surface as InconsistentRowLength.
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header: Vec<String> = rdr
            .headers()
            .map_err(|e| self.parse_error(e))?
            .iter()
            .map(str::to_string)
            .collect();
        let expected = header.len();
        let skip_index = header.first().is_some_and(String::is_empty);
        debug!(expected, skip_index, "read header");

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); expected];
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;
            if record.len() != expected {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected,
                    got: record.len(),
                });
            }
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        let n_rows = cells.first().map_or(0, Vec::len);
        if n_rows == 0 {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let first = usize::from(skip_index);
        let mut table = Table::new();
        for (name, raw) in header.into_iter().zip(cells).skip(first) {
            table.push_column(name, infer_column(raw))?;
        }

        info!(
            n_rows,
            n_columns = table.n_columns(),
            n_numeric = table.iter().filter(|(_, c)| c.is_numeric()).count(),
            "table loaded"
        );
        Ok(table)
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

fn infer_column(raw: Vec<String>) -> Column {
    let parsed: Option<Vec<f64>> = raw
        .iter()
        .map(|cell| cell.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();
    match parsed {
        Some(values) => Column::numeric(values),
        None => Column::categorical(raw),
    }
}
