//! YAML audit settings: shared defaults plus per-dataset entries.
//!
//! ```yaml
//! default:
//!   clf_metric_name: accuracy
//!   num_of_mitigated_features: 1
//! datasets:
//!   german-credit:
//!     path: data/german.csv
//!     label: y
//!     positive_label: 2
//!     optional_sensitive_features: [Sex, Age]
//!     control_feature: Job
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use fairml_audit::AuditConfig;
use fairml_data::{Column, Table};
use fairml_metrics::QualityMetric;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::reader::TableReader;

/// Audit options settable both as defaults and per dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuditOptions {
    /// Candidate sensitive attributes.
    pub optional_sensitive_features: Option<Vec<String>>,
    /// Attribute whose strata the fairness metric is computed within.
    pub control_feature: Option<String>,
    /// Quality metric scorer name.
    pub clf_metric_name: Option<String>,
    /// How many of the most unfair attributes to report.
    pub num_of_mitigated_features: Option<usize>,
    /// Number of grid-search points.
    pub grid_size: Option<usize>,
    /// Boosting rounds of the baseline classifier.
    pub n_estimators: Option<usize>,
}

impl AuditOptions {
    /// Fill every unset option from `defaults`.
    #[must_use]
    pub fn or(self, defaults: &AuditOptions) -> AuditOptions {
        AuditOptions {
            optional_sensitive_features: self
                .optional_sensitive_features
                .or_else(|| defaults.optional_sensitive_features.clone()),
            control_feature: self
                .control_feature
                .or_else(|| defaults.control_feature.clone()),
            clf_metric_name: self
                .clf_metric_name
                .or_else(|| defaults.clf_metric_name.clone()),
            num_of_mitigated_features: self
                .num_of_mitigated_features
                .or(defaults.num_of_mitigated_features),
            grid_size: self.grid_size.or(defaults.grid_size),
            n_estimators: self.n_estimators.or(defaults.n_estimators),
        }
    }
}

/// Value of the label column that denotes the positive class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// A numeric class value such as `2`.
    Number(f64),
    /// A textual class value such as `yes`.
    Text(String),
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelValue::Number(v) => write!(f, "{v}"),
            LabelValue::Text(s) => f.write_str(s),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_label() -> String {
    "y".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct DatasetEntry {
    path: PathBuf,
    #[serde(default = "default_delimiter")]
    delimiter: char,
    #[serde(default = "default_label")]
    label: String,
    #[serde(default)]
    positive_label: Option<LabelValue>,
    #[serde(flatten)]
    options: AuditOptions,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    default: AuditOptions,
    datasets: BTreeMap<String, DatasetEntry>,
}

/// A parsed settings file.
#[derive(Debug)]
pub struct Settings {
    base_dir: PathBuf,
    defaults: AuditOptions,
    datasets: BTreeMap<String, DatasetEntry>,
}

impl Settings {
    /// Load a settings file. Dataset paths are resolved against the
    /// directory containing it.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SettingsRead`] | File cannot be read |
    /// | [`IoError::SettingsParse`] | Invalid YAML or missing required keys |
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, IoError> {
        let text = std::fs::read_to_string(path).map_err(|e| IoError::SettingsRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: SettingsFile =
            serde_yaml::from_str(&text).map_err(|e| IoError::SettingsParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(n_datasets = file.datasets.len(), "settings parsed");
        Ok(Self {
            base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            defaults: file.default,
            datasets: file.datasets,
        })
    }

    /// Return the shared defaults.
    #[must_use]
    pub fn defaults(&self) -> &AuditOptions {
        &self.defaults
    }

    /// Return the configured dataset names in sorted order.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// Resolve the entry for `name`, with its options merged over the
    /// defaults (dataset keys win).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::UnknownDataset`] | No entry named `name` |
    /// | [`IoError::InvalidDelimiter`] | Delimiter is not one ASCII character |
    pub fn dataset(&self, name: &str) -> Result<DatasetSettings, IoError> {
        let entry = self
            .datasets
            .get(name)
            .ok_or_else(|| IoError::UnknownDataset {
                name: name.to_string(),
                known: self.dataset_names().collect::<Vec<_>>().join(", "),
            })?;
        let delimiter = u8::try_from(entry.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| IoError::InvalidDelimiter {
                name: name.to_string(),
                delimiter: entry.delimiter,
            })?;
        Ok(DatasetSettings {
            name: name.to_string(),
            path: self.base_dir.join(&entry.path),
            delimiter,
            label: entry.label.clone(),
            positive_label: entry.positive_label.clone(),
            options: entry.options.clone().or(&self.defaults),
        })
    }
}

/// Everything needed to load and audit one dataset.
#[derive(Debug, Clone)]
pub struct DatasetSettings {
    name: String,
    path: PathBuf,
    delimiter: u8,
    label: String,
    positive_label: Option<LabelValue>,
    options: AuditOptions,
}

impl DatasetSettings {
    // --- Getters ---

    /// Return the dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the resolved data file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the label column name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Return the positive class value, if the label needs encoding.
    #[must_use]
    pub fn positive_label(&self) -> Option<&LabelValue> {
        self.positive_label.as_ref()
    }

    /// Return the merged options.
    #[must_use]
    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Build the audit configuration from the merged options. `seed`
    /// overrides the split seed when given.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::MissingSensitiveFeatures`] | No candidate attributes configured |
    /// | [`IoError::Metrics`] | Unknown `clf_metric_name` |
    /// | [`IoError::Audit`] | Empty candidate list |
    pub fn audit_config(&self, seed: Option<u64>) -> Result<AuditConfig, IoError> {
        let candidates = self
            .options
            .optional_sensitive_features
            .clone()
            .ok_or_else(|| IoError::MissingSensitiveFeatures {
                name: self.name.clone(),
            })?;
        let mut config = AuditConfig::new(candidates)?
            .with_control_feature(self.options.control_feature.clone());
        if let Some(name) = &self.options.clf_metric_name {
            config = config.with_quality_metric(name.parse::<QualityMetric>()?);
        }
        if let Some(n) = self.options.num_of_mitigated_features {
            config = config.with_num_of_mitigated_features(n);
        }
        if let Some(grid_size) = self.options.grid_size {
            config = config.with_grid_size(grid_size);
        }
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }

    /// Read the data file and encode the label column as 0/1 when a
    /// positive class value is configured.
    ///
    /// # Errors
    ///
    /// Any [`TableReader::read`] error, or [`IoError::Data`] if the label
    /// column is missing.
    #[instrument(skip_all, fields(dataset = %self.name))]
    pub fn load_table(&self) -> Result<Table, IoError> {
        let mut table = TableReader::new(&self.path)
            .with_delimiter(self.delimiter)
            .read()?;
        if let Some(positive) = &self.positive_label {
            encode_label(&mut table, &self.label, positive)?;
        }
        info!(
            n_rows = table.n_rows(),
            n_columns = table.n_columns(),
            "dataset loaded"
        );
        Ok(table)
    }
}

/// Replace column `label` with 1 where it equals `positive`, else 0.
///
/// Cells are compared by their text form, so a numeric `2` matches the
/// numeric cell `2.0` and the text cell `"2"`.
///
/// # Errors
///
/// Returns [`IoError::Data`] if the column does not exist.
pub fn encode_label(table: &mut Table, label: &str, positive: &LabelValue) -> Result<(), IoError> {
    let column = table.pop(label)?;
    let positive = positive.to_string();
    let encoded: Vec<f64> = (0..column.len())
        .map(|row| {
            if column.display_value(row) == positive {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    debug!(
        label,
        n_positive = encoded.iter().filter(|&&v| v > 0.0).count(),
        "label encoded"
    );
    table.push_column(label, Column::numeric(encoded))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SETTINGS: &str = "\
default:
  optional_sensitive_features: [sex, age]
  clf_metric_name: accuracy
  num_of_mitigated_features: 1
  grid_size: 71
datasets:
  bank:
    path: bank.csv
    delimiter: ';'
    positive_label: 'yes'
    optional_sensitive_features: [marital]
    control_feature: job
    clf_metric_name: balanced_accuracy
  german:
    path: sub/german.csv
    positive_label: 2
";

    fn settings_in(dir: &TempDir) -> Settings {
        let path = dir.path().join("config.yml");
        fs::write(&path, SETTINGS).unwrap();
        Settings::load(&path).unwrap()
    }

    #[test]
    fn dataset_keys_win_over_defaults() {
        let dir = TempDir::new().unwrap();
        let bank = settings_in(&dir).dataset("bank").unwrap();
        let options = bank.options();
        assert_eq!(
            options.optional_sensitive_features,
            Some(vec!["marital".to_string()])
        );
        assert_eq!(options.control_feature.as_deref(), Some("job"));
        assert_eq!(options.clf_metric_name.as_deref(), Some("balanced_accuracy"));
        assert_eq!(options.grid_size, Some(71));
        assert_eq!(options.n_estimators, None);
        assert_eq!(bank.label(), "y");
        assert_eq!(bank.positive_label(), Some(&LabelValue::Text("yes".to_string())));
    }

    #[test]
    fn unset_dataset_keys_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let german = settings_in(&dir).dataset("german").unwrap();
        assert_eq!(
            german.options().optional_sensitive_features,
            Some(vec!["sex".to_string(), "age".to_string()])
        );
        assert_eq!(german.options().control_feature, None);
        assert_eq!(german.positive_label(), Some(&LabelValue::Number(2.0)));
        assert_eq!(german.path(), dir.path().join("sub/german.csv"));
    }

    #[test]
    fn unknown_dataset_lists_configured_names() {
        let dir = TempDir::new().unwrap();
        match settings_in(&dir).dataset("adult") {
            Err(IoError::UnknownDataset { name, known }) => {
                assert_eq!(name, "adult");
                assert_eq!(known, "bank, german");
            }
            other => panic!("expected UnknownDataset, got {other:?}"),
        }
    }

    #[test]
    fn audit_config_from_merged_options() {
        let dir = TempDir::new().unwrap();
        let bank = settings_in(&dir).dataset("bank").unwrap();
        let config = bank.audit_config(Some(7)).unwrap();
        assert_eq!(config.sensitive_features(), &["marital".to_string()]);
        assert_eq!(config.control_feature(), Some("job"));
        assert_eq!(config.quality_metric(), QualityMetric::BalancedAccuracy);
        assert_eq!(config.grid_size(), 71);
        assert_eq!(config.seed(), 7);

        let german = settings_in(&dir).dataset("german").unwrap();
        assert_eq!(german.audit_config(None).unwrap().seed(), 2);
    }

    #[test]
    fn unknown_metric_name_is_rejected() {
        let options = AuditOptions {
            optional_sensitive_features: Some(vec!["sex".to_string()]),
            clf_metric_name: Some("roc_auc".to_string()),
            ..AuditOptions::default()
        };
        let settings = DatasetSettings {
            name: "x".to_string(),
            path: PathBuf::from("x.csv"),
            delimiter: b',',
            label: "y".to_string(),
            positive_label: None,
            options,
        };
        assert!(matches!(
            settings.audit_config(None),
            Err(IoError::Metrics(_))
        ));
    }

    #[test]
    fn missing_candidates_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "datasets:\n  d:\n    path: d.csv\n").unwrap();
        let d = Settings::load(&path).unwrap().dataset("d").unwrap();
        assert!(matches!(
            d.audit_config(None),
            Err(IoError::MissingSensitiveFeatures { .. })
        ));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "datasets:\n  d:\n    path: d.csv\n    delimiter: '§'\n").unwrap();
        let result = Settings::load(&path).unwrap().dataset("d");
        assert!(matches!(result, Err(IoError::InvalidDelimiter { .. })));
    }

    #[test]
    fn missing_datasets_key_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "default:\n  grid_size: 5\n").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(IoError::SettingsParse { .. })
        ));
    }

    #[test]
    fn encode_numeric_and_text_labels() {
        let mut table = Table::new()
            .with_column("y", Column::numeric(vec![1.0, 2.0, 2.0, 1.0]))
            .unwrap();
        encode_label(&mut table, "y", &LabelValue::Number(2.0)).unwrap();
        assert_eq!(
            table.column("y").unwrap(),
            &Column::numeric(vec![0.0, 1.0, 1.0, 0.0])
        );

        let mut table = Table::new()
            .with_column("y", Column::categorical(["no", "yes", "no"]))
            .unwrap();
        encode_label(&mut table, "y", &LabelValue::Text("yes".to_string())).unwrap();
        assert_eq!(
            table.column("y").unwrap(),
            &Column::numeric(vec![0.0, 1.0, 0.0])
        );
    }

    #[test]
    fn encode_missing_label_column() {
        let mut table = Table::new()
            .with_column("x", Column::numeric(vec![1.0]))
            .unwrap();
        let result = encode_label(&mut table, "y", &LabelValue::Number(1.0));
        assert!(matches!(result, Err(IoError::Data(_))));
    }
}
