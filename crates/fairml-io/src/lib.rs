//! File I/O for the fairml audit: delimited tables, YAML settings and
//! JSON reports.

mod domain;
mod error;
mod reader;
mod settings;
mod writer;

pub use domain::ExperimentName;
pub use error::IoError;
pub use reader::TableReader;
pub use settings::{AuditOptions, DatasetSettings, LabelValue, Settings, encode_label};
pub use writer::ReportWriter;
