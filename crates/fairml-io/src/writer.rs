//! JSON report writer for audit outputs.

use std::fs;
use std::path::{Path, PathBuf};

use fairml_audit::{AuditReport, GridMitigationReport, RankingEntry, TradeoffPoint};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes audit results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_audit.json`,
/// `{experiment}_tradeoff.json` and `{experiment}_ranking.json`.
pub struct ReportWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write the full report to `{experiment}_audit.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_audit(&self, report: &AuditReport) -> Result<PathBuf, IoError> {
        let artifact = AuditArtifact {
            experiment: self.experiment.as_str(),
            report,
        };
        self.write_json("audit", &artifact)
    }

    /// Write the grid-search quality/fairness points to
    /// `{experiment}_tradeoff.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_tradeoff(
        &self,
        sensitive_feature: &str,
        grid: &GridMitigationReport,
    ) -> Result<PathBuf, IoError> {
        let artifact = TradeoffArtifact {
            experiment: self.experiment.as_str(),
            sensitive_feature,
            selected: &grid.selected,
            points: &grid.tradeoff,
        };
        self.write_json("tradeoff", &artifact)
    }

    /// Write a detection ranking to `{experiment}_ranking.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_ranking(&self, ranking: &[RankingEntry]) -> Result<PathBuf, IoError> {
        let artifact = RankingArtifact {
            experiment: self.experiment.as_str(),
            ranking,
        };
        self.write_json("ranking", &artifact)
    }

    fn write_json<T: Serialize>(&self, kind: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()));
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), "{kind} report written");
        Ok(path)
    }
}

// --- Serialization artifacts ---

#[derive(Serialize)]
struct AuditArtifact<'a> {
    experiment: &'a str,
    #[serde(flatten)]
    report: &'a AuditReport,
}

#[derive(Serialize)]
struct TradeoffArtifact<'a> {
    experiment: &'a str,
    sensitive_feature: &'a str,
    selected: &'a str,
    points: &'a [TradeoffPoint],
}

#[derive(Serialize)]
struct RankingArtifact<'a> {
    experiment: &'a str,
    ranking: &'a [RankingEntry],
}
