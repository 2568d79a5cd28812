//! Writing a finished scan to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

use dirperm_core::ScanResult;
use dirperm_report::LINE_ENDING;

const REPORT_PREFIX: &str = "DirectoryPermissions";
const LOG_PREFIX: &str = "Log";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Errors that can occur while persisting a report.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Files produced by [`ReportWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub report_path: PathBuf,
    /// Present only when the scan logged failures.
    pub log_path: Option<PathBuf>,
}

/// Writes report and log files into an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `result`, stamping file names with the local time.
    pub fn write(&self, result: &ScanResult) -> Result<WrittenReport, OutputError> {
        self.write_at(result, Local::now().naive_local())
    }

    /// Write `result` with an explicit timestamp.
    ///
    /// The output directory is created if missing. The log file is skipped
    /// when there is nothing to log.
    pub fn write_at(
        &self,
        result: &ScanResult,
        timestamp: NaiveDateTime,
    ) -> Result<WrittenReport, OutputError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();

        let report_path = self
            .output_dir
            .join(format!("{REPORT_PREFIX} - {stamp}.csv"));
        write_file(&report_path, &result.report)?;

        let log_path = if result.has_failures() {
            let path = self.output_dir.join(format!("{LOG_PREFIX} - {stamp}.txt"));
            let mut text = String::new();
            for line in result.log_lines() {
                text.push_str(line);
                text.push_str(LINE_ENDING);
            }
            write_file(&path, &text)?;
            Some(path)
        } else {
            None
        };

        debug!(
            report = %report_path.display(),
            log = ?log_path.as_deref().map(Path::display),
            "report written"
        );

        Ok(WrittenReport {
            report_path,
            log_path,
        })
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}
