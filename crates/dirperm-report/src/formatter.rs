//! Rendering permission records as a CSV table.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use dirperm_core::{AccessRule, ExclusionSet, PathMode, PermissionRecord, ScanError};

use crate::config::FormatConfig;
use crate::csv::CsvLine;

const ROW_NUMBER_HEADER: &str = "#";
const LEVEL_HEADER: &str = "Level";
const PATH_HEADER: &str = "Path";
const RULE_HEADERS: [&str; 5] = [
    "Identity",
    "File System Rights",
    "Access Control Type",
    "Is Inherited?",
    "Owner",
];

/// Renders one row per (record, access rule) pair.
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    config: FormatConfig,
    excluded: ExclusionSet,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::with_config(FormatConfig::default())
    }
}

impl ReportFormatter {
    /// Create a formatter with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with custom configuration.
    pub fn with_config(config: FormatConfig) -> Self {
        let excluded = ExclusionSet::from_names(&config.excluded_identities);
        Self { config, excluded }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Render `records` into report text.
    ///
    /// In split mode every row carries exactly `max_depth` path columns;
    /// shorter paths are padded with empty cells. Returns
    /// [`ScanError::Cancelled`] without any partial text if `cancel` fires.
    pub fn format<'a, I>(
        &self,
        records: I,
        max_depth: usize,
        cancel: &CancellationToken,
    ) -> Result<String, ScanError>
    where
        I: IntoIterator<Item = &'a PermissionRecord>,
    {
        let mut out = String::new();
        self.write_header(&mut out, max_depth);

        let mut rows = 0usize;
        for record in records {
            check_cancelled(cancel)?;
            if rows >= self.config.max_rows {
                continue;
            }

            let path_cells = self.path_cells(record, max_depth, cancel)?;
            self.write_rules(&mut out, record, &path_cells, &mut rows, cancel)?;
        }

        debug!(
            rows,
            max_depth,
            path_mode = %self.config.path_mode,
            capped = rows >= self.config.max_rows,
            "report formatted"
        );

        Ok(out)
    }

    fn write_header(&self, out: &mut String, max_depth: usize) {
        let mut line = CsvLine::new();
        if self.config.include_row_numbers {
            line.push(ROW_NUMBER_HEADER);
        }
        match self.config.path_mode {
            PathMode::Split => {
                for level in 0..max_depth {
                    line.push(&format!("{LEVEL_HEADER} {level}"));
                }
            }
            PathMode::Combined => line.push(PATH_HEADER),
        }
        for header in RULE_HEADERS {
            line.push(header);
        }
        line.finish(out);
    }

    /// Path columns shared by every row of one record.
    fn path_cells<'r>(
        &self,
        record: &'r PermissionRecord,
        max_depth: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<&'r str>, ScanError> {
        match self.config.path_mode {
            PathMode::Combined => Ok(vec![record.full_path()]),
            PathMode::Split => {
                let segments = record.path_segments();
                let mut cells = Vec::with_capacity(max_depth);
                for level in 0..max_depth {
                    check_cancelled(cancel)?;
                    cells.push(segments.get(level).map_or("", |s| s.as_str()));
                }
                Ok(cells)
            }
        }
    }

    /// One row per non-excluded rule of `record`, up to the row cap.
    fn write_rules(
        &self,
        out: &mut String,
        record: &PermissionRecord,
        path_cells: &[&str],
        rows: &mut usize,
        cancel: &CancellationToken,
    ) -> Result<(), ScanError> {
        for rule in record.access_rules() {
            if *rows >= self.config.max_rows {
                break;
            }
            if self.excluded.contains(&rule.identity) {
                continue;
            }
            check_cancelled(cancel)?;

            self.write_row(out, *rows, path_cells, rule, record.owner());
            *rows += 1;
        }
        Ok(())
    }

    fn write_row(
        &self,
        out: &mut String,
        row: usize,
        path_cells: &[&str],
        rule: &AccessRule,
        owner: &str,
    ) {
        let mut line = CsvLine::new();
        if self.config.include_row_numbers {
            line.push(&row.to_string());
        }
        for cell in path_cells {
            line.push(cell);
        }
        line.push(&rule.identity);
        line.push(&rule.rights.to_string());
        line.push(&rule.access_type.to_string());
        line.push(bool_text(rule.is_inherited));
        line.push(owner);
        line.finish(out);
    }
}

fn bool_text(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), ScanError> {
    if cancel.is_cancelled() {
        Err(ScanError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::csv::LINE_ENDING;
    use dirperm_core::{FileSystemRights, NodeKind, NodeSecurity};

    fn record(path: &str, rules: Vec<AccessRule>) -> PermissionRecord {
        PermissionRecord::new(
            Path::new(path),
            NodeKind::Directory,
            NodeSecurity::new("alice", rules),
        )
    }

    fn lines(text: &str) -> Vec<&str> {
        text.split(LINE_ENDING).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_split_header() {
        let text = ReportFormatter::new()
            .format(std::iter::empty(), 2, &CancellationToken::new())
            .unwrap();
        assert_eq!(
            lines(&text),
            vec![
                "\"#\",\"Level 0\",\"Level 1\",\"Identity\",\"File System Rights\",\
                 \"Access Control Type\",\"Is Inherited?\",\"Owner\""
            ]
        );
    }

    #[test]
    fn test_split_rows_are_padded() {
        let records = [
            record("/data", vec![AccessRule::allow("Everyone", FileSystemRights::READ)]),
            record(
                "/data/sub",
                vec![AccessRule::deny("bob", FileSystemRights::WRITE).inherited()],
            ),
        ];

        let text = ReportFormatter::new()
            .format(&records, 2, &CancellationToken::new())
            .unwrap();
        let lines = lines(&text);

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "\"0\",\"data\",\"\",\"Everyone\",\"Read\",\"Allow\",\"False\",\"alice\""
        );
        assert_eq!(
            lines[2],
            "\"1\",\"data\",\"sub\",\"bob\",\"Write\",\"Deny\",\"True\",\"alice\""
        );
    }

    #[test]
    fn test_combined_without_row_numbers() {
        let config = FormatConfig::builder()
            .path_mode(PathMode::Combined)
            .include_row_numbers(false)
            .build()
            .unwrap();
        let records = [record(
            "/data/sub",
            vec![AccessRule::allow("staff", FileSystemRights::FULL_CONTROL)],
        )];

        let text = ReportFormatter::with_config(config)
            .format(&records, 2, &CancellationToken::new())
            .unwrap();
        let lines = lines(&text);

        assert!(lines[0].starts_with("\"Path\",\"Identity\""));
        assert_eq!(
            lines[1],
            "\"/data/sub\",\"staff\",\"FullControl\",\"Allow\",\"False\",\"alice\""
        );
    }

    #[test]
    fn test_cancelled_before_rows() {
        let records = [record("/data", vec![AccessRule::allow("x", FileSystemRights::READ)])];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = ReportFormatter::new().format(&records, 1, &cancel).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_path_cells_observe_cancellation() {
        let formatter = ReportFormatter::new();
        let deep = record("/data/sub/leaf", Vec::new());
        let cancel = CancellationToken::new();

        assert_eq!(
            formatter.path_cells(&deep, 4, &cancel).unwrap(),
            vec!["data", "sub", "leaf", ""]
        );

        cancel.cancel();
        assert!(matches!(
            formatter.path_cells(&deep, 4, &cancel),
            Err(ScanError::Cancelled)
        ));
    }

    #[test]
    fn test_combined_path_cells_skip_level_checks() {
        let config = FormatConfig::builder()
            .path_mode(PathMode::Combined)
            .build()
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let rec = record("/data", Vec::new());
        let cells = ReportFormatter::with_config(config)
            .path_cells(&rec, 3, &cancel)
            .unwrap();
        assert_eq!(cells, vec!["/data"]);
    }

    #[test]
    fn test_rules_observe_cancellation() {
        let formatter = ReportFormatter::new();
        let data = record(
            "/data",
            vec![
                AccessRule::allow("Everyone", FileSystemRights::READ),
                AccessRule::allow("staff", FileSystemRights::WRITE),
            ],
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut out = String::new();
        let mut rows = 0;
        let result = formatter.write_rules(&mut out, &data, &["data"], &mut rows, &cancel);

        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(rows, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_rules_stop_at_row_cap() {
        let config = FormatConfig::builder().max_rows(1usize).build().unwrap();
        let data = record(
            "/data",
            vec![
                AccessRule::allow("Everyone", FileSystemRights::READ),
                AccessRule::allow("staff", FileSystemRights::WRITE),
            ],
        );

        let mut out = String::new();
        let mut rows = 0;
        ReportFormatter::with_config(config)
            .write_rules(&mut out, &data, &["data"], &mut rows, &CancellationToken::new())
            .unwrap();

        assert_eq!(rows, 1);
        assert_eq!(lines(&out).len(), 1);
    }
}
