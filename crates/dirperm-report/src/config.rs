//! Formatter configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use dirperm_core::{DEFAULT_MAX_ROWS, PathMode, ScanOptions};

/// Configuration for report rendering.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct FormatConfig {
    /// Path column layout.
    #[builder(default)]
    pub path_mode: PathMode,

    /// Identity names whose rules are dropped, compared case-insensitively.
    #[builder(default)]
    pub excluded_identities: Vec<String>,

    /// Emit the leading `#` column.
    #[builder(default = "true")]
    pub include_row_numbers: bool,

    /// Maximum number of data rows. Rows past the cap are dropped silently.
    #[builder(default = "DEFAULT_MAX_ROWS")]
    pub max_rows: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            path_mode: PathMode::Split,
            excluded_identities: Vec::new(),
            include_row_numbers: true,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl FormatConfig {
    /// Create a new config builder.
    pub fn builder() -> FormatConfigBuilder {
        FormatConfigBuilder::default()
    }
}

impl From<&ScanOptions> for FormatConfig {
    fn from(options: &ScanOptions) -> Self {
        Self {
            path_mode: options.path_mode,
            excluded_identities: options.exclude_identities.clone(),
            include_row_numbers: options.include_row_numbers,
            max_rows: options.max_rows,
        }
    }
}
