//! Optional TOML profile holding scan defaults.
//!
//! ```toml
//! roots = ["/srv/share"]
//! exclude = ["/srv/share/tmp"]
//! exclude-identities = ["root"]
//! depth = "children"
//! files = true
//! path-mode = "combined"
//! row-numbers = false
//! max-rows = 50000
//! output = "/var/reports"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use dirperm_core::{DepthPolicy, PathMode};

const PROFILE_DIR: &str = "dirperm";
const PROFILE_FILE: &str = "config.toml";

/// Scan defaults read from disk. Unset fields defer to the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Profile {
    pub roots: Vec<PathBuf>,
    pub exclude: Vec<PathBuf>,
    pub exclude_identities: Vec<String>,
    pub depth: Option<DepthPolicy>,
    pub files: Option<bool>,
    pub path_mode: Option<PathMode>,
    pub row_numbers: Option<bool>,
    pub max_rows: Option<usize>,
    pub output: Option<PathBuf>,
}

impl Profile {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Load the profile at `explicit`, or the per-user profile if one exists.
///
/// An explicit profile must exist and parse. A discovered one that fails to
/// parse is skipped with a warning.
pub fn load(explicit: Option<&Path>) -> Result<Profile> {
    if let Some(path) = explicit {
        return read(path);
    }

    let Some(path) = default_path().filter(|p| p.is_file()) else {
        return Ok(Profile::default());
    };

    match read(&path) {
        Ok(profile) => Ok(profile),
        Err(error) => {
            warn!("Ignoring profile {}: {:#}", path.display(), error);
            Ok(Profile::default())
        }
    }
}

/// `<config dir>/dirperm/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(PROFILE_DIR).join(PROFILE_FILE))
}

fn read(path: &Path) -> Result<Profile> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed reading profile {}", path.display()))?;
    let profile = Profile::from_toml(&content)
        .wrap_err_with(|| format!("Invalid profile {}", path.display()))?;
    debug!(path = %path.display(), "profile loaded");
    Ok(profile)
}
