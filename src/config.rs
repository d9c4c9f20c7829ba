//! Pipeline configuration, read once at startup and passed in explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::OpenConflictPolicy;

const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org/";
const DEFAULT_DATABASE_PATH: &str = "./wikiwatch.db";
const DEFAULT_MAX_OPENS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Site the change links in the fragment are resolved against.
    pub base_url: Url,
    /// Upper bound on opens planned in one run.
    pub max_opens: usize,
    pub database_path: PathBuf,
    pub open_conflicts: OpenConflictPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            max_opens: DEFAULT_MAX_OPENS,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            open_conflicts: OpenConflictPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads the JSON configuration file at `path`. A missing file yields
    /// the defaults; a present but unreadable or malformed file is an
    /// error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse configuration from {}", path.display()))
    }
}
