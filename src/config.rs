//! YAML configuration for the extract command.
//!
//! Every field is optional and supplies a default for the matching flag;
//! flags given on the command line take precedence.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete YAML configuration for the extract command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractYamlConfig {
    /// Database URL (`postgres://`, `mysql://` or `sqlite://`)
    pub url: Option<String>,
    /// Schema / namespace qualifier
    pub schema: Option<String>,
    /// Tables to extract, in output order
    pub tables: Vec<String>,
    /// Tables to drop after extraction
    pub exclude: Vec<String>,
    /// Rendering: text or markdown
    pub format: Option<String>,
    /// Single-document output file
    pub output: Option<PathBuf>,
    /// Multi-document output directory
    pub output_dir: Option<PathBuf>,
    /// Split into per-table files only above this many tables
    pub split_threshold: Option<usize>,
}

impl ExtractYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ExtractYamlConfig = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }
}
