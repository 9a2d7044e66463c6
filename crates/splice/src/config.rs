//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use tracing::warn;

/// Name of the configuration file looked up in the workspace root.
pub const CONFIG_FILE: &str = "splice.json";

/// Project configuration from `splice.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SpliceConfig {
    /// File extensions to process.
    pub extensions: Vec<String>,

    /// Glob patterns to exclude, relative to the workspace.
    pub exclude: Vec<String>,

    /// Directory rewritten files are written to.
    pub output_dir: Option<Utf8PathBuf>,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".rb".to_string()],
            exclude: Vec::new(),
            output_dir: None,
        }
    }
}

impl SpliceConfig {
    /// Loads `splice.json` from the project root.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is
    /// reported and also yields the defaults.
    pub fn load(project_root: &Utf8Path) -> Self {
        let config_path = project_root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&config_path)
            .map_err(|e| e.to_string())
            .and_then(|content| Self::parse(&content))
        {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %config_path, %error, "failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Parses the contents of a configuration file.
    pub fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Returns the file extensions to process.
    pub fn file_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            vec![".rb"]
        } else {
            self.extensions.iter().map(String::as_str).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extensions() {
        let config = SpliceConfig::default();
        assert_eq!(config.file_extensions(), vec![".rb"]);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = SpliceConfig::parse(r#"{ "exclude": ["vendor/**"] }"#).unwrap();
        assert_eq!(config.extensions, vec![".rb"]);
        assert_eq!(config.exclude, vec!["vendor/**"]);
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn test_parse_full_config() {
        let config = SpliceConfig::parse(
            r#"{ "extensions": [".rb", ".rake"], "exclude": [], "output_dir": "tmp/splice" }"#,
        )
        .unwrap();
        assert_eq!(config.file_extensions(), vec![".rb", ".rake"]);
        assert_eq!(config.output_dir.as_deref(), Some(Utf8Path::new("tmp/splice")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(SpliceConfig::parse(r#"{ "extension": [".rb"] }"#).is_err());
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        assert_eq!(SpliceConfig::load(root), SpliceConfig::default());

        fs::write(root.join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(SpliceConfig::load(root), SpliceConfig::default());

        fs::write(root.join(CONFIG_FILE), r#"{ "extensions": [".rake"] }"#).unwrap();
        assert_eq!(SpliceConfig::load(root).file_extensions(), vec![".rake"]);
    }
}
