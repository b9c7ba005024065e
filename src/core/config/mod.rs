//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! tracklink has two configuration scopes:
//! - **Project**: per-directory settings, notably the issue tracker
//! - **Global**: user-level settings
//!
//! # Project Config Location
//!
//! `<dir>/.tracklink/config.toml`. A missing file is not an error. The
//! resolver loads it twice at most: once for the working directory and once
//! for the enclosing git work tree (see [`crate::resolve`]).
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TRACKLINK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tracklink/config.toml`
//! 3. `~/.tracklink/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use tracklink::core::config::ProjectConfig;
//! use std::path::Path;
//!
//! if let Some(loaded) = ProjectConfig::load(Path::new("/path/to/project")).unwrap() {
//!     if let Some(it) = loaded.config.configured_tracker() {
//!         println!("{} tracker at {}", it.kind, it.url);
//!     }
//! }
//! ```

pub mod schema;

pub use schema::{GlobalConfig, IssueTrackerConfig, ProjectConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory holding project configuration, relative to the project dir.
pub const PROJECT_CONFIG_DIR: &str = ".tracklink";

/// Project configuration file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// A project config together with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProjectConfig {
    /// The parsed configuration.
    pub config: ProjectConfig,
    /// The file it was read from.
    pub path: PathBuf,
}

impl ProjectConfig {
    /// Get the config file path for a project directory.
    pub fn config_path(dir: &Path) -> PathBuf {
        dir.join(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILE)
    }

    /// Load the project configuration stored in `dir`.
    ///
    /// Returns `Ok(None)` only when nothing exists at the config path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be inspected, is not a regular
    /// file, or the file cannot be read, parsed, or validated.
    pub fn load(dir: &Path) -> Result<Option<LoadedProjectConfig>, ConfigError> {
        let path = Self::config_path(dir);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(ConfigError::ReadError {
                    source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
                    path,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::ReadError { path, source: e }),
        }

        let config: ProjectConfig = read_toml(&path)?;
        config.validate().map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(Some(LoadedProjectConfig { config, path }))
    }

    /// Write the project configuration into `dir` atomically.
    ///
    /// Creates the config directory if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ConfigError> {
        self.validate()?;
        let path = Self::config_path(dir);
        write_config_atomic(&path, self)?;
        Ok(path)
    }
}

impl GlobalConfig {
    /// Load global configuration from the standard locations.
    ///
    /// Returns defaults when no file exists.
    pub fn load() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        Self::load_from(&Self::candidate_paths())
    }

    /// Load from the first existing path in `candidates`.
    pub fn load_from(candidates: &[PathBuf]) -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        for path in candidates {
            if path.is_file() {
                let config = read_toml(path)?;
                return Ok((config, Some(path.clone())));
            }
        }

        // No config found, use defaults
        Ok((GlobalConfig::default(), None))
    }

    /// Standard global config locations, in order of precedence.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var("TRACKLINK_CONFIG") {
            paths.push(PathBuf::from(path));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("tracklink/config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tracklink/config.toml"));
        }

        paths
    }
}

/// Read and parse a TOML config file.
fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a config file atomically.
fn write_config_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    // Write to temp file in same directory (for atomic rename)
    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(contents.as_bytes())
        .map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

    file.sync_all().map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_project_config(dir: &Path, contents: &str) {
        let config_dir = dir.join(PROJECT_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(PROJECT_CONFIG_FILE), contents).unwrap();
    }

    mod project {
        use super::*;

        #[test]
        fn missing_file_is_none() {
            let temp = TempDir::new().unwrap();
            assert!(ProjectConfig::load(temp.path()).unwrap().is_none());
        }

        #[test]
        fn loads_tracker_with_provenance() {
            let temp = TempDir::new().unwrap();
            write_project_config(
                temp.path(),
                r#"
                [issue_tracker]
                kind = "jira"
                url = "https://jira.example.com"
                project = "ABC"
                "#,
            );

            let loaded = ProjectConfig::load(temp.path()).unwrap().unwrap();
            assert_eq!(loaded.path, ProjectConfig::config_path(temp.path()));
            let it = loaded.config.configured_tracker().unwrap();
            assert_eq!(it.project, "ABC");
        }

        #[test]
        fn file_without_tracker_section() {
            let temp = TempDir::new().unwrap();
            write_project_config(temp.path(), "");

            let loaded = ProjectConfig::load(temp.path()).unwrap().unwrap();
            assert!(loaded.config.issue_tracker.is_none());
        }

        #[test]
        fn directory_at_config_path_is_read_error() {
            let temp = TempDir::new().unwrap();
            fs::create_dir_all(ProjectConfig::config_path(temp.path())).unwrap();

            match ProjectConfig::load(temp.path()) {
                Err(ConfigError::ReadError { path, .. }) => {
                    assert_eq!(path, ProjectConfig::config_path(temp.path()));
                }
                other => panic!("expected read error, got {:?}", other),
            }
        }

        #[test]
        fn malformed_file_is_parse_error() {
            let temp = TempDir::new().unwrap();
            write_project_config(temp.path(), "[issue_tracker\nkind = ");

            let err = ProjectConfig::load(temp.path()).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { .. }));
            assert!(err.to_string().contains(".tracklink"));
        }

        #[test]
        fn invalid_url_is_parse_error() {
            let temp = TempDir::new().unwrap();
            write_project_config(
                temp.path(),
                r#"
                [issue_tracker]
                kind = "jira"
                url = "jira.example.com"
                "#,
            );

            assert!(matches!(
                ProjectConfig::load(temp.path()),
                Err(ConfigError::ParseError { .. })
            ));
        }

        #[test]
        fn save_then_load() {
            let temp = TempDir::new().unwrap();
            let config = ProjectConfig {
                issue_tracker: Some(IssueTrackerConfig::new(
                    "github",
                    "https://github.com",
                    "org/repo",
                )),
            };

            let path = config.save(temp.path()).unwrap();
            assert!(path.exists());
            assert!(!path.with_extension("toml.tmp").exists());

            let loaded = ProjectConfig::load(temp.path()).unwrap().unwrap();
            assert_eq!(loaded.config, config);
        }
    }

    mod global {
        use super::*;

        #[test]
        fn defaults_when_nothing_exists() {
            let temp = TempDir::new().unwrap();
            let (config, path) = GlobalConfig::load_from(&[temp.path().join("missing.toml")]).unwrap();
            assert_eq!(config, GlobalConfig::default());
            assert!(path.is_none());
        }

        #[test]
        fn first_existing_candidate_wins() {
            let temp = TempDir::new().unwrap();
            let first = temp.path().join("first.toml");
            let second = temp.path().join("second.toml");
            fs::write(&first, "interactive = false").unwrap();
            fs::write(&second, "interactive = true").unwrap();

            let (config, path) = GlobalConfig::load_from(&[
                temp.path().join("missing.toml"),
                first.clone(),
                second,
            ])
            .unwrap();

            assert_eq!(config.interactive, Some(false));
            assert_eq!(path, Some(first));
        }

        #[test]
        fn unknown_fields_rejected() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("config.toml");
            fs::write(&path, "default_forge = \"github\"").unwrap();

            assert!(GlobalConfig::load_from(&[path]).is_err());
        }
    }
}
