//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Command-line overrides of the engine policies

use crate::cli::PolicyArgs;
use crate::error::{Error, Result};
use rowmap_core::{EngineConfig, MappingEngine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Mapping engine settings
    pub engine: EngineConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators for batches
    pub progress: bool,

    /// Minimum batch size before a progress bar is shown
    pub progress_threshold: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,

    /// Redact customer data in log output
    pub redact: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
            progress_threshold: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: None,
            redact: true,
        }
    }
}

/// On-disk configuration formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Json,
    Toml,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::of(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in &Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // Current directory
            PathBuf::from(".rowmap.yaml"),
            PathBuf::from(".rowmap.json"),
            PathBuf::from(".rowmap.toml"),
        ];

        // User config directory
        if let Some(dir) = dirs::config_dir().map(|d| d.join("rowmap")) {
            for name in ["config.yaml", "config.json", "config.toml"] {
                paths.push(dir.join(name));
            }
        }

        paths
    }

    /// `config.yaml` inside the platform config directory
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rowmap").join("config.yaml"))
    }

    /// Render the configuration in one of the file formats
    pub fn render(&self, path_hint: &Path) -> Result<String> {
        let content = match FileFormat::of(path_hint) {
            FileFormat::Yaml => serde_yaml::to_string(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
        };
        Ok(content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(path)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the mapping engine, applying command-line policy overrides
    pub fn build_engine(&self, policy: &PolicyArgs) -> Result<MappingEngine> {
        let mut engine_config = self.engine.clone();
        if let Some(unknown_fields) = policy.unknown_fields {
            engine_config.unknown_fields = unknown_fields.into();
        }
        if let Some(partial_compounds) = policy.partial_compounds {
            engine_config.partial_compounds = partial_compounds.into();
        }

        MappingEngine::new(engine_config).map_err(|e| Error::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{PartialCompoundsArg, UnknownFieldsArg};
    use rowmap_core::{FieldGroup, PartialCompoundPolicy, UnknownFieldPolicy};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.output.progress);
        assert!(config.logging.redact);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rowmap.yaml");
        std::fs::write(
            &path,
            concat!(
                "engine:\n",
                "  unknown_fields: passthrough\n",
                "  extra_fields:\n",
                "    - app_key: marinaFee\n",
                "      column: marina_fee\n",
                "      group: financial\n",
                "logging:\n",
                "  format: json\n",
            ),
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.engine.unknown_fields, UnknownFieldPolicy::Passthrough);
        assert_eq!(config.engine.extra_fields[0].group, FieldGroup::Financial);
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert!(config.output.progress);
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("rowmap.toml");
        std::fs::write(&toml_path, "[engine]\npartial_compounds = \"omit\"\n").unwrap();
        let config = Config::from_file(&toml_path).unwrap();
        assert_eq!(config.engine.partial_compounds, PartialCompoundPolicy::Omit);

        let json_path = dir.path().join("rowmap.json");
        std::fs::write(&json_path, r#"{"output": {"progress": false}}"#).unwrap();
        let config = Config::from_file(&json_path).unwrap();
        assert!(!config.output.progress);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/rowmap.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.engine.extra_transient_keys.push("isHovered".to_string());

        for name in ["nested/config.yaml", "config.toml", "config.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_build_engine_with_overrides() {
        let config = Config::default();
        let policy = PolicyArgs {
            unknown_fields: Some(UnknownFieldsArg::Passthrough),
            partial_compounds: Some(PartialCompoundsArg::Omit),
        };

        let engine = config.build_engine(&policy).unwrap();
        assert_eq!(engine.unknown_fields(), UnknownFieldPolicy::Passthrough);
        assert_eq!(engine.partial_compounds(), PartialCompoundPolicy::Omit);
    }

    #[test]
    fn test_build_engine_rejects_bad_table() {
        let mut config = Config::default();
        config.engine.extra_fields.push(rowmap_core::FieldEntry {
            app_key: "first_name".to_string(),
            column: "first_name".to_string(),
            group: FieldGroup::Customer,
        });

        let err = config.build_engine(&PolicyArgs::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
