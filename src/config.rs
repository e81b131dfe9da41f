use crate::cli::{CommonArgs, VerbosityLevel};
use crate::extract::IndexLayout;
use crate::file_discovery::{DEFAULT_PATTERN, FileDiscovery};
use crate::indexer::{TABULAR_INDEX, XML_INDEX};
use crate::langcheck::{DEFAULT_LANGUAGES, LanguageSet};
use crate::pipeline::{ErrorPolicy, FileProcessor};
use crate::validator::DEFAULT_SCHEMA;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings shared by the three tools
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub files: FileConfig,
    pub index: IndexConfig,
    pub languages: LanguageConfig,
    pub validation: ValidationConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

/// Input selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Directory holding the device descriptions; output and schema paths
    /// are relative to it
    pub directory: PathBuf,
    /// Regular expression a file name must match
    pub pattern: String,
    /// Process files in name order
    pub sort: bool,
}

/// Indexer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub tabular_out: PathBuf,
    pub xml_out: PathBuf,
    pub layout: IndexLayout,
    /// What an unreadable or incomplete document does to the run
    pub on_error: ErrorPolicy,
}

/// Language checker settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LanguageConfig {
    pub required: Vec<String>,
    pub on_parse_error: ErrorPolicy,
}

/// Schema validator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    pub schema: PathBuf,
    pub on_parse_error: ErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads; 0 uses every core, 1 processes files in turn
    pub jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            sort: false,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            tabular_out: PathBuf::from(TABULAR_INDEX),
            xml_out: PathBuf::from(XML_INDEX),
            layout: IndexLayout::Standard,
            on_error: ErrorPolicy::SkipAndContinue,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            required: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            on_parse_error: ErrorPolicy::AbortRun,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            schema: PathBuf::from(DEFAULT_SCHEMA),
            on_parse_error: ErrorPolicy::AbortRun,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

impl Config {
    /// `path` as given when absolute, otherwise inside the working directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.files.directory.join(path)
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn discovery(&self) -> crate::error::Result<FileDiscovery> {
        Ok(FileDiscovery::new()
            .with_pattern(&self.files.pattern)?
            .with_sorted(self.files.sort))
    }

    pub fn processor(&self) -> FileProcessor {
        FileProcessor::new(self.processing.jobs)
    }

    pub fn language_set(&self) -> LanguageSet {
        LanguageSet::new(self.languages.required.iter().cloned())
    }
}

/// Command line arguments of one tool, as far as configuration is concerned
pub trait ToolArgs {
    fn common(&self) -> &CommonArgs;

    /// Overwrite `config` with every option given on the command line.
    fn apply_overrides(&self, config: &mut Config);
}

const CONFIG_NAMES: [&str; 4] = ["zddx.toml", "zddx.json", ".zddx.toml", ".zddx.json"];

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> CLI
    pub fn load_config(args: &impl ToolArgs) -> Result<Config> {
        let common = args.common();

        let mut config = match &common.config {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let dir = common.dir.as_deref().unwrap_or(Path::new("."));
                Self::find_config_file(dir)?.unwrap_or_default()
            }
        };

        args.apply_overrides(&mut config);
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        debug!("Loading configuration from {}", path.display());

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find a configuration file in `dir`, then in the user config directory
    pub fn find_config_file(dir: &Path) -> Result<Option<Config>> {
        for name in &CONFIG_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                return Ok(Some(Self::load_from_file(&path)?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("zddx");
            for name in &CONFIG_NAMES {
                let path = app_config_dir.join(name);
                if path.is_file() {
                    return Ok(Some(Self::load_from_file(&path)?));
                }
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.languages.required.iter().all(|code| code.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "At least one required language must be specified".to_string(),
            ));
        }

        if let Err(e) = Regex::new(&config.files.pattern) {
            return Err(ConfigError::Validation(format!(
                "Invalid file pattern '{}': {}",
                config.files.pattern, e
            )));
        }

        if config.resolve(&config.index.tabular_out) == config.resolve(&config.index.xml_out) {
            return Err(ConfigError::Validation(
                "Tabular and XML index must be different files".to_string(),
            ));
        }

        if config.processing.jobs > 1024 {
            return Err(ConfigError::Validation(
                "Number of jobs cannot exceed 1024".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}
