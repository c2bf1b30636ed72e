//! Configuration loading for categories, file filters and logging.
//!
//! Configuration is read from TOML. Every section is optional; an empty file
//! yields the built-in category table with no filters.
//!
//! ```toml
//! [[categories]]
//! name = "Documents"
//! extensions = [".pdf", ".md"]
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! extensions = ["tmp"]
//! patterns = ["node_modules/**"]
//! regex = ["^~\\$"]
//!
//! [filters.include]
//! patterns = []
//!
//! [logging]
//! directory = "logs"
//! file_name = "organizer.log"
//! ```

use crate::file_category::{Category, ExtensionTable};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".sortboxrc.toml";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(String),
    #[error("invalid category '{name}': {reason}")]
    InvalidCategory { name: String, reason: String },
    #[error("invalid extension '{extension}' in category '{category}': expected a leading dot, e.g. \".pdf\"")]
    InvalidExtension { category: String, extension: String },
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Ordered category definitions. `None` selects the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryConfig>>,

    #[serde(default)]
    pub filters: FilterRules,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One `[[categories]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Rules deciding which files are eligible for organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether dotfiles are organized. Defaults to true.
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist that overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names, e.g. "Thumbs.db".
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Extensions with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns matched against the path relative to the root.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regular expressions matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Where the append-only activity log is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file_name() -> String {
    "organizer.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_name: default_log_file_name(),
        }
    }
}

impl Config {
    /// Loads configuration, falling back through the usual locations.
    ///
    /// 1. `config_path`, if given (must exist)
    /// 2. `.sortboxrc.toml` in the current directory
    /// 3. `~/.config/sortbox/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortbox")
                .join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Renders the configuration with the category table made explicit.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut effective = self.clone();
        if effective.categories.is_none() {
            effective.categories = Some(
                ExtensionTable::default()
                    .categories()
                    .iter()
                    .map(|category| CategoryConfig {
                        name: category.name().to_string(),
                        extensions: category.extensions().to_vec(),
                    })
                    .collect(),
            );
        }
        toml::to_string_pretty(&effective).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validates the category definitions and builds the lookup table.
    pub fn extension_table(&self) -> Result<ExtensionTable, ConfigError> {
        let Some(categories) = &self.categories else {
            return Ok(ExtensionTable::default());
        };

        let mut seen = HashSet::new();
        let mut table = Vec::with_capacity(categories.len());

        for entry in categories {
            validate_category_name(&entry.name)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::InvalidCategory {
                    name: entry.name.clone(),
                    reason: "defined more than once".to_string(),
                });
            }
            for extension in &entry.extensions {
                if !extension.starts_with('.') || extension.len() < 2 {
                    return Err(ConfigError::InvalidExtension {
                        category: entry.name.clone(),
                        extension: extension.clone(),
                    });
                }
            }
            table.push(Category::new(entry.name.clone(), &entry.extensions));
        }

        Ok(ExtensionTable::new(table))
    }

    /// Compiles the filter rules into matchers.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }

    /// Full path of the activity log file.
    pub fn log_file(&self) -> PathBuf {
        self.logging.directory.join(&self.logging.file_name)
    }
}

fn validate_category_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidCategory {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Filter rules with globs and regexes compiled once per run.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
    exclude_paths: HashSet<PathBuf>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes: rules
                .exclude
                .regex
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?,
            include_patterns: compile_globs(&rules.include.patterns)?,
            exclude_paths: HashSet::new(),
        })
    }

    /// Filters that accept every file.
    pub fn accept_all() -> Self {
        Self {
            include_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
            exclude_paths: HashSet::new(),
        }
    }

    /// Always excludes one absolute path, regardless of include patterns.
    pub fn exclude_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude_paths.insert(path.into());
        self
    }

    /// Decides whether a file takes part in organization.
    ///
    /// `full_path` is checked against explicitly excluded paths;
    /// `relative_path` (relative to the organized root) is used for every
    /// other rule. Include patterns win over exclude rules.
    pub fn should_include(&self, full_path: &Path, relative_path: &Path) -> bool {
        if self.exclude_paths.contains(full_path) {
            return false;
        }

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        let file_name = relative_path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self.exclude_regexes.iter().any(|regex| regex.is_match(&file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self::accept_all()
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}
