//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/gridcheck/gridcheck.toml`
//! 3. Explicit config file (`--config <path>`)
//! 4. Environment variables: `GRIDCHECK_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::ERROR_BOUND_SUFFIX;

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub answers_dir: Option<PathBuf>,
    pub reference_extension: Option<String>,
    pub student_ids: Option<Vec<String>>,
    pub error_bound_suffix: Option<String>,
    pub max_group_size: Option<usize>,
}

/// Unified configuration for gridcheck.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the reference archives (`Lab<n>.<ext>`)
    pub answers_dir: PathBuf,
    /// Extension of reference archives, without the dot
    pub reference_extension: String,
    /// Known student ids; empty disables the check
    pub student_ids: Vec<String>,
    /// Point tiers whose name ends with this are never compared
    pub error_bound_suffix: String,
    /// Submitted tiers per review group
    pub max_group_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            answers_dir: default_answers_dir(),
            reference_extension: "Collection".into(),
            student_ids: vec![],
            error_bound_suffix: ERROR_BOUND_SUFFIX.into(),
            max_group_size: 3,
        }
    }
}

fn default_answers_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".gridcheck").join("formatting_answers"))
        .unwrap_or_else(|| PathBuf::from("~/.gridcheck/formatting_answers"))
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Get the XDG config directory for gridcheck.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gridcheck").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("gridcheck.toml"))
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// `config_file`, when given, must exist and is applied on top of the
    /// global config.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.overlay(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            current = current.overlay(&load_raw_settings(path)?);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Scalars and lists from `raw` replace the current value when present.
    fn overlay(&self, raw: &RawSettings) -> Self {
        Self {
            answers_dir: raw
                .answers_dir
                .clone()
                .unwrap_or_else(|| self.answers_dir.clone()),
            reference_extension: raw
                .reference_extension
                .clone()
                .unwrap_or_else(|| self.reference_extension.clone()),
            student_ids: raw
                .student_ids
                .clone()
                .unwrap_or_else(|| self.student_ids.clone()),
            error_bound_suffix: raw
                .error_bound_suffix
                .clone()
                .unwrap_or_else(|| self.error_bound_suffix.clone()),
            max_group_size: raw.max_group_size.unwrap_or(self.max_group_size),
        }
    }

    /// Apply GRIDCHECK_* environment variables as explicit overrides.
    ///
    /// `GRIDCHECK_STUDENT_IDS` is a comma-separated list.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("GRIDCHECK").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("answers_dir") {
            settings.answers_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("reference_extension") {
            settings.reference_extension = val;
        }
        if let Ok(val) = config.get_string("student_ids") {
            settings.student_ids = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(val) = config.get_string("error_bound_suffix") {
            settings.error_bound_suffix = val;
        }
        if let Ok(val) = config.get_string("max_group_size") {
            settings.max_group_size = val.trim().parse().map_err(|_| ApplicationError::Config {
                message: format!("GRIDCHECK_MAX_GROUP_SIZE is not a number: {val}"),
            })?;
        }

        Ok(settings)
    }

    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.answers_dir.to_string_lossy().as_ref());
        self.answers_dir = PathBuf::from(expanded);
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.max_group_size == 0 {
            return Err(ApplicationError::Config {
                message: "max_group_size must be at least 1".into(),
            });
        }
        if self.error_bound_suffix.is_empty() {
            return Err(ApplicationError::Config {
                message: "error_bound_suffix must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Reference archive for lab `n`: `<answers_dir>/Lab<n>.<ext>`.
    pub fn reference_path(&self, lab: u32) -> PathBuf {
        self.answers_dir
            .join(format!("Lab{lab}.{}", self.reference_extension))
    }

    /// True when no id list is configured or `id` is on it.
    pub fn is_known_student(&self, id: &str) -> bool {
        self.student_ids.is_empty() || self.student_ids.iter().any(|s| s == id)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# gridcheck configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/gridcheck/gridcheck.toml
#   File:   --config <path>
#   Env:    GRIDCHECK_* environment variables (GRIDCHECK_STUDENT_IDS is comma-separated)

# Directory holding the reference archives, named Lab<n>.<reference_extension>
# answers_dir = "~/.gridcheck/formatting_answers"

# Extension of reference archives
# reference_extension = "Collection"

# Known student ids (empty list: any id is accepted)
# student_ids = ["abc123", "xyz789"]

# Point tiers ending with this suffix hold tolerances and are not compared
# error_bound_suffix = "-error-bound"

# Submitted tiers shown next to the reference per review group
# max_group_size = 3
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_expected_values() {
        let settings = Settings::default();
        assert!(settings
            .answers_dir
            .to_string_lossy()
            .ends_with("formatting_answers"));
        assert_eq!(settings.reference_extension, "Collection");
        assert_eq!(settings.error_bound_suffix, "-error-bound");
        assert_eq!(settings.max_group_size, 3);
        assert!(settings.student_ids.is_empty());
    }

    #[test]
    fn given_tilde_in_answers_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            answers_dir: PathBuf::from("~/answers"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.answers_dir.to_string_lossy();
        assert!(dir.starts_with(&home), "answers_dir should start with home: {dir}");
        assert!(!dir.contains('~'));
    }

    #[test]
    fn given_lab_number_when_reference_path_then_joins_answers_dir() {
        let settings = Settings {
            answers_dir: PathBuf::from("/srv/answers"),
            ..Settings::default()
        };
        assert_eq!(
            settings.reference_path(2),
            PathBuf::from("/srv/answers/Lab2.Collection")
        );
    }

    #[test]
    fn given_student_list_when_checking_ids_then_only_listed_known() {
        let open = Settings::default();
        assert!(open.is_known_student("anyone"));

        let closed = Settings {
            student_ids: vec!["abc123".into()],
            ..Settings::default()
        };
        assert!(closed.is_known_student("abc123"));
        assert!(!closed.is_known_student("xyz789"));
    }

    #[test]
    fn given_partial_raw_when_overlay_then_only_given_fields_replaced() {
        let base = Settings::default();
        let raw = RawSettings {
            max_group_size: Some(5),
            student_ids: Some(vec!["s1".into()]),
            ..RawSettings::default()
        };

        let merged = base.overlay(&raw);

        assert_eq!(merged.max_group_size, 5);
        assert_eq!(merged.student_ids, vec!["s1".to_string()]);
        assert_eq!(merged.reference_extension, base.reference_extension);
    }

    #[test]
    fn given_zero_group_size_when_validating_then_config_error() {
        let settings = Settings {
            max_group_size: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_template_when_parsed_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.answers_dir.is_none());
    }
}
