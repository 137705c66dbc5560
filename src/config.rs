//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/syncmap/syncmap.toml`
//! 3. Local config: `<dir>/.syncmap.toml` (working directory by default)
//! 4. Environment variables: `SYNCMAP_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{BlockingRule, DuplicateNamePolicy, ViewMode};

pub const DEFAULT_ROOT_NAME: &str = "GPS";

/// Unified configuration for syncmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Name of the timing source every tree hangs below (default: GPS)
    pub root_name: String,
    /// View used when none is given on the command line
    pub view: ViewMode,
    /// Ancestor predicate for "blocked by parent"
    pub blocking_rule: BlockingRule,
    /// Behavior when two sites share a name
    pub duplicate_names: DuplicateNamePolicy,
    /// Site document used when no file is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            view: ViewMode::default(),
            blocking_rule: BlockingRule::default(),
            duplicate_names: DuplicateNamePolicy::default(),
            data_file: None,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified, inherit").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_name: Option<String>,
    pub view: Option<ViewMode>,
    pub blocking_rule: Option<BlockingRule>,
    pub duplicate_names: Option<DuplicateNamePolicy>,
    pub data_file: Option<PathBuf>,
}

/// Get the XDG config directory for syncmap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "syncmap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("syncmap.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".syncmap.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(data_file) = &self.data_file {
            let expanded = expand_env_vars(data_file.to_string_lossy().as_ref());
            self.data_file = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_name: overlay
                .root_name
                .clone()
                .unwrap_or_else(|| self.root_name.clone()),
            view: overlay.view.unwrap_or(self.view),
            blocking_rule: overlay.blocking_rule.unwrap_or(self.blocking_rule),
            duplicate_names: overlay.duplicate_names.unwrap_or(self.duplicate_names),
            data_file: overlay
                .data_file
                .clone()
                .or_else(|| self.data_file.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.syncmap.toml`; skipped when None
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load from a single explicit file on top of the defaults.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        let mut settings = Self::default().merge_with(&raw);
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply SYNCMAP_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(Environment::with_prefix("SYNCMAP"));
        let config = builder.build().map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "root_name")? {
            settings.root_name = val;
        }
        if let Some(val) = env_value::<ViewMode>(&config, "view")? {
            settings.view = val;
        }
        if let Some(val) = env_value::<BlockingRule>(&config, "blocking_rule")? {
            settings.blocking_rule = val;
        }
        if let Some(val) = env_value::<DuplicateNamePolicy>(&config, "duplicate_names")? {
            settings.duplicate_names = val;
        }
        if let Some(val) = env_value::<String>(&config, "data_file")? {
            settings.data_file = Some(PathBuf::from(val));
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# syncmap configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/syncmap/syncmap.toml
#   Local:  ./.syncmap.toml
#   Env:    SYNCMAP_* environment variables (e.g. SYNCMAP_VIEW=sowAndTech)

# Name of the timing source at the top of every tree
# root_name = "GPS"

# Default view: "blockTypes" or "sowAndTech"
# view = "blockTypes"

# When an ancestor holds back the sites below it:
#   "doability"      - ancestor is not locally doable
#   "syncCompletion" - ancestor's IP/MPLS sync is not done
# blocking_rule = "doability"

# Duplicate site names: "reject" or "firstMatch"
# duplicate_names = "reject"

# Site document used when no FILE argument is given (~ and $VAR expanded)
# data_file = "~/rollout/sites.json"
"#
        .to_string()
    }
}

/// Typed lookup of an env override. Absent keys are `None`; malformed values are errors.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
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
    fn given_defaults_when_created_then_gps_and_canonical_rule() {
        let settings = Settings::default();
        assert_eq!(settings.root_name, "GPS");
        assert_eq!(settings.view, ViewMode::BlockTypes);
        assert_eq!(settings.blocking_rule, BlockingRule::Doability);
        assert_eq!(settings.duplicate_names, DuplicateNamePolicy::Reject);
        assert!(settings.data_file.is_none());
    }

    #[test]
    fn given_tilde_in_data_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_file: Some(PathBuf::from("~/sites.json")),
            ..Default::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let data_file = settings.data_file.unwrap();
        assert!(data_file.to_string_lossy().starts_with(&home));
        assert!(!data_file.to_string_lossy().contains('~'));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_specified_fields_change() {
        let base = Settings::default();
        let overlay = RawSettings {
            view: Some(ViewMode::SowAndTech),
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.view, ViewMode::SowAndTech);
        assert_eq!(merged.root_name, "GPS");
        assert_eq!(merged.blocking_rule, BlockingRule::Doability);
    }

    #[test]
    fn given_camel_case_values_when_parsing_toml_then_reads_enums() {
        let raw: RawSettings = toml::from_str(
            r#"
            view = "sowAndTech"
            blocking_rule = "syncCompletion"
            duplicate_names = "firstMatch"
            "#,
        )
        .unwrap();
        assert_eq!(raw.view, Some(ViewMode::SowAndTech));
        assert_eq!(raw.blocking_rule, Some(BlockingRule::SyncCompletion));
        assert_eq!(raw.duplicate_names, Some(DuplicateNamePolicy::FirstMatch));
    }

    #[test]
    fn given_settings_when_to_toml_then_round_trips() {
        let settings = Settings {
            root_name: "PTP".into(),
            ..Default::default()
        };
        let text = settings.to_toml().unwrap();
        let raw: RawSettings = toml::from_str(&text).unwrap();
        assert_eq!(Settings::default().merge_with(&raw), settings);
    }

    #[test]
    fn given_template_when_parsing_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.root_name.is_none());
    }

    #[test]
    fn given_override_values_when_reading_env_value_then_typed_or_none() {
        let config = Config::builder()
            .set_override("view", "sowAndTech")
            .unwrap()
            .set_override("blocking_rule", "sometimes")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            env_value::<ViewMode>(&config, "view").unwrap(),
            Some(ViewMode::SowAndTech)
        );
        assert_eq!(env_value::<String>(&config, "root_name").unwrap(), None);
        assert!(matches!(
            env_value::<BlockingRule>(&config, "blocking_rule"),
            Err(ApplicationError::Config { .. })
        ));
    }
}
