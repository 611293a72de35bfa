//! Profile configuration: which action is bound to which gamepad button
//!
//! Profiles are TOML files. Every binding is parsed when the profile is turned
//! into bindings; a single invalid binding rejects the whole profile before any
//! action is attached to a button.
//!
//! ```toml
//! name = "default"
//!
//! [settings]
//! idle_wakeup_ms = 500
//! log_output = true
//!
//! [bindings]
//! A = "button(KEY_ENTER)"
//! X = "repeat(button(KEY_SPACE); 0.1)"
//! ```

use crate::actions::{self, Action, ActionError};
use crate::controller::{ButtonType, InputError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "padmacro";
const PROFILE_FILE: &str = "profile.toml";

/// Errors while loading a profile or building its bindings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid button in bindings: {0}")]
    Button(#[from] InputError),

    #[error("Invalid binding for {button}: {source}")]
    Binding {
        button: ButtonType,
        #[source]
        source: ActionError,
    },
}

/// Runtime settings of the daemon
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Longest sleep of the event loop when nothing is scheduled
    pub idle_wakeup_ms: u64,
    /// Log every key edge emitted on the virtual device
    pub log_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idle_wakeup_ms: 500,
            log_output: true,
        }
    }
}

/// A named set of button bindings in their textual action form
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

impl Default for Profile {
    fn default() -> Self {
        let bindings = [
            ("A", "button(KEY_ENTER)"),
            ("B", "button(KEY_ESC)"),
            ("X", "repeat(button(KEY_SPACE); 0.1)"),
            ("Y", "cycle(button(KEY_1), button(KEY_2), button(KEY_3))"),
            ("Start", "type('Hello 42')"),
            ("LeftBumper", "tap(button(KEY_LEFTSHIFT))"),
        ]
        .into_iter()
        .map(|(button, action)| (button.to_string(), action.to_string()))
        .collect();

        Self {
            name: "default".to_string(),
            settings: Settings::default(),
            bindings,
        }
    }
}

impl Profile {
    /// `<config dir>/padmacro/profile.toml`, falling back to the working directory
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(PROFILE_FILE);
        path
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading profile from {}", path.display());
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let profile = Self::from_toml_str(&text)?;
        debug!(
            "Loaded profile '{}' with {} bindings",
            profile.name,
            profile.bindings.len()
        );
        Ok(profile)
    }

    /// Writes the profile, creating parent directories as needed
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, self.to_toml_string()?)
            .await
            .map_err(io_error)?;
        info!("Saved profile '{}' to {}", self.name, path.display());
        Ok(())
    }

    /// Parses every binding into an action tree
    pub fn build_bindings(&self) -> Result<HashMap<ButtonType, Box<dyn Action>>, ConfigError> {
        let mut bindings = HashMap::with_capacity(self.bindings.len());
        for (name, text) in &self.bindings {
            let button = name.parse::<ButtonType>()?;
            let action = actions::parse(text)
                .map_err(|source| ConfigError::Binding { button, source })?;
            debug!("Bound {} => {}", button, action.describe());
            bindings.insert(button, action);
        }
        Ok(bindings)
    }
}
