use std::{
    env,
    path::{Path, PathBuf},
};

use renderflow_util::{config_file_path, expand_tilde};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::RegistryError;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "RENDERFLOW_CONFIG_PATH";

/// Environment variable overriding the image engine argv (whitespace separated).
pub const IMAGE_ENGINE_ENV: &str = "RENDERFLOW_IMAGE_ENGINE";

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A provider declared in the configuration file and backed by a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDeclaration {
    pub name: String,
    /// Manifest location; relative paths resolve against the config file's directory.
    pub manifest_path: String,
}

/// External program used for png/jpg/svg/pdf figure exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEngineConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderflowConfig {
    #[serde(default)]
    pub providers: Vec<ProviderDeclaration>,
    #[serde(default)]
    pub image_engine: Option<ImageEngineConfig>,
    /// File the configuration was read from, used to anchor relative paths.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl RenderflowConfig {
    /// Loads the configuration from the default location.
    ///
    /// A missing file yields defaults; an unreadable or malformed one is
    /// logged and also yields defaults.
    pub fn load() -> Self {
        let path = default_config_path();
        if !path.exists() {
            return RenderflowConfig::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Failed to load renderflow config; using defaults");
                RenderflowConfig::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: RenderflowConfig = serde_json::from_str(&content).map_err(|error| RegistryError::Config {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Absolute manifest path for a declaration.
    pub fn manifest_path(&self, declaration: &ProviderDeclaration) -> PathBuf {
        let manifest = expand_tilde(&declaration.manifest_path);
        if manifest.is_absolute() {
            return manifest;
        }
        match self.source_path.as_deref().and_then(Path::parent) {
            Some(base) => base.join(manifest),
            None => manifest,
        }
    }

    /// Image engine argv, with [`IMAGE_ENGINE_ENV`] taking precedence.
    pub fn image_engine_command(&self) -> Option<Vec<String>> {
        if let Ok(raw) = env::var(IMAGE_ENGINE_ENV) {
            let argv: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
            if !argv.is_empty() {
                return Some(argv);
            }
        }
        self.image_engine
            .as_ref()
            .map(|engine| engine.command.clone())
            .filter(|argv| !argv.is_empty())
    }
}

/// Get the default path for the renderflow configuration file.
pub fn default_config_path() -> PathBuf {
    config_file_path(CONFIG_PATH_ENV, CONFIG_FILE_NAME)
}
