use std::{collections::BTreeMap, fmt, path::PathBuf, sync::Arc};

use renderflow_types::AppSpec;
use tracing::{debug, warn};

use crate::{ProviderModule, RegistryError, RenderflowConfig, auto_build_app_spec, load_manifest_app_spec};

/// Factory returning a complete app spec.
pub type AppSpecFactory = Arc<dyn Fn() -> anyhow::Result<AppSpec> + Send + Sync>;

/// How a registered provider produces its [`AppSpec`].
#[derive(Clone)]
pub enum ProviderSource {
    /// Explicit app spec supplied by the provider.
    Spec(AppSpecFactory),
    /// Convention-based module, introspected on load.
    Module(Arc<dyn ProviderModule>),
    /// Manifest of a process-backed provider.
    External(PathBuf),
}

impl fmt::Debug for ProviderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSource::Spec(_) => f.write_str("Spec(<fn>)"),
            ProviderSource::Module(_) => f.write_str("Module(<provider module>)"),
            ProviderSource::External(path) => f.debug_tuple("External").field(path).finish(),
        }
    }
}

/// Named provider registrations.
///
/// Compiled-in registrations take precedence over providers declared in the
/// configuration file when both use the same name.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    builtin: BTreeMap<String, ProviderSource>,
    declared: BTreeMap<String, ProviderSource>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider that supplies its own app spec.
    pub fn register_spec(&mut self, name: impl Into<String>, factory: impl Fn() -> anyhow::Result<AppSpec> + Send + Sync + 'static) {
        self.insert_builtin(name.into(), ProviderSource::Spec(Arc::new(factory)));
    }

    /// Registers a convention-based provider module.
    pub fn register_module(&mut self, name: impl Into<String>, module: Arc<dyn ProviderModule>) {
        self.insert_builtin(name.into(), ProviderSource::Module(module));
    }

    fn insert_builtin(&mut self, name: String, source: ProviderSource) {
        if self.builtin.insert(name.clone(), source).is_some() {
            warn!(provider = %name, "provider registered twice; keeping the latest registration");
        }
    }

    /// Registers a process-backed provider from a manifest.
    pub fn register_external(&mut self, name: impl Into<String>, manifest_path: impl Into<PathBuf>) {
        self.declared.insert(name.into(), ProviderSource::External(manifest_path.into()));
    }

    /// Adds every provider declared in the configuration file.
    pub fn with_config(mut self, config: &RenderflowConfig) -> Self {
        for declaration in &config.providers {
            if self.builtin.contains_key(&declaration.name) {
                warn!(
                    provider = %declaration.name,
                    "configured provider shadows a built-in provider; the built-in one is used"
                );
                continue;
            }
            self.register_external(declaration.name.clone(), config.manifest_path(declaration));
        }
        self
    }

    /// Installed provider names, sorted.
    pub fn list_provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builtin.keys().chain(self.declared.keys()).cloned().collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtin.contains_key(name) || self.declared.contains_key(name)
    }

    fn source(&self, name: &str) -> Option<&ProviderSource> {
        self.builtin.get(name).or_else(|| self.declared.get(name))
    }

    /// Loads a provider's app definition by name.
    pub fn load_app_spec(&self, name: &str) -> Result<AppSpec, RegistryError> {
        let Some(source) = self.source(name) else {
            let names = self.list_provider_names();
            return Err(RegistryError::UnknownProvider {
                name: name.to_string(),
                available: if names.is_empty() { "none".to_string() } else { names.join(", ") },
            });
        };
        debug!(provider = name, source = ?source, "resolving app spec");
        match source {
            ProviderSource::Spec(factory) => factory().map_err(|error| RegistryError::Load {
                provider: name.to_string(),
                source: error.into(),
            }),
            ProviderSource::Module(module) => auto_build_app_spec(name, module.as_ref()),
            ProviderSource::External(path) => load_manifest_app_spec(name, path),
        }
    }
}
