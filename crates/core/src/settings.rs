use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SettingsError;
use crate::inventory::SortKey;

/// Key the settings blob is stored under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PluginIdentity(pub String);

impl PluginIdentity {
    pub fn solution_manager() -> Self {
        Self("SolutionManager".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted operator preferences.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Organization the tool last connected to.
    #[serde(default)]
    pub last_used_org_url: Option<String>,
    #[serde(default)]
    pub default_sort: SortKey,
    #[serde(default)]
    pub descending: bool,
}

/// Load/save of [`Settings`] keyed by plugin identity.
pub trait SettingsStore: Send + Sync {
    /// `Ok(None)` when nothing was saved yet.
    fn load(&self, identity: &PluginIdentity) -> Result<Option<Settings>, SettingsError>;
    fn save(&self, identity: &PluginIdentity, settings: &Settings) -> Result<(), SettingsError>;
}

/// Stores each identity as `<root>/<identity>.toml`.
#[derive(Clone, Debug)]
pub struct FileSettingsStore {
    root: PathBuf,
}

impl FileSettingsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, identity: &PluginIdentity) -> PathBuf {
        self.root.join(format!("{}.toml", identity.as_str()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SettingsError {
    SettingsError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self, identity: &PluginIdentity) -> Result<Option<Settings>, SettingsError> {
        let path = self.path_for(identity);
        let s = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        let settings = toml::from_str(&s).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(settings))
    }

    fn save(&self, identity: &PluginIdentity, settings: &Settings) -> Result<(), SettingsError> {
        let path = self.path_for(identity);
        std::fs::create_dir_all(&self.root).map_err(|e| io_error(&self.root, e))?;
        let s = toml::to_string_pretty(settings)?;
        std::fs::write(&path, s).map_err(|e| io_error(&path, e))
    }
}

/// Loads settings for `identity`, falling back to defaults when none were saved.
pub fn load_or_default(
    store: &dyn SettingsStore,
    identity: &PluginIdentity,
) -> Result<Settings, SettingsError> {
    match store.load(identity)? {
        Some(settings) => {
            info!(%identity, "settings found and loaded");
            Ok(settings)
        }
        None => {
            warn!(%identity, "settings not found, a new settings file will be created");
            Ok(Settings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());
        let id = PluginIdentity::solution_manager();
        assert!(store.load(&id).unwrap().is_none());
        assert_eq!(load_or_default(&store, &id).unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("nested"));
        let id = PluginIdentity::solution_manager();
        let settings = Settings {
            last_used_org_url: Some("https://contoso.crm.dynamics.com".into()),
            default_sort: SortKey::InstalledOn,
            descending: true,
        };
        store.save(&id, &settings).unwrap();
        assert!(store.path_for(&id).ends_with("SolutionManager.toml"));
        assert_eq!(store.load(&id).unwrap(), Some(settings));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());
        let id = PluginIdentity::solution_manager();
        std::fs::write(store.path_for(&id), "descending = true\n").unwrap();
        let loaded = store.load(&id).unwrap().unwrap();
        assert!(loaded.descending);
        assert_eq!(loaded.default_sort, SortKey::FriendlyName);
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());
        let id = PluginIdentity::solution_manager();
        std::fs::write(store.path_for(&id), "descending = \"maybe\"\n").unwrap();
        assert!(matches!(store.load(&id), Err(SettingsError::Parse { .. })));
    }
}
