use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use soroban_signing_core::{PortError, SessionStorePort};

/// Durable key holding the selected provider id.
pub const SELECTED_WALLET_KEY: &str = "selectedWalletId";

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn holding(provider_id: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(provider_id.to_owned()))),
        }
    }
}

impl SessionStorePort for MemoryStore {
    fn load(&self) -> Option<String> {
        self.value.lock().ok().and_then(|g| g.clone())
    }

    fn save(&self, provider_id: &str) -> Result<(), PortError> {
        let mut g = self
            .value
            .lock()
            .map_err(|e| PortError::Transport(format!("store lock poisoned: {e}")))?;
        *g = Some(provider_id.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), PortError> {
        let mut g = self
            .value
            .lock()
            .map_err(|e| PortError::Transport(format!("store lock poisoned: {e}")))?;
        *g = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSelection {
    #[serde(rename = "selectedWalletId")]
    selected_wallet_id: String,
}

/// JSON file store used by native runs. Unreadable or malformed files count as empty.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorePort for FileStore {
    fn load(&self) -> Option<String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session store unreadable");
                return None;
            }
        };
        match serde_json::from_str::<StoredSelection>(&raw) {
            Ok(stored) if !stored.selected_wallet_id.trim().is_empty() => {
                Some(stored.selected_wallet_id)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session store malformed");
                None
            }
        }
    }

    fn save(&self, provider_id: &str) -> Result<(), PortError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| PortError::Transport(format!("create store dir: {e}")))?;
        }
        let body = serde_json::to_string_pretty(&StoredSelection {
            selected_wallet_id: provider_id.to_owned(),
        })
        .map_err(|e| PortError::Decode(format!("encode session store: {e}")))?;
        std::fs::write(&self.path, body)
            .map_err(|e| PortError::Transport(format!("write session store: {e}")))
    }

    fn clear(&self) -> Result<(), PortError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Transport(format!("remove session store: {e}"))),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, PortError> {
        web_sys::window()
            .ok_or(PortError::NotImplemented("window is unavailable"))?
            .local_storage()
            .map_err(|e| PortError::Transport(format!("localStorage access failed: {e:?}")))?
            .ok_or(PortError::NotImplemented("localStorage is unavailable"))
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStorePort for LocalStorageStore {
    fn load(&self) -> Option<String> {
        Self::storage()
            .ok()?
            .get_item(SELECTED_WALLET_KEY)
            .ok()
            .flatten()
            .filter(|v| !v.trim().is_empty())
    }

    fn save(&self, provider_id: &str) -> Result<(), PortError> {
        Self::storage()?
            .set_item(SELECTED_WALLET_KEY, provider_id)
            .map_err(|e| PortError::Transport(format!("localStorage write failed: {e:?}")))
    }

    fn clear(&self) -> Result<(), PortError> {
        Self::storage()?
            .remove_item(SELECTED_WALLET_KEY)
            .map_err(|e| PortError::Transport(format!("localStorage remove failed: {e:?}")))
    }
}
