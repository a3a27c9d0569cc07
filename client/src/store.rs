//! Local key/value JSON store for the cart and favorites.
//!
//! Each key is one file, `<root>/<key>.json`. Reads never fail: a missing,
//! unreadable or corrupt entry loads as the type's default.

use std::path::{Path, PathBuf};

use loppis_common::cart::Cart;
use loppis_common::favorites::Favorites;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// `<data dir>/loppis`, or `./loppis` when the platform has no data dir.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("loppis")
    }

    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    pub fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let path = self.path(key);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable store entry, using empty");
                return T::default();
            }
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "corrupt store entry, using empty");
            T::default()
        })
    }

    pub fn try_save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        let path = self.path(key);
        std::fs::write(&path, data).map_err(|source| StoreError::Io { path, source })
    }

    /// Like [`try_save`](Self::try_save), but a failure is only logged.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_save(key, value) {
            tracing::warn!(key, error = %e, "failed to persist store entry");
        }
    }

    pub fn load_cart(&self) -> Cart {
        self.load(Cart::STORAGE_KEY)
    }

    pub fn save_cart(&self, cart: &Cart) {
        self.save(Cart::STORAGE_KEY, cart);
    }

    pub fn load_favorites(&self) -> Favorites {
        self.load(Favorites::STORAGE_KEY)
    }

    pub fn save_favorites(&self, favorites: &Favorites) {
        self.save(Favorites::STORAGE_KEY, favorites);
    }
}
