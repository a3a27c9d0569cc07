use serde::{Deserialize, Serialize};

/// Favorited listing ids in insertion order, persisted under [`Favorites::STORAGE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    ids: Vec<String>,
}

impl Favorites {
    pub const STORAGE_KEY: &'static str = "favorites.ids";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    /// Add the id if absent, remove it otherwise. Returns the new membership.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_favorite(id) {
            self.ids.retain(|x| x != id);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}
