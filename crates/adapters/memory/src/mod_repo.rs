//! In-memory implementation of [`ModRepository`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use modhub_app::ports::ModRepository;
use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::id::ModId;
use modhub_domain::mods::Mod;

use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryModRepository {
    mods: RwLock<BTreeMap<ModId, Mod>>,
}

impl MemoryModRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

const POISONED: StorageError = StorageError::Poisoned("mod");

impl ModRepository for MemoryModRepository {
    async fn create(&self, m: Mod) -> Result<Mod, ModHubError> {
        let mut mods = self.mods.write().map_err(|_| POISONED)?;
        if mods.contains_key(&m.id) {
            return Err(StorageError::Duplicate {
                entity: "Mod",
                id: m.id.to_string(),
            }
            .into());
        }
        mods.insert(m.id, m.clone());
        Ok(m)
    }

    async fn get_by_id(&self, id: ModId) -> Result<Option<Mod>, ModHubError> {
        let mods = self.mods.read().map_err(|_| POISONED)?;
        Ok(mods.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Mod>, ModHubError> {
        let mods = self.mods.read().map_err(|_| POISONED)?;
        Ok(mods.values().cloned().collect())
    }

    async fn find_by_target(&self, target: &str) -> Result<Option<Mod>, ModHubError> {
        let mods = self.mods.read().map_err(|_| POISONED)?;
        if let Ok(id) = target.trim().parse::<ModId>()
            && let Some(m) = mods.get(&id)
        {
            return Ok(Some(m.clone()));
        }
        Ok(mods.values().find(|m| m.matches_target(target)).cloned())
    }

    async fn update(&self, m: Mod) -> Result<Mod, ModHubError> {
        let mut mods = self.mods.write().map_err(|_| POISONED)?;
        let Some(slot) = mods.get_mut(&m.id) else {
            return Err(NotFoundError {
                entity: "Mod",
                id: m.id.to_string(),
            }
            .into());
        };
        *slot = m.clone();
        Ok(m)
    }

    async fn delete(&self, id: ModId) -> Result<(), ModHubError> {
        let mut mods = self.mods.write().map_err(|_| POISONED)?;
        mods.remove(&id);
        Ok(())
    }
}
