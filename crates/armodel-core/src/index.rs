//! Path index: absolute path string to entity handle.

use crate::error::{ModelError, Result};
use crate::graph::EntityId;
use std::collections::HashMap;

/// At most one entity per path. The index never owns entities.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    entries: HashMap<String, EntityId>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: &str, entity: EntityId) -> Result<()> {
        if self.entries.contains_key(path) {
            return Err(ModelError::DuplicatePath {
                path: path.to_string(),
            });
        }
        self.entries.insert(path.to_string(), entity);
        Ok(())
    }

    pub fn unregister(&mut self, path: &str) -> Option<EntityId> {
        self.entries.remove(path)
    }

    pub fn lookup(&self, path: &str) -> Option<EntityId> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rejects_occupied_path() {
        let mut index = PathIndex::new();
        index.register("/Swcs/asw1", EntityId::from_raw(1)).unwrap();

        let err = index
            .register("/Swcs/asw1", EntityId::from_raw(2))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicatePath { ref path } if path == "/Swcs/asw1"));
        assert_eq!(index.lookup("/Swcs/asw1"), Some(EntityId::from_raw(1)));
    }

    #[test]
    fn test_unregister_frees_the_path() {
        let mut index = PathIndex::new();
        index.register("/A", EntityId::from_raw(3)).unwrap();
        assert_eq!(index.unregister("/A"), Some(EntityId::from_raw(3)));
        assert!(index.lookup("/A").is_none());
        index.register("/A", EntityId::from_raw(4)).unwrap();
        assert_eq!(index.len(), 1);
    }
}
