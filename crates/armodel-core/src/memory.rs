//! Document store kept in memory, for tests and for models that never
//! touch the filesystem.

use crate::document::{DocTree, DocumentIo};
use crate::error::{ModelError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Clones share one store, so a test can keep a handle after giving the
/// other to a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryIo {
    files: Rc<RefCell<HashMap<PathBuf, DocTree>>>,
    writes: Rc<RefCell<Vec<PathBuf>>>,
}

impl MemoryIo {
    pub fn insert(&self, path: &str, tree: DocTree) {
        self.files.borrow_mut().insert(PathBuf::from(path), tree);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.borrow().contains_key(Path::new(path))
    }

    pub fn get(&self, path: &str) -> Option<DocTree> {
        self.files.borrow().get(Path::new(path)).cloned()
    }

    /// Paths written so far, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.borrow().clone()
    }
}

impl DocumentIo for MemoryIo {
    fn read(&self, path: &Path) -> Result<DocTree> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| ModelError::io(path, io::Error::from(io::ErrorKind::NotFound)))
    }

    fn write(&self, path: &Path, tree: &DocTree) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), tree.clone());
        self.writes.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }
}
