//! Which document owns which part of the model.
//!
//! A record ties a contribution root to a document. Every other entity
//! inherits the origin of its nearest recorded ancestor; entities with no
//! recorded ancestor are [`Origin::Unsaved`].

use crate::document::{Declaration, DocNode};
use crate::graph::EntityId;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Document(DocumentId),
    Unsaved,
}

#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub path: PathBuf,
    pub declaration: Option<Declaration>,
    /// Set when a mutation changes what this document would serialize to.
    pub dirty: bool,
}

/// One element of an entity as a document laid it out.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// The SHORT-NAME element.
    Name,
    /// The element(s) of the slot with this index.
    Slot(usize),
    /// An element the catalog does not model, kept verbatim.
    Opaque(DocNode),
}

/// Unmodelled element found inside a slot wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedOpaque {
    pub slot: usize,
    /// Number of modelled children that preceded it in the wrapper.
    pub position: usize,
    pub node: DocNode,
}

/// Per-document skeleton of an entity: what the writer needs to reproduce
/// the element beyond the modelled content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shell {
    pub attributes: Vec<(String, String)>,
    pub layout: Vec<Layout>,
    pub wrapped: Vec<WrappedOpaque>,
}

#[derive(Debug, Clone, Default)]
pub struct ProvenanceMap {
    documents: Vec<DocumentRecord>,
    records: HashMap<EntityId, DocumentId>,
}

impl ProvenanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(
        &mut self,
        path: impl Into<PathBuf>,
        declaration: Option<Declaration>,
    ) -> DocumentId {
        let id = DocumentId(u32::try_from(self.documents.len()).unwrap_or(u32::MAX));
        self.documents.push(DocumentRecord {
            path: path.into(),
            declaration,
            dirty: false,
        });
        id
    }

    pub fn document(&self, id: DocumentId) -> Option<&DocumentRecord> {
        self.documents.get(id.0 as usize)
    }

    pub fn documents(&self) -> impl Iterator<Item = (DocumentId, &DocumentRecord)> {
        self.documents
            .iter()
            .enumerate()
            .filter_map(|(i, record)| u32::try_from(i).ok().map(|raw| (DocumentId(raw), record)))
    }

    pub fn find_document(&self, path: &Path) -> Option<DocumentId> {
        self.documents()
            .find(|(_, record)| record.path == path)
            .map(|(id, _)| id)
    }

    pub fn record(&mut self, entity: EntityId, document: DocumentId) {
        self.records.insert(entity, document);
    }

    pub fn unrecord(&mut self, entity: EntityId) -> Option<DocumentId> {
        self.records.remove(&entity)
    }

    pub fn record_of(&self, entity: EntityId) -> Option<DocumentId> {
        self.records.get(&entity).copied()
    }

    pub fn mark_dirty(&mut self, document: DocumentId) {
        if let Some(record) = self.documents.get_mut(document.0 as usize) {
            record.dirty = true;
        }
    }

    pub fn mark_clean(&mut self, document: DocumentId) {
        if let Some(record) = self.documents.get_mut(document.0 as usize) {
            record.dirty = false;
        }
    }

    pub fn dirty_documents(&self) -> Vec<DocumentId> {
        self.documents()
            .filter(|(_, record)| record.dirty)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_tracking() {
        let mut map = ProvenanceMap::new();
        let a = map.add_document("a.arxml", None);
        let b = map.add_document("b.arxml", None);

        assert!(map.dirty_documents().is_empty());
        map.mark_dirty(b);
        assert_eq!(map.dirty_documents(), vec![b]);
        map.mark_clean(b);
        assert!(map.dirty_documents().is_empty());
        assert_eq!(map.find_document(Path::new("a.arxml")), Some(a));
    }

    #[test]
    fn test_records() {
        let mut map = ProvenanceMap::new();
        let doc = map.add_document("a.arxml", None);
        let entity = EntityId::from_raw(7);

        map.record(entity, doc);
        assert_eq!(map.record_of(entity), Some(doc));
        assert_eq!(map.unrecord(entity), Some(doc));
        assert_eq!(map.record_of(entity), None);
    }
}
