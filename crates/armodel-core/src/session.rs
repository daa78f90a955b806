//! The caller-held session: one model plus the collaborators that load and
//! store it.
//!
//! A `Session` is not safe for concurrent use. Reference lookups memoize
//! through `Cell`s, so the type is `!Sync`; share it behind a lock.

use crate::autosar::AUTOSAR;
use crate::catalog::{EntityKind, SchemaCatalog};
use crate::config::ModelConfig;
use crate::document::{Declaration, DocTree, DocumentIo};
use crate::error::{ModelError, Result};
use crate::graph::EntityId;
use crate::merge::Merger;
use crate::model::Model;
use crate::provenance::{DocumentId, Origin, Shell};
use crate::serializer;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct Session {
    catalog: &'static dyn SchemaCatalog,
    io: Box<dyn DocumentIo>,
    config: ModelConfig,
    model: Option<Model>,
}

impl Session {
    /// Session over the shipped AUTOSAR catalog with default settings.
    pub fn new(io: impl DocumentIo + 'static) -> Self {
        Self::with_config(io, ModelConfig::default())
    }

    pub fn with_config(io: impl DocumentIo + 'static, config: ModelConfig) -> Self {
        Self::with_catalog(io, config, &AUTOSAR)
    }

    pub fn with_catalog(
        io: impl DocumentIo + 'static,
        config: ModelConfig,
        catalog: &'static dyn SchemaCatalog,
    ) -> Self {
        Self {
            catalog,
            io: Box::new(io),
            config,
            model: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn root(&self) -> Option<EntityId> {
        self.model.as_ref().map(Model::root)
    }

    pub fn model(&self) -> Result<&Model> {
        self.model.as_ref().ok_or(ModelError::NoModel)
    }

    pub fn model_mut(&mut self) -> Result<&mut Model> {
        self.model.as_mut().ok_or(ModelError::NoModel)
    }

    pub fn get_node(&self, path: &str) -> Option<EntityId> {
        self.model.as_ref().and_then(|model| model.get_node(path))
    }

    /// Read and merge `paths` into the session, all or nothing.
    ///
    /// On any failure the session is left as it was before the call; a
    /// session that had no model still has none.
    pub fn read<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<EntityId> {
        let mut staged = self.staged();
        for path in paths {
            let path = path.as_ref();
            let tree = self.io.read(path).inspect_err(|err| {
                warn!(path = %path.display(), error = %err, "read failed");
            })?;
            self.merge_into(&mut staged, path, &tree)?;
        }
        let root = staged.root();
        self.model = Some(staged);
        Ok(root)
    }

    /// Merge an already parsed tree as if it had been read from `path`.
    pub fn merge_document(&mut self, path: &Path, tree: &DocTree) -> Result<DocumentId> {
        let mut staged = self.staged();
        let document = self.merge_into(&mut staged, path, tree)?;
        self.model = Some(staged);
        Ok(document)
    }

    fn staged(&self) -> Model {
        self.model
            .clone()
            .unwrap_or_else(|| Model::new(self.catalog))
    }

    fn merge_into(&self, model: &mut Model, path: &Path, tree: &DocTree) -> Result<DocumentId> {
        let document = model.provenance.add_document(path, tree.declaration.clone());
        let created = Merger::new(model, document, path, self.config.reader.strict)
            .merge(tree)
            .inspect_err(|err| warn!(path = %path.display(), error = %err, "merge failed"))?;
        info!(path = %path.display(), created, "merged document");
        Ok(document)
    }

    /// Start a new document at `path` holding one package, and write it.
    ///
    /// Returns the package. A path the session already knows keeps its
    /// document; the package is added to it. Fails with `FileExists` when
    /// the file is present and `overwrite` is false.
    pub fn create_new_file(
        &mut self,
        path: impl AsRef<Path>,
        overwrite: bool,
        package: &str,
    ) -> Result<EntityId> {
        let path = path.as_ref();
        if !overwrite && self.io.exists(path) {
            return Err(ModelError::FileExists {
                path: path.to_path_buf(),
            });
        }
        let mut staged = self.staged();
        let document = match staged.provenance.find_document(path) {
            Some(document) => document,
            None => {
                let declaration = self.config.writer.xml_declaration.then(Declaration::default);
                staged.provenance.add_document(path, declaration)
            }
        };
        let root = staged.root();
        let package = staged.create_child(root, "ar_packages", EntityKind::ArPackage, package)?;
        staged.provenance.record(package, document);
        staged
            .entity_mut(root)?
            .shells
            .entry(document)
            .or_insert_with(|| Shell {
                attributes: self.config.writer.root_attributes(),
                ..Shell::default()
            });

        let tree = serializer::document_tree(&staged, document, &self.config.writer)?;
        self.io.write(path, &tree)?;
        info!(path = %path.display(), "created document");
        self.model = Some(staged);
        Ok(package)
    }

    /// Rewrite every document whose content changed; returns their paths.
    ///
    /// Fails with `NoSaveTarget` before writing anything when a top-level
    /// subtree belongs to no document.
    pub fn save(&mut self) -> Result<Vec<PathBuf>> {
        let model = self.model.as_ref().ok_or(ModelError::NoModel)?;
        let root = model.entity(model.root())?;
        if let Some(orphan) = root
            .all_children()
            .find(|top| model.origin(*top) == Origin::Unsaved)
        {
            return Err(ModelError::NoSaveTarget {
                path: model.describe(orphan),
            });
        }

        let mut pending = Vec::new();
        for document in model.dirty_documents() {
            let Some(record) = model.provenance.document(document) else {
                continue;
            };
            let tree = serializer::document_tree(model, document, &self.config.writer)?;
            pending.push((document, record.path.clone(), tree));
        }

        let mut written = Vec::with_capacity(pending.len());
        for (document, path, tree) in pending {
            self.io.write(&path, &tree)?;
            info!(path = %path.display(), "saved document");
            if let Some(model) = self.model.as_mut() {
                model.provenance.mark_clean(document);
            }
            written.push(path);
        }
        Ok(written)
    }

    /// Write the whole merged model as one document at `path`.
    pub fn save_as(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        let model = self.model()?;
        if !overwrite && self.io.exists(path) {
            return Err(ModelError::FileExists {
                path: path.to_path_buf(),
            });
        }
        let tree = serializer::merged_tree(model, &self.config.writer)?;
        self.io.write(path, &tree)?;
        info!(path = %path.display(), entities = model.len(), "saved merged model");
        Ok(())
    }

    /// Drop the model. Handles from before the reset are meaningless after.
    pub fn reinit(&mut self) {
        if self.model.take().is_some() {
            debug!("session reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocNode;
    use crate::error::ErrorKind;
    use crate::memory::MemoryIo;

    fn named(tag: &str, name: &str) -> DocNode {
        DocNode::new(tag).with_child(DocNode::new("SHORT-NAME").with_text(name))
    }

    fn single_package(package: &str, element: DocNode) -> DocTree {
        let elements = DocNode::new("ELEMENTS").with_child(element);
        let package = named("AR-PACKAGE", package).with_child(elements);
        let packages = DocNode::new("AR-PACKAGES").with_child(package);
        DocTree::new(DocNode::new("AUTOSAR").with_child(packages))
    }

    fn session_with(files: &[(&str, DocTree)]) -> (Session, MemoryIo) {
        let io = MemoryIo::default();
        for (path, tree) in files {
            io.insert(path, tree.clone());
        }
        (Session::new(io.clone()), io)
    }

    #[test]
    fn test_read_failure_leaves_no_model() {
        let files = [("ok.arxml", single_package("P", named("SW-BASE-TYPE", "u8")))];
        let (mut session, io) = session_with(&files);
        io.insert("bad.arxml", DocTree::new(DocNode::new("NOT-AUTOSAR")));

        let err = session.read(&["ok.arxml", "bad.arxml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(!session.is_loaded());
        assert!(session.root().is_none());
        assert_eq!(session.model().unwrap_err().kind(), ErrorKind::NoModel);
    }

    #[test]
    fn test_failed_read_keeps_previous_model() {
        let tree = single_package("P", named("SW-BASE-TYPE", "u8"));
        let (mut session, _) = session_with(&[("a.arxml", tree.clone()), ("b.arxml", tree)]);
        session.read(&["a.arxml"]).unwrap();

        let err = session.read(&["b.arxml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MergeConflict);
        assert!(session.get_node("/P/u8").is_some());
        assert_eq!(session.model().unwrap().documents().count(), 1);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let (mut session, _) = session_with(&[]);
        let err = session.read(&["nowhere.arxml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_save_writes_only_dirty_documents() {
        let (mut session, io) = session_with(&[
            ("a.arxml", single_package("A", named("SW-BASE-TYPE", "u8"))),
            ("b.arxml", single_package("B", named("SYSTEM-SIGNAL", "sig"))),
        ]);
        session.read(&["a.arxml", "b.arxml"]).unwrap();
        assert!(session.save().unwrap().is_empty());

        let sig = session.get_node("/B/sig").unwrap();
        session
            .model_mut()
            .unwrap()
            .set_field(sig, "dynamic_length", true)
            .unwrap();
        let written = session.save().unwrap();

        assert_eq!(written, vec![PathBuf::from("b.arxml")]);
        assert_eq!(io.writes(), vec![PathBuf::from("b.arxml")]);
        assert!(session.model().unwrap().dirty_documents().is_empty());
    }

    #[test]
    fn test_unowned_package_blocks_save() {
        let files = [("a.arxml", single_package("A", named("SW-BASE-TYPE", "u8")))];
        let (mut session, io) = session_with(&files);
        session.read(&["a.arxml"]).unwrap();
        let model = session.model_mut().unwrap();
        let root = model.root();
        let u8_ty = model.get_node("/A/u8").unwrap();
        model.set_field(u8_ty, "base_type_size", 8).unwrap();
        let orphan = model
            .create_child(root, "ar_packages", EntityKind::ArPackage, "Orphan")
            .unwrap();

        let err = session.save().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSaveTarget);
        assert!(io.writes().is_empty());

        let model = session.model_mut().unwrap();
        let (doc, _) = model.documents().next().unwrap();
        model.assign_document(orphan, doc).unwrap();
        assert_eq!(session.save().unwrap(), vec![PathBuf::from("a.arxml")]);
    }

    #[test]
    fn test_create_new_file_respects_overwrite() {
        let (mut session, io) = session_with(&[]);
        let pkg = session
            .create_new_file("new.arxml", false, "NewPack")
            .unwrap();
        assert_eq!(session.model().unwrap().node(pkg).unwrap().path(), Some("/NewPack"));
        let written = io.get("new.arxml").unwrap();
        assert_eq!(written.root.attribute("xmlns"), Some("http://autosar.org/schema/r4.0"));
        let package = written
            .root
            .child("AR-PACKAGES")
            .and_then(|p| p.child("AR-PACKAGE"))
            .unwrap();
        assert_eq!(package.child("SHORT-NAME").map(DocNode::text), Some("NewPack"));

        let err = session
            .create_new_file("new.arxml", false, "Other")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileExists);
        assert!(session.get_node("/Other").is_none());

        session.create_new_file("new.arxml", true, "Other").unwrap();
        assert!(session.get_node("/Other").is_some());
    }

    #[test]
    fn test_save_as_checks_destination() {
        let (mut session, io) = session_with(&[]);
        assert_eq!(
            session.save_as("merged.arxml", true).unwrap_err().kind(),
            ErrorKind::NoModel
        );
        session.create_new_file("a.arxml", true, "A").unwrap();
        session.save_as("merged.arxml", false).unwrap();
        assert!(io.contains("merged.arxml"));
        assert_eq!(
            session.save_as("merged.arxml", false).unwrap_err().kind(),
            ErrorKind::FileExists
        );
    }

    #[test]
    fn test_reinit_clears_everything() {
        let files = [("a.arxml", single_package("A", named("SW-BASE-TYPE", "u8")))];
        let (mut session, _) = session_with(&files);
        session.read(&["a.arxml"]).unwrap();
        session.reinit();
        assert!(!session.is_loaded());
        assert!(session.get_node("/A/u8").is_none());
    }
}
