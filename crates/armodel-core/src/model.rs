//! The merged model: arena, path index and provenance behind one API.
//!
//! Every mutation validates completely before it writes, so an `Err` leaves
//! the model exactly as it was.

use crate::catalog::{EntityKind, FieldValue, KindConstraint, SchemaCatalog};
use crate::error::{ModelError, Result};
use crate::graph::{Entity, EntityGraph, EntityId, SlotContent};
use crate::index::PathIndex;
use crate::provenance::{DocumentId, Origin, ProvenanceMap};
use crate::validation::PathPlan;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

#[derive(Clone)]
pub struct Model {
    pub(crate) catalog: &'static dyn SchemaCatalog,
    pub(crate) graph: EntityGraph,
    pub(crate) index: PathIndex,
    pub(crate) provenance: ProvenanceMap,
    pub(crate) root: EntityId,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("root", &self.root)
            .field("entities", &self.graph.len())
            .field("paths", &self.index.len())
            .field("documents", &self.provenance.documents().count())
            .finish_non_exhaustive()
    }
}

impl Model {
    /// An empty model holding only the root entity.
    pub fn new(catalog: &'static dyn SchemaCatalog) -> Self {
        let kind = catalog.root_kind();
        let mut graph = EntityGraph::new();
        let root = graph.insert(Entity::new(kind, None, catalog.slots(kind)));
        Self {
            catalog,
            graph,
            index: PathIndex::new(),
            provenance: ProvenanceMap::new(),
            root,
        }
    }

    pub fn catalog(&self) -> &'static dyn SchemaCatalog {
        self.catalog
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Number of live entities, the root included.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn node(&self, id: EntityId) -> Result<Node<'_>> {
        Ok(Node {
            model: self,
            id,
            entity: self.entity(id)?,
        })
    }

    pub fn get_node(&self, path: &str) -> Option<EntityId> {
        self.index.lookup(path)
    }

    pub fn children(&self, id: EntityId, slot: &str) -> Result<&[EntityId]> {
        let entity = self.entity(id)?;
        let slot = self.child_slot(entity.kind, slot)?;
        Ok(entity.children_in(slot.index))
    }

    /// Children across every slot whose kind satisfies `constraint`, in
    /// slot order.
    pub fn children_of_kind(
        &self,
        id: EntityId,
        constraint: KindConstraint,
    ) -> Result<Vec<EntityId>> {
        let entity = self.entity(id)?;
        Ok(entity
            .all_children()
            .filter(|child| {
                self.graph
                    .get(*child)
                    .is_some_and(|c| self.catalog.satisfies(c.kind, constraint))
            })
            .collect())
    }

    pub fn child_named(&self, id: EntityId, name: &str) -> Result<Option<EntityId>> {
        let entity = self.entity(id)?;
        Ok(entity
            .all_children()
            .find(|child| self.graph.get(*child).and_then(|c| c.name.as_deref()) == Some(name)))
    }

    pub fn field(&self, id: EntityId, slot: &str) -> Result<Option<&FieldValue>> {
        let entity = self.entity(id)?;
        let (index, _) = self.field_slot(entity.kind, slot)?;
        match &entity.slots[index] {
            SlotContent::Field(value) => Ok(value.as_ref()),
            _ => Ok(None),
        }
    }

    /// Store a scalar, coerced to the slot's value type.
    pub fn set_field(
        &mut self,
        id: EntityId,
        slot: &str,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        let kind = self.entity(id)?.kind;
        let (index, ty) = self.field_slot(kind, slot)?;
        let value = ty.coerce(value.into()).map_err(|message| ModelError::InvalidValue {
            slot: slot.to_string(),
            message,
        })?;
        self.write_field(id, index, Some(value))
    }

    pub fn clear_field(&mut self, id: EntityId, slot: &str) -> Result<()> {
        let kind = self.entity(id)?.kind;
        let (index, _) = self.field_slot(kind, slot)?;
        self.write_field(id, index, None)
    }

    fn write_field(&mut self, id: EntityId, index: usize, value: Option<FieldValue>) -> Result<()> {
        let entity = self.entity_mut(id)?;
        if matches!(&entity.slots[index], SlotContent::Field(current) if *current == value) {
            return Ok(());
        }
        entity.slots[index] = SlotContent::Field(value);
        self.mark_dirty_origin(id);
        Ok(())
    }

    /// Create a child of `kind` in `slot` of `parent`.
    ///
    /// `name` is required for referrable kinds and must be empty for the
    /// others. A single-valued slot that is already occupied is replaced,
    /// its previous content removed with its subtree.
    pub fn create_child(
        &mut self,
        parent: EntityId,
        slot: &str,
        kind: EntityKind,
        name: &str,
    ) -> Result<EntityId> {
        let parent_kind = self.entity(parent)?.kind;
        let slot = self.child_slot(parent_kind, slot)?;
        let name = self.check_name(kind, name)?;
        self.check_accepts(parent, slot.accepts, kind)?;

        let replaced = self.occupant(parent, slot.index, slot.many);
        let except: Vec<EntityId> = replaced.into_iter().collect();
        self.check_sibling_name(parent, name.as_deref(), &except)?;

        let path = match (&name, self.base_path(parent)) {
            (Some(name), Some(base)) => Some(format!("{base}/{name}")),
            _ => None,
        };
        if let Some(path) = &path {
            let exempt = self.subtree_set(replaced);
            self.check_paths_free(&[(parent, Some(path.clone()))], &exempt)?;
        }

        if let Some(old) = replaced {
            self.remove(old)?;
        }
        let mut entity = Entity::new(kind, name, self.catalog.slots(kind));
        entity.parent = Some((parent, slot.index));
        entity.path.clone_from(&path);
        let id = self.graph.insert(entity);
        if let Some(path) = &path {
            self.index.register(path, id)?;
        }
        self.push_child(parent, slot.index, id);
        self.mark_dirty_origin(id);
        Ok(id)
    }

    /// Create an entity outside the tree, to be placed later with
    /// [`Model::attach`].
    pub fn create_detached(&mut self, kind: EntityKind, name: &str) -> Result<EntityId> {
        let name = self.check_name(kind, name)?;
        Ok(self.graph.insert(Entity::new(kind, name, self.catalog.slots(kind))))
    }

    /// Place a detached entity (with its subtree) into `slot` of `parent`.
    pub fn attach(&mut self, parent: EntityId, slot: &str, child: EntityId) -> Result<()> {
        let child_entity = self.entity(child)?;
        if child == self.root || child_entity.parent.is_some() {
            return Err(ModelError::AlreadyAttached {
                entity: self.describe(child),
            });
        }
        let kind = child_entity.kind;
        let name = child_entity.name.clone();
        let parent_kind = self.entity(parent)?.kind;
        let slot = self.child_slot(parent_kind, slot)?;
        self.check_accepts(parent, slot.accepts, kind)?;
        self.check_not_cycle(child, parent)?;

        let replaced = self.occupant(parent, slot.index, slot.many);
        let except: Vec<EntityId> = replaced.into_iter().collect();
        self.check_sibling_name(parent, name.as_deref(), &except)?;
        let plan = self.plan_paths(child, self.base_path(parent).as_deref(), None);
        self.check_paths_free(&plan, &self.subtree_set(replaced))?;

        if let Some(old) = replaced {
            self.remove(old)?;
        }
        self.entity_mut(child)?.parent = Some((parent, slot.index));
        self.push_child(parent, slot.index, child);
        self.apply_paths(plan)?;
        let touched = self.documents_touching(child);
        self.mark_dirty(&touched);
        Ok(())
    }

    /// Rename a referrable entity, rewriting the paths of its subtree.
    pub fn rename(&mut self, id: EntityId, name: &str) -> Result<()> {
        if id == self.root {
            return Err(ModelError::RootEntity);
        }
        let entity = self.entity(id)?;
        let kind = entity.kind;
        let parent = entity.parent;
        if entity.name.as_deref() == Some(name) {
            return Ok(());
        }
        if !self.catalog.is_referrable(kind) {
            return Err(ModelError::InvalidValue {
                slot: "name".to_string(),
                message: format!("{kind} is not referrable and takes no name"),
            });
        }
        if name.is_empty() {
            return Err(ModelError::NoShortName { kind });
        }
        let base = match parent {
            Some((parent, _)) => {
                self.check_sibling_name(parent, Some(name), &[id])?;
                self.base_path(parent)
            }
            None => None,
        };
        let plan = self.plan_paths(id, base.as_deref(), Some(name));
        self.check_paths_free(&plan, &self.subtree_set(Some(id)))?;

        let touched = self.documents_touching(id);
        let old = self.entity_mut(id)?.name.replace(name.to_string());
        self.apply_paths(plan)?;
        self.mark_dirty(&touched);
        debug!(from = ?old, to = name, "renamed entity");
        Ok(())
    }

    /// Move an attached entity into `slot` of `parent`.
    ///
    /// The subtree joins the document of its new parent; moved to the top
    /// level it keeps the document it had.
    pub fn move_to(&mut self, id: EntityId, parent: EntityId, slot: &str) -> Result<()> {
        if id == self.root {
            return Err(ModelError::RootEntity);
        }
        let entity = self.entity(id)?;
        let Some((old_parent, old_slot)) = entity.parent else {
            return self.attach(parent, slot, id);
        };
        let kind = entity.kind;
        let name = entity.name.clone();
        let parent_kind = self.entity(parent)?.kind;
        let slot = self.child_slot(parent_kind, slot)?;
        self.check_accepts(parent, slot.accepts, kind)?;
        self.check_not_cycle(id, parent)?;
        if old_parent == parent && old_slot == slot.index {
            return Ok(());
        }

        let replaced = self.occupant(parent, slot.index, slot.many);
        let mut except = vec![id];
        except.extend(replaced);
        self.check_sibling_name(parent, name.as_deref(), &except)?;
        let plan = self.plan_paths(id, self.base_path(parent).as_deref(), None);
        let mut exempt = self.subtree_set(Some(id));
        exempt.extend(self.subtree_set(replaced));
        self.check_paths_free(&plan, &exempt)?;

        let mut touched = self.documents_touching(id);
        let previous = self.origin(id);
        if let Some(old) = replaced {
            self.remove(old)?;
        }
        self.detach_from_parent(id);
        self.entity_mut(id)?.parent = Some((parent, slot.index));
        self.push_child(parent, slot.index, id);
        self.apply_paths(plan)?;
        if parent == self.root {
            if let Origin::Document(doc) = previous {
                self.provenance.record(id, doc);
            }
        } else {
            self.provenance.unrecord(id);
        }
        self.prune_shells(id);
        touched.extend(self.documents_touching(id));
        self.mark_dirty(&touched);
        Ok(())
    }

    /// Delete an entity and its subtree.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        if id == self.root {
            return Err(ModelError::RootEntity);
        }
        self.entity(id)?;
        let touched = self.documents_touching(id);
        self.detach_from_parent(id);
        let subtree = self.graph.subtree(id);
        for member in &subtree {
            if let Some(entity) = self.graph.remove(*member)
                && let Some(path) = entity.path
                && self.index.lookup(&path) == Some(*member)
            {
                self.index.unregister(&path);
            }
            self.provenance.unrecord(*member);
        }
        self.mark_dirty(&touched);
        debug!(entity = %id, removed = subtree.len(), "removed subtree");
        Ok(())
    }

    /// Whether `id` hangs below the root.
    pub fn is_attached(&self, id: EntityId) -> bool {
        id == self.root || self.graph.ancestors(id).last() == Some(&self.root)
    }

    // --- provenance ---

    pub fn origin_of(&self, id: EntityId) -> Result<Origin> {
        self.entity(id)?;
        Ok(self.origin(id))
    }

    pub fn documents(&self) -> impl Iterator<Item = (DocumentId, &Path)> {
        self.provenance
            .documents()
            .map(|(id, record)| (id, record.path.as_path()))
    }

    pub fn document_path(&self, document: DocumentId) -> Option<&Path> {
        self.provenance
            .document(document)
            .map(|record| record.path.as_path())
    }

    pub fn dirty_documents(&self) -> Vec<DocumentId> {
        self.provenance.dirty_documents()
    }

    /// Make `document` the owner of the subtree under `id`.
    pub fn assign_document(&mut self, id: EntityId, document: DocumentId) -> Result<()> {
        if id == self.root {
            return Err(ModelError::RootEntity);
        }
        self.entity(id)?;
        if self.provenance.document(document).is_none() {
            return Err(ModelError::UnknownEntity {
                id: document.to_string(),
            });
        }
        if !self.is_attached(id) {
            return Err(ModelError::NotAttached {
                entity: self.describe(id),
            });
        }
        let mut touched = self.documents_touching(id);
        self.provenance.record(id, document);
        self.prune_shells(id);
        touched.insert(document);
        self.mark_dirty(&touched);
        Ok(())
    }

    // --- crate internals ---

    pub(crate) fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.graph
            .get(id)
            .ok_or_else(|| ModelError::UnknownEntity { id: id.to_string() })
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.graph
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownEntity { id: id.to_string() })
    }

    /// Human readable handle for error messages.
    pub(crate) fn describe(&self, id: EntityId) -> String {
        if id == self.root {
            return "/".to_string();
        }
        match self.graph.get(id) {
            Some(Entity { path: Some(path), .. }) => path.clone(),
            Some(Entity {
                kind,
                name: Some(name),
                ..
            }) => format!("{kind} '{name}'"),
            Some(Entity {
                kind,
                parent: Some((parent, _)),
                ..
            }) => format!("{kind} in {}", self.describe(*parent)),
            Some(entity) => entity.kind.to_string(),
            None => id.to_string(),
        }
    }

    /// Prefix for the paths of children of `id`; `None` while detached.
    pub(crate) fn base_path(&self, id: EntityId) -> Option<String> {
        if id == self.root {
            return Some(String::new());
        }
        let entity = self.graph.get(id)?;
        if self.catalog.is_referrable(entity.kind) {
            entity.path.clone()
        } else {
            entity.parent.and_then(|(parent, _)| self.base_path(parent))
        }
    }

    /// Paths the subtree under `top` would get below `base`, optionally
    /// with `top` renamed.
    pub(crate) fn plan_paths(
        &self,
        top: EntityId,
        base: Option<&str>,
        rename: Option<&str>,
    ) -> PathPlan {
        let mut plan = Vec::new();
        let mut stack = vec![(top, base.map(str::to_string))];
        while let Some((id, base)) = stack.pop() {
            let Some(entity) = self.graph.get(id) else {
                continue;
            };
            let name = if id == top {
                rename.or(entity.name.as_deref())
            } else {
                entity.name.as_deref()
            };
            let path = match (&base, name) {
                (Some(base), Some(name)) if self.catalog.is_referrable(entity.kind) => {
                    Some(format!("{base}/{name}"))
                }
                _ => None,
            };
            let child_base = if self.catalog.is_referrable(entity.kind) {
                path.clone()
            } else {
                base
            };
            for child in entity.all_children() {
                stack.push((child, child_base.clone()));
            }
            plan.push((id, path));
        }
        plan
    }

    /// Rewrite the index for a checked plan: old paths out, new paths in.
    pub(crate) fn apply_paths(&mut self, plan: PathPlan) -> Result<()> {
        for (id, _) in &plan {
            if let Some(old) = self.graph.get(*id).and_then(|e| e.path.clone())
                && self.index.lookup(&old) == Some(*id)
            {
                self.index.unregister(&old);
            }
        }
        for (id, path) in plan {
            if let Some(path) = &path {
                self.index.register(path, id)?;
            }
            self.entity_mut(id)?.path = path;
        }
        Ok(())
    }

    pub(crate) fn origin(&self, id: EntityId) -> Origin {
        std::iter::once(id)
            .chain(self.graph.ancestors(id))
            .find_map(|candidate| self.provenance.record_of(candidate))
            .map_or(Origin::Unsaved, Origin::Document)
    }

    /// Documents whose serialized form includes any part of `id`'s subtree.
    pub(crate) fn documents_touching(&self, id: EntityId) -> BTreeSet<DocumentId> {
        let mut out = BTreeSet::new();
        if let Origin::Document(doc) = self.origin(id) {
            out.insert(doc);
        }
        for member in self.graph.subtree(id) {
            if let Some(doc) = self.provenance.record_of(member) {
                out.insert(doc);
            }
            if let Some(entity) = self.graph.get(member) {
                out.extend(entity.shells.keys().copied());
            }
        }
        out
    }

    pub(crate) fn mark_dirty(&mut self, documents: &BTreeSet<DocumentId>) {
        for doc in documents {
            self.provenance.mark_dirty(*doc);
        }
    }

    pub(crate) fn mark_dirty_origin(&mut self, id: EntityId) {
        if let Origin::Document(doc) = self.origin(id) {
            self.provenance.mark_dirty(doc);
        }
    }

    pub(crate) fn push_child(&mut self, parent: EntityId, slot: usize, child: EntityId) {
        if let Some(SlotContent::Children(ids)) = self
            .graph
            .get_mut(parent)
            .and_then(|e| e.slots.get_mut(slot))
        {
            ids.push(child);
        }
    }

    fn detach_from_parent(&mut self, id: EntityId) {
        let Some((parent, slot)) = self.graph.get_mut(id).and_then(|e| e.parent.take()) else {
            return;
        };
        if let Some(SlotContent::Children(ids)) = self
            .graph
            .get_mut(parent)
            .and_then(|e| e.slots.get_mut(slot))
        {
            ids.retain(|child| *child != id);
        }
    }

    /// Drop the layout of documents that no longer contribute anything to
    /// the subtree under `top`.
    fn prune_shells(&mut self, top: EntityId) {
        let members = self.graph.subtree(top);
        let mut contributors: HashMap<EntityId, BTreeSet<DocumentId>> = HashMap::new();
        for member in members.iter().rev() {
            let Some(entity) = self.graph.get(*member) else {
                continue;
            };
            let mut docs: BTreeSet<DocumentId> = entity
                .all_children()
                .filter_map(|child| contributors.get(&child))
                .flatten()
                .copied()
                .collect();
            if let Origin::Document(doc) = self.origin(*member) {
                docs.insert(doc);
            }
            contributors.insert(*member, docs);
        }
        for member in members {
            if let (Some(keep), Some(entity)) =
                (contributors.get(&member), self.graph.get_mut(member))
            {
                entity.shells.retain(|doc, _| keep.contains(doc));
            }
        }
    }

    fn occupant(&self, parent: EntityId, slot: usize, many: bool) -> Option<EntityId> {
        if many {
            return None;
        }
        self.graph.get(parent)?.children_in(slot).first().copied()
    }

    fn subtree_set(&self, id: Option<EntityId>) -> HashSet<EntityId> {
        id.map(|id| self.graph.subtree(id).into_iter().collect())
            .unwrap_or_default()
    }
}

/// Borrowed read view of one entity.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    model: &'a Model,
    id: EntityId,
    entity: &'a Entity,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind
    }

    pub fn name(&self) -> Option<&'a str> {
        self.entity.name.as_deref()
    }

    pub fn path(&self) -> Option<&'a str> {
        self.entity.path.as_deref()
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.entity.parent.map(|(parent, _)| parent)
    }

    pub fn origin(&self) -> Origin {
        self.model.origin(self.id)
    }

    pub fn children(&self, slot: &str) -> Result<&'a [EntityId]> {
        let slot = self.model.child_slot(self.entity.kind, slot)?;
        Ok(self.entity.children_in(slot.index))
    }

    /// Children of one slot as nodes.
    pub fn child_nodes(&self, slot: &str) -> Result<Vec<Node<'a>>> {
        self.children(slot)?
            .iter()
            .map(|id| self.model.node(*id))
            .collect()
    }

    pub fn all_children(&self) -> Vec<EntityId> {
        self.entity.all_children().collect()
    }

    pub fn children_of_kind(&self, constraint: KindConstraint) -> Result<Vec<EntityId>> {
        self.model.children_of_kind(self.id, constraint)
    }

    pub fn field(&self, slot: &str) -> Result<Option<&'a FieldValue>> {
        self.model.field(self.id, slot)
    }

    pub fn reference_path(&self, slot: &str) -> Result<Option<&'a str>> {
        self.model.reference_path(self.id, slot)
    }

    /// Resolved target of a single-valued reference slot.
    pub fn reference(&self, slot: &str) -> Result<Option<Node<'a>>> {
        match self.model.get_reference(self.id, slot)? {
            Some(target) => self.model.node(target).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.entity.kind)
            .field("path", &self.entity.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosar::AUTOSAR;
    use crate::catalog::KindClass;
    use crate::error::ErrorKind;

    fn model_with_package(name: &str) -> (Model, EntityId) {
        let mut model = Model::new(&AUTOSAR);
        let root = model.root();
        let pkg = model
            .create_child(root, "ar_packages", EntityKind::ArPackage, name)
            .unwrap();
        (model, pkg)
    }

    #[test]
    fn test_create_child_registers_path() {
        let (mut model, pkg) = model_with_package("Swcs");
        let swc = model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "asw1")
            .unwrap();
        let port = model
            .create_child(swc, "ports", EntityKind::PPortPrototype, "outPort")
            .unwrap();

        assert_eq!(model.get_node("/Swcs"), Some(pkg));
        assert_eq!(model.get_node("/Swcs/asw1/outPort"), Some(port));
        let node = model.node(port).unwrap();
        assert_eq!(node.path(), Some("/Swcs/asw1/outPort"));
        assert_eq!(node.parent(), Some(swc));
        assert_eq!(model.children(swc, "ports").unwrap(), &[port]);
    }

    #[test]
    fn test_missing_name_fails_before_attach() {
        let (mut model, pkg) = model_with_package("Swcs");
        let swc = model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "asw1")
            .unwrap();
        let before = model.len();

        let err = model
            .create_child(swc, "ports", EntityKind::PPortPrototype, "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoShortName);
        assert_eq!(model.len(), before);
        assert!(model.children(swc, "ports").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_sibling_name_rejected() {
        let (mut model, pkg) = model_with_package("Swcs");
        let swc = model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "asw1")
            .unwrap();
        model
            .create_child(swc, "ports", EntityKind::PPortPrototype, "p1")
            .unwrap();

        let err = model
            .create_child(swc, "ports", EntityKind::RPortPrototype, "p1")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateChild);
        assert_eq!(model.children(swc, "ports").unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_child_kind_rejected() {
        let (mut model, pkg) = model_with_package("Swcs");
        let swc = model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "asw1")
            .unwrap();

        let err = model
            .create_child(swc, "ports", EntityKind::SenderReceiverInterface, "srIf")
            .unwrap_err();
        match err {
            ModelError::InvalidChild { child, expected, .. } => {
                assert_eq!(child, EntityKind::SenderReceiverInterface);
                assert_eq!(expected, KindConstraint::Class(KindClass::PortPrototype));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_referrable_children_have_no_path() {
        let (mut model, pkg) = model_with_package("DataTypes");
        let ty = model
            .create_child(pkg, "elements", EntityKind::ImplementationDataType, "uint8")
            .unwrap();
        let props = model
            .create_child(ty, "sw_data_def_props", EntityKind::SwDataDefProps, "")
            .unwrap();
        let cond = model
            .create_child(props, "variants", EntityKind::SwDataDefPropsConditional, "")
            .unwrap();

        assert_eq!(model.node(cond).unwrap().path(), None);
        assert!(model.is_attached(cond));
        let err = model
            .create_child(props, "variants", EntityKind::SwDataDefPropsConditional, "named")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_single_valued_slot_is_replaced() {
        let (mut model, pkg) = model_with_package("Interfaces");
        let srif = model
            .create_child(pkg, "elements", EntityKind::SenderReceiverInterface, "srif1")
            .unwrap();
        let vdp = model
            .create_child(srif, "data_elements", EntityKind::VariableDataPrototype, "de1")
            .unwrap();
        let first = model
            .create_child(vdp, "init_value", EntityKind::NumericalValueSpecification, "")
            .unwrap();
        let second = model
            .create_child(vdp, "init_value", EntityKind::TextValueSpecification, "")
            .unwrap();

        assert_eq!(model.children(vdp, "init_value").unwrap(), &[second]);
        assert!(model.node(first).is_err());
    }

    #[test]
    fn test_rename_rewrites_subtree_paths() {
        let (mut model, pkg) = model_with_package("Swcs");
        let swc = model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "asw1")
            .unwrap();
        let port = model
            .create_child(swc, "ports", EntityKind::PPortPrototype, "outPort")
            .unwrap();

        model.rename(swc, "renamed").unwrap();
        assert_eq!(model.get_node("/Swcs/renamed/outPort"), Some(port));
        assert_eq!(model.get_node("/Swcs/asw1/outPort"), None);
        assert_eq!(model.get_node("/Swcs/asw1"), None);
    }

    #[test]
    fn test_rename_collision_leaves_paths_untouched() {
        let (mut model, pkg) = model_with_package("Swcs");
        let a = model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "a")
            .unwrap();
        model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "b")
            .unwrap();
        let port = model
            .create_child(a, "ports", EntityKind::PPortPrototype, "p")
            .unwrap();

        let err = model.rename(a, "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateChild);
        assert_eq!(model.get_node("/Swcs/a/p"), Some(port));
        assert_eq!(model.node(a).unwrap().name(), Some("a"));
    }

    #[test]
    fn test_move_between_packages() {
        let (mut model, from) = model_with_package("From");
        let root = model.root();
        let to = model
            .create_child(root, "ar_packages", EntityKind::ArPackage, "To")
            .unwrap();
        let ty = model
            .create_child(from, "elements", EntityKind::SwBaseType, "uint8")
            .unwrap();

        model.move_to(ty, to, "elements").unwrap();
        assert_eq!(model.get_node("/To/uint8"), Some(ty));
        assert_eq!(model.get_node("/From/uint8"), None);
        assert!(model.children(from, "elements").unwrap().is_empty());

        model.move_to(from, to, "ar_packages").unwrap();
        let err = model.move_to(to, from, "ar_packages").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CycleDetected);
        assert_eq!(model.get_node("/To/From"), Some(from));
    }

    #[test]
    fn test_remove_drops_subtree_and_paths() {
        let (mut model, pkg) = model_with_package("Swcs");
        let swc = model
            .create_child(pkg, "elements", EntityKind::ApplicationSwComponentType, "asw1")
            .unwrap();
        let port = model
            .create_child(swc, "ports", EntityKind::PPortPrototype, "outPort")
            .unwrap();

        model.remove(swc).unwrap();
        assert!(model.node(port).is_err());
        assert_eq!(model.get_node("/Swcs/asw1/outPort"), None);
        assert!(model.children(pkg, "elements").unwrap().is_empty());
        assert_eq!(model.remove(model.root()).unwrap_err().kind(), ErrorKind::RootEntity);
    }

    #[test]
    fn test_attach_detached_subtree() {
        let (mut model, pkg) = model_with_package("Interfaces");
        let srif = model
            .create_detached(EntityKind::SenderReceiverInterface, "srif2")
            .unwrap();
        let de = model
            .create_child(srif, "data_elements", EntityKind::VariableDataPrototype, "de1")
            .unwrap();
        assert_eq!(model.node(de).unwrap().path(), None);
        assert!(!model.is_attached(srif));

        model.attach(pkg, "elements", srif).unwrap();
        assert_eq!(model.get_node("/Interfaces/srif2/de1"), Some(de));
        assert_eq!(
            model.attach(pkg, "elements", srif).unwrap_err().kind(),
            ErrorKind::AlreadyAttached
        );
    }

    #[test]
    fn test_set_field_coerces_and_validates() {
        let (mut model, pkg) = model_with_package("Can");
        let sig = model
            .create_child(pkg, "elements", EntityKind::ISignal, "sig1")
            .unwrap();

        model.set_field(sig, "length", 4).unwrap();
        model.set_field(sig, "i_signal_type", "PRIMITIVE").unwrap();
        assert_eq!(model.field(sig, "length").unwrap(), Some(&FieldValue::Integer(4)));

        let err = model.set_field(sig, "i_signal_type", "SCALAR").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        let err = model.set_field(sig, "lenght", 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownSlot);
        let err = model.set_field(sig, "system_signal", 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SlotMismatch);

        model.clear_field(sig, "length").unwrap();
        assert_eq!(model.field(sig, "length").unwrap(), None);
    }

    #[test]
    fn test_new_top_level_packages_are_unsaved() {
        let (model, pkg) = model_with_package("Fresh");
        assert_eq!(model.origin_of(pkg).unwrap(), Origin::Unsaved);
        assert!(model.dirty_documents().is_empty());
    }

    #[test]
    fn test_children_of_kind_filters_mixed_slot() {
        let (mut model, pkg) = model_with_package("DataTypes");
        let base = model
            .create_child(pkg, "elements", EntityKind::SwBaseType, "uint8")
            .unwrap();
        let imp = model
            .create_child(pkg, "elements", EntityKind::ImplementationDataType, "u8")
            .unwrap();
        let app = model
            .create_child(pkg, "elements", EntityKind::ApplicationPrimitiveDataType, "speed")
            .unwrap();
        let nested = model
            .create_child(pkg, "ar_packages", EntityKind::ArPackage, "Nested")
            .unwrap();

        let exact = KindConstraint::Exactly(EntityKind::SwBaseType);
        assert_eq!(model.children_of_kind(pkg, exact).unwrap(), vec![base]);

        let data_types = KindConstraint::Class(KindClass::AutosarDataType);
        assert_eq!(model.children_of_kind(pkg, data_types).unwrap(), vec![imp, app]);

        let packages = KindConstraint::Exactly(EntityKind::ArPackage);
        let node = model.node(pkg).unwrap();
        assert_eq!(node.children_of_kind(packages).unwrap(), vec![nested]);
        assert!(model.children_of_kind(base, exact).unwrap().is_empty());
    }
}
