//! Entity arena: the typed containment tree plus per-entity slot storage.

use crate::catalog::{EntityKind, FieldValue, Slot, SlotShape};
use crate::provenance::{DocumentId, Shell};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque handle into the arena.
///
/// Slots are never reused, so a handle to a removed entity stays dead and
/// can never alias a newer entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Durable path plus a memoized handle. The handle never owns its target.
#[derive(Debug, Clone)]
pub struct Reference {
    pub(crate) path: String,
    /// DEST attribute, the element name of the target kind.
    pub(crate) dest: Option<String>,
    pub(crate) resolved: Cell<Option<EntityId>>,
}

impl Reference {
    pub(crate) fn new(path: impl Into<String>, dest: Option<String>) -> Self {
        Self {
            path: path.into(),
            dest,
            resolved: Cell::new(None),
        }
    }

    pub(crate) fn resolved_to(
        path: impl Into<String>,
        dest: Option<String>,
        target: EntityId,
    ) -> Self {
        Self {
            path: path.into(),
            dest,
            resolved: Cell::new(Some(target)),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }
}

/// Storage for one slot, shaped after its [`SlotShape`].
#[derive(Debug, Clone)]
pub enum SlotContent {
    Field(Option<FieldValue>),
    References(Vec<Reference>),
    Children(Vec<EntityId>),
}

impl SlotContent {
    pub(crate) fn empty_for(slot: &Slot) -> Self {
        match slot.shape {
            SlotShape::Field { .. } => SlotContent::Field(None),
            SlotShape::Reference { .. } => SlotContent::References(Vec::new()),
            SlotShape::Child { .. } => SlotContent::Children(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SlotContent::Field(value) => value.is_none(),
            SlotContent::References(refs) => refs.is_empty(),
            SlotContent::Children(ids) => ids.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) kind: EntityKind,
    pub(crate) name: Option<String>,
    /// Set while the entity is referrable and attached below the root.
    pub(crate) path: Option<String>,
    /// Owning entity and the slot index holding this one.
    pub(crate) parent: Option<(EntityId, usize)>,
    pub(crate) slots: Vec<SlotContent>,
    /// Element layout of each document that contributed this entity.
    pub(crate) shells: BTreeMap<DocumentId, Shell>,
}

impl Entity {
    pub(crate) fn new(kind: EntityKind, name: Option<String>, slots: &[Slot]) -> Self {
        Self {
            kind,
            name,
            path: None,
            parent: None,
            slots: slots.iter().map(SlotContent::empty_for).collect(),
            shells: BTreeMap::new(),
        }
    }

    pub(crate) fn children_in(&self, slot: usize) -> &[EntityId] {
        match self.slots.get(slot) {
            Some(SlotContent::Children(ids)) => ids,
            _ => &[],
        }
    }

    pub(crate) fn all_children(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .flat_map(|content| match content {
                SlotContent::Children(ids) => ids.as_slice(),
                _ => &[],
            })
            .copied()
    }
}

/// Arena owning every entity of a model.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    entities: Vec<Option<Entity>>,
    live: usize,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entity: Entity) -> EntityId {
        let raw = u32::try_from(self.entities.len()).unwrap_or(u32::MAX);
        self.entities.push(Some(entity));
        self.live += 1;
        EntityId(raw)
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.get_mut(id.index()).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// `id` and all its descendants, parents before children.
    pub(crate) fn subtree(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(entity) = self.get(current) else {
                continue;
            };
            out.push(current);
            let children: Vec<EntityId> = entity.all_children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Parents of `id`, nearest first.
    pub(crate) fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(|e| e.parent);
        while let Some((parent, _)) = current {
            out.push(parent);
            current = self.get(parent).and_then(|e| e.parent);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: EntityKind, name: &str) -> Entity {
        Entity::new(kind, Some(name.to_string()), &[])
    }

    #[test]
    fn test_removed_handles_stay_dead() {
        let mut graph = EntityGraph::new();
        let a = graph.insert(leaf(EntityKind::SwBaseType, "a"));
        assert!(graph.remove(a).is_some());
        let b = graph.insert(leaf(EntityKind::SwBaseType, "b"));

        assert_ne!(a, b);
        assert!(graph.get(a).is_none());
        assert!(graph.remove(a).is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_subtree_and_ancestors() {
        let mut graph = EntityGraph::new();
        let mut root = Entity::new(EntityKind::Autosar, None, &[]);
        root.slots.push(SlotContent::Children(Vec::new()));
        let root = graph.insert(root);

        let mut pkg = leaf(EntityKind::ArPackage, "P");
        pkg.parent = Some((root, 0));
        pkg.slots.push(SlotContent::Children(Vec::new()));
        let pkg = graph.insert(pkg);

        let mut elem = leaf(EntityKind::SwBaseType, "E");
        elem.parent = Some((pkg, 0));
        let elem = graph.insert(elem);

        if let Some(SlotContent::Children(ids)) = graph.get_mut(root).map(|e| &mut e.slots[0]) {
            ids.push(pkg);
        }
        if let Some(SlotContent::Children(ids)) = graph.get_mut(pkg).map(|e| &mut e.slots[0]) {
            ids.push(elem);
        }

        assert_eq!(graph.subtree(root), vec![root, pkg, elem]);
        assert_eq!(graph.ancestors(elem), vec![pkg, root]);
        assert!(graph.ancestors(root).is_empty());
    }
}
