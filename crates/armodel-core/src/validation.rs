//! Checks run before any mutation touches the graph or the index.

use crate::catalog::{EntityKind, KindConstraint, Slot, SlotShape, ValueType};
use crate::error::{ModelError, Result};
use crate::graph::EntityId;
use crate::model::Model;
use std::collections::HashSet;

/// Planned path for every entity of a subtree; `None` for entities that
/// will not be addressable.
pub(crate) type PathPlan = Vec<(EntityId, Option<String>)>;

/// A resolved child slot: index, accepted kinds, multiplicity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChildSlot {
    pub index: usize,
    pub accepts: KindConstraint,
    pub many: bool,
}

/// A resolved reference slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReferenceSlot {
    pub index: usize,
    pub name: &'static str,
    pub target: KindConstraint,
    pub many: bool,
}

impl Model {
    pub(crate) fn child_slot(&self, kind: EntityKind, slot: &str) -> Result<ChildSlot> {
        let (index, decl) = self.slot_decl(kind, slot)?;
        match decl.shape {
            SlotShape::Child { accepts, .. } => Ok(ChildSlot {
                index,
                accepts,
                many: decl.is_many(),
            }),
            _ => Err(ModelError::SlotMismatch {
                kind,
                slot: slot.to_string(),
                expected: "child",
            }),
        }
    }

    pub(crate) fn field_slot(&self, kind: EntityKind, slot: &str) -> Result<(usize, ValueType)> {
        let (index, decl) = self.slot_decl(kind, slot)?;
        match decl.shape {
            SlotShape::Field { value, .. } => Ok((index, value)),
            _ => Err(ModelError::SlotMismatch {
                kind,
                slot: slot.to_string(),
                expected: "field",
            }),
        }
    }

    pub(crate) fn reference_slot(&self, kind: EntityKind, slot: &str) -> Result<ReferenceSlot> {
        let (index, decl) = self.slot_decl(kind, slot)?;
        match decl.shape {
            SlotShape::Reference { target, .. } => Ok(ReferenceSlot {
                index,
                name: decl.name,
                target,
                many: decl.is_many(),
            }),
            _ => Err(ModelError::SlotMismatch {
                kind,
                slot: slot.to_string(),
                expected: "reference",
            }),
        }
    }

    fn slot_decl(&self, kind: EntityKind, slot: &str) -> Result<(usize, &'static Slot)> {
        self.catalog
            .slot(kind, slot)
            .ok_or_else(|| ModelError::UnknownSlot {
                kind,
                slot: slot.to_string(),
            })
    }

    /// Referrable kinds need a name; the others must not have one.
    pub(crate) fn check_name(&self, kind: EntityKind, name: &str) -> Result<Option<String>> {
        let referrable = self.catalog.is_referrable(kind);
        match (referrable, name.is_empty()) {
            (true, true) => Err(ModelError::NoShortName { kind }),
            (true, false) => Ok(Some(name.to_string())),
            (false, true) => Ok(None),
            (false, false) => Err(ModelError::InvalidValue {
                slot: "name".to_string(),
                message: format!("{kind} is not referrable and takes no name"),
            }),
        }
    }

    pub(crate) fn check_accepts(
        &self,
        parent: EntityId,
        accepts: KindConstraint,
        kind: EntityKind,
    ) -> Result<()> {
        if self.catalog.satisfies(kind, accepts) {
            Ok(())
        } else {
            Err(ModelError::InvalidChild {
                child: kind,
                expected: accepts,
                parent: self.describe(parent),
            })
        }
    }

    /// Sibling names are unique across all child slots of a container.
    pub(crate) fn check_sibling_name(
        &self,
        parent: EntityId,
        name: Option<&str>,
        except: &[EntityId],
    ) -> Result<()> {
        let Some(name) = name else {
            return Ok(());
        };
        let parent_entity = self.entity(parent)?;
        let taken = parent_entity
            .all_children()
            .filter(|sibling| !except.contains(sibling))
            .filter_map(|sibling| self.graph.get(sibling))
            .any(|sibling| sibling.name.as_deref() == Some(name));
        if taken {
            return Err(ModelError::DuplicateChild {
                name: name.to_string(),
                parent: self.describe(parent),
            });
        }
        Ok(())
    }

    /// Every planned path must be free, or held by an entity in `exempt`
    /// (the subtree being moved or replaced).
    pub(crate) fn check_paths_free(
        &self,
        plan: &[(EntityId, Option<String>)],
        exempt: &HashSet<EntityId>,
    ) -> Result<()> {
        let mut planned = HashSet::new();
        for path in plan.iter().filter_map(|(_, path)| path.as_deref()) {
            let occupied = self
                .index
                .lookup(path)
                .is_some_and(|holder| !exempt.contains(&holder));
            if occupied || !planned.insert(path) {
                return Err(ModelError::DuplicatePath {
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn check_not_cycle(&self, entity: EntityId, new_parent: EntityId) -> Result<()> {
        if entity == new_parent || self.graph.ancestors(new_parent).contains(&entity) {
            return Err(ModelError::CycleDetected {
                entity: self.describe(entity),
            });
        }
        Ok(())
    }
}
