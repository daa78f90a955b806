//! Reference slots: durable path strings resolved lazily through the index.
//!
//! A cached handle is trusted only while the entity it names is alive and
//! still sits at the stored path; anything else falls back to an index
//! lookup. A path that does not resolve is reported as `None`.

use crate::catalog::{EntityKind, KindConstraint};
use crate::error::{ModelError, Result};
use crate::graph::{EntityId, Reference, SlotContent};
use crate::model::Model;
use crate::validation::ReferenceSlot;
use tracing::debug;

impl Model {
    /// Point a reference slot at `target`, replacing what it held.
    pub fn set_reference(&mut self, id: EntityId, slot: &str, target: EntityId) -> Result<()> {
        let (slot, reference) = self.checked_reference(id, slot, target)?;
        self.write_references(id, slot.index, vec![reference])
    }

    /// Append `target` to a multi-valued reference slot.
    pub fn add_reference(&mut self, id: EntityId, slot: &str, target: EntityId) -> Result<()> {
        let (slot, reference) = self.checked_reference(id, slot, target)?;
        if !slot.many {
            return Err(ModelError::SlotMismatch {
                kind: self.entity(id)?.kind,
                slot: slot.name.to_string(),
                expected: "multi-valued reference",
            });
        }
        let mut references = self.references(id, slot.index);
        references.push(reference);
        self.write_references(id, slot.index, references)
    }

    /// Store a path without checking it, for targets that do not exist yet.
    pub fn set_reference_path(
        &mut self,
        id: EntityId,
        slot: &str,
        path: &str,
        dest: Option<EntityKind>,
    ) -> Result<()> {
        let kind = self.entity(id)?.kind;
        let slot = self.reference_slot(kind, slot)?;
        let dest = dest.map(|kind| self.catalog.tag(kind).to_string());
        self.write_references(id, slot.index, vec![Reference::new(path, dest)])
    }

    pub fn clear_reference(&mut self, id: EntityId, slot: &str) -> Result<()> {
        let kind = self.entity(id)?.kind;
        let slot = self.reference_slot(kind, slot)?;
        self.write_references(id, slot.index, Vec::new())
    }

    /// Target of the (first) reference in `slot`, or `None` when the slot is
    /// empty or its path does not resolve to an entity of the expected kind.
    pub fn get_reference(&self, id: EntityId, slot: &str) -> Result<Option<EntityId>> {
        let entity = self.entity(id)?;
        let slot = self.reference_slot(entity.kind, slot)?;
        Ok(match &entity.slots[slot.index] {
            SlotContent::References(refs) => {
                refs.first().and_then(|r| self.resolve(r, slot.target))
            }
            _ => None,
        })
    }

    /// Every reference in `slot`, in document order.
    pub fn get_references(&self, id: EntityId, slot: &str) -> Result<Vec<Option<EntityId>>> {
        let entity = self.entity(id)?;
        let slot = self.reference_slot(entity.kind, slot)?;
        Ok(match &entity.slots[slot.index] {
            SlotContent::References(refs) => {
                refs.iter().map(|r| self.resolve(r, slot.target)).collect()
            }
            _ => Vec::new(),
        })
    }

    pub fn reference_path(&self, id: EntityId, slot: &str) -> Result<Option<&str>> {
        let entity = self.entity(id)?;
        let slot = self.reference_slot(entity.kind, slot)?;
        Ok(match &entity.slots[slot.index] {
            SlotContent::References(refs) => refs.first().map(Reference::path),
            _ => None,
        })
    }

    pub fn reference_paths(&self, id: EntityId, slot: &str) -> Result<Vec<&str>> {
        let entity = self.entity(id)?;
        let slot = self.reference_slot(entity.kind, slot)?;
        Ok(match &entity.slots[slot.index] {
            SlotContent::References(refs) => refs.iter().map(Reference::path).collect(),
            _ => Vec::new(),
        })
    }

    fn resolve(&self, reference: &Reference, expected: KindConstraint) -> Option<EntityId> {
        if let Some(cached) = reference.resolved.get()
            && self
                .graph
                .get(cached)
                .is_some_and(|target| target.path.as_deref() == Some(reference.path.as_str()))
        {
            return Some(cached);
        }

        let Some(found) = self.index.lookup(&reference.path) else {
            debug!(path = %reference.path, "dangling reference");
            reference.resolved.set(None);
            return None;
        };
        let kind = self.graph.get(found)?.kind;
        if !self.catalog.satisfies(kind, expected) {
            debug!(
                path = %reference.path,
                %kind,
                %expected,
                "reference resolves to an unexpected kind"
            );
            reference.resolved.set(None);
            return None;
        }
        reference.resolved.set(Some(found));
        Some(found)
    }

    /// Validate `target` for `slot` and build the stored reference.
    fn checked_reference(
        &self,
        id: EntityId,
        slot: &str,
        target: EntityId,
    ) -> Result<(ReferenceSlot, Reference)> {
        let kind = self.entity(id)?.kind;
        let slot = self.reference_slot(kind, slot)?;
        let target_entity = self.entity(target)?;
        if !self.catalog.satisfies(target_entity.kind, slot.target) {
            return Err(ModelError::InvalidReference {
                target: target_entity.kind,
                expected: slot.target,
                slot: slot.name.to_string(),
            });
        }
        let Some(path) = target_entity.path.clone() else {
            return Err(ModelError::NotAttached {
                entity: self.describe(target),
            });
        };
        let dest = Some(self.catalog.tag(target_entity.kind).to_string());
        Ok((slot, Reference::resolved_to(path, dest, target)))
    }

    fn references(&self, id: EntityId, slot: usize) -> Vec<Reference> {
        match self.graph.get(id).and_then(|e| e.slots.get(slot)) {
            Some(SlotContent::References(refs)) => refs.clone(),
            _ => Vec::new(),
        }
    }

    fn write_references(
        &mut self,
        id: EntityId,
        slot: usize,
        references: Vec<Reference>,
    ) -> Result<()> {
        let entity = self.entity_mut(id)?;
        if let Some(SlotContent::References(current)) = entity.slots.get(slot)
            && current.len() == references.len()
            && current
                .iter()
                .zip(&references)
                .all(|(a, b)| a.path == b.path && a.dest == b.dest)
        {
            return Ok(());
        }
        entity.slots[slot] = SlotContent::References(references);
        self.mark_dirty_origin(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::autosar::AUTOSAR;
    use crate::catalog::EntityKind;
    use crate::error::ErrorKind;
    use crate::graph::EntityId;
    use crate::model::Model;

    struct Fixture {
        model: Model,
        event: EntityId,
        runnable: EntityId,
        srif: EntityId,
    }

    fn fixture() -> Fixture {
        let mut model = Model::new(&AUTOSAR);
        let root = model.root();
        let swcs = model
            .create_child(root, "ar_packages", EntityKind::ArPackage, "Swcs")
            .unwrap();
        let ifs = model
            .create_child(root, "ar_packages", EntityKind::ArPackage, "Interfaces")
            .unwrap();
        let srif = model
            .create_child(ifs, "elements", EntityKind::SenderReceiverInterface, "srif1")
            .unwrap();
        let swc = model
            .create_child(swcs, "elements", EntityKind::ApplicationSwComponentType, "asw1")
            .unwrap();
        let beh = model
            .create_child(swc, "internal_behaviors", EntityKind::SwcInternalBehavior, "beh1")
            .unwrap();
        let event = model
            .create_child(beh, "events", EntityKind::TimingEvent, "te_5ms")
            .unwrap();
        let runnable = model
            .create_child(beh, "runnables", EntityKind::RunnableEntity, "Runnable_1")
            .unwrap();
        Fixture {
            model,
            event,
            runnable,
            srif,
        }
    }

    #[test]
    fn test_set_and_get_reference() {
        let Fixture {
            mut model,
            event,
            runnable,
            ..
        } = fixture();
        model
            .set_reference(event, "start_on_event", runnable)
            .unwrap();

        assert_eq!(model.get_reference(event, "start_on_event").unwrap(), Some(runnable));
        assert_eq!(
            model.reference_path(event, "start_on_event").unwrap(),
            Some("/Swcs/asw1/beh1/Runnable_1")
        );
        assert_eq!(
            model.get_reference(event, "start_on_event").unwrap(),
            model.get_reference(event, "start_on_event").unwrap()
        );
    }

    #[test]
    fn test_wrong_target_kind_is_rejected() {
        let Fixture {
            mut model, event, srif, ..
        } = fixture();
        let err = model
            .set_reference(event, "start_on_event", srif)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert_eq!(model.reference_path(event, "start_on_event").unwrap(), None);
    }

    #[test]
    fn test_removed_target_reads_as_none() {
        let Fixture {
            mut model,
            event,
            runnable,
            ..
        } = fixture();
        model
            .set_reference(event, "start_on_event", runnable)
            .unwrap();
        model.remove(runnable).unwrap();

        assert_eq!(model.get_reference(event, "start_on_event").unwrap(), None);
        assert_eq!(
            model.reference_path(event, "start_on_event").unwrap(),
            Some("/Swcs/asw1/beh1/Runnable_1")
        );
    }

    #[test]
    fn test_forward_reference_resolves_once_target_exists() {
        let Fixture { mut model, event, .. } = fixture();
        model
            .set_reference_path(
                event,
                "start_on_event",
                "/Swcs/asw1/beh1/Later",
                Some(EntityKind::RunnableEntity),
            )
            .unwrap();
        assert_eq!(model.get_reference(event, "start_on_event").unwrap(), None);

        let beh = model.get_node("/Swcs/asw1/beh1").unwrap();
        let later = model
            .create_child(beh, "runnables", EntityKind::RunnableEntity, "Later")
            .unwrap();
        assert_eq!(model.get_reference(event, "start_on_event").unwrap(), Some(later));
    }

    #[test]
    fn test_rename_of_target_leaves_stored_path() {
        let Fixture {
            mut model,
            event,
            runnable,
            ..
        } = fixture();
        model
            .set_reference(event, "start_on_event", runnable)
            .unwrap();
        model.rename(runnable, "Runnable_9").unwrap();

        assert_eq!(model.get_reference(event, "start_on_event").unwrap(), None);
    }

    #[test]
    fn test_detached_target_has_no_path() {
        let Fixture { mut model, event, .. } = fixture();
        let loose = model
            .create_detached(EntityKind::RunnableEntity, "loose")
            .unwrap();
        let err = model
            .set_reference(event, "start_on_event", loose)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAttached);
    }

    #[test]
    fn test_multi_valued_references() {
        let mut model = Model::new(&AUTOSAR);
        let root = model.root();
        let pkg = model
            .create_child(root, "ar_packages", EntityKind::ArPackage, "Sys")
            .unwrap();
        let comp = model
            .create_child(pkg, "elements", EntityKind::CompositionSwComponentType, "Comp")
            .unwrap();
        let a = model
            .create_child(comp, "components", EntityKind::SwComponentPrototype, "a")
            .unwrap();
        let b = model
            .create_child(comp, "components", EntityKind::SwComponentPrototype, "b")
            .unwrap();
        let system = model
            .create_child(pkg, "elements", EntityKind::System, "Sys")
            .unwrap();
        let mapping = model
            .create_child(system, "mappings", EntityKind::SystemMapping, "Mappings")
            .unwrap();
        let swc_map = model
            .create_child(mapping, "sw_mappings", EntityKind::SwcToEcuMapping, "SwcMapping")
            .unwrap();
        let iref = model
            .create_child(swc_map, "components", EntityKind::ComponentInSystemInstanceRef, "")
            .unwrap();

        model.add_reference(iref, "context_components", a).unwrap();
        model.add_reference(iref, "context_components", b).unwrap();
        assert_eq!(
            model.get_references(iref, "context_components").unwrap(),
            vec![Some(a), Some(b)]
        );
        assert_eq!(
            model.reference_paths(iref, "context_components").unwrap(),
            vec!["/Sys/Comp/a", "/Sys/Comp/b"]
        );

        let err = model
            .add_reference(iref, "target_component", a)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SlotMismatch);
    }
}
