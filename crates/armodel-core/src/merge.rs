//! Folding a parsed document into the model.
//!
//! Elements are matched against the model by path. A path that already
//! exists is only acceptable when both sides are the same mergeable
//! container (packages); the incoming element then extends it. Any other
//! repeat of a path is a conflict.

use crate::catalog::{DEST_ATTRIBUTE, EntityKind, KindConstraint, SHORT_NAME_TAG, SlotShape};
use crate::document::{DocNode, DocTree};
use crate::error::{ModelError, Result};
use crate::graph::{Entity, EntityId, Reference, SlotContent};
use crate::model::Model;
use crate::provenance::{DocumentId, Layout, Origin, Shell, WrappedOpaque};
use std::path::Path;
use tracing::{debug, warn};

/// How much of an element a document contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// The document defines the entity: fields and references are read.
    Owned,
    /// The document extends a container defined elsewhere: only children
    /// are merged, everything else is kept verbatim in its shell.
    Partial,
}

pub(crate) struct Merger<'m> {
    model: &'m mut Model,
    document: DocumentId,
    source: &'m Path,
    strict: bool,
    created: usize,
}

impl<'m> Merger<'m> {
    pub(crate) fn new(
        model: &'m mut Model,
        document: DocumentId,
        source: &'m Path,
        strict: bool,
    ) -> Self {
        Self {
            model,
            document,
            source,
            strict,
            created: 0,
        }
    }

    /// Merge the whole tree; returns the number of entities created.
    pub(crate) fn merge(mut self, tree: &DocTree) -> Result<usize> {
        let catalog = self.model.catalog;
        let root_tag = catalog.tag(catalog.root_kind());
        if tree.root.tag != root_tag {
            return Err(self.parse_error(format!(
                "root element is <{}>, expected <{root_tag}>",
                tree.root.tag
            )));
        }
        let root = self.model.root;
        self.read_content(root, &tree.root, Mode::Partial)?;
        Ok(self.created)
    }

    fn read_content(&mut self, id: EntityId, node: &DocNode, mode: Mode) -> Result<()> {
        let catalog = self.model.catalog;
        let kind = self.model.entity(id)?.kind;
        let referrable = catalog.is_referrable(kind);
        let slots = catalog.slots(kind);
        let mut shell = Shell {
            attributes: node.attributes.clone(),
            ..Shell::default()
        };

        for element in &node.children {
            if referrable && element.tag == SHORT_NAME_TAG {
                shell.layout.push(Layout::Name);
                continue;
            }
            let Some(index) = slots
                .iter()
                .position(|slot| catalog.outer_tag(slot) == Some(element.tag.as_str()))
            else {
                self.unknown(element, kind)?;
                shell.layout.push(Layout::Opaque(element.clone()));
                continue;
            };

            match slots[index].shape {
                SlotShape::Field { .. } | SlotShape::Reference { .. } if mode == Mode::Partial => {
                    shell.layout.push(Layout::Opaque(element.clone()));
                    continue;
                }
                SlotShape::Field { value, .. } => {
                    let parsed = value.parse(element.text()).map_err(|message| {
                        self.parse_error(format!("<{}> in {kind}: {message}", element.tag))
                    })?;
                    self.model.entity_mut(id)?.slots[index] = SlotContent::Field(Some(parsed));
                }
                SlotShape::Reference { many, .. } => {
                    let reference = Reference::new(
                        element.text().trim(),
                        element.attribute(DEST_ATTRIBUTE).map(str::to_string),
                    );
                    let occupied = matches!(
                        &self.model.entity(id)?.slots[index],
                        SlotContent::References(refs) if !refs.is_empty()
                    );
                    if !many && occupied {
                        let message = format!("<{}> repeated in {kind}", element.tag);
                        return Err(self.parse_error(message));
                    }
                    if let SlotContent::References(refs) =
                        &mut self.model.entity_mut(id)?.slots[index]
                    {
                        refs.push(reference);
                    }
                }
                SlotShape::Child {
                    wrapper: Some(_),
                    accepts,
                    ..
                } => {
                    let mut merged = 0;
                    for child in &element.children {
                        match catalog
                            .kind_for_tag(&child.tag)
                            .filter(|candidate| catalog.satisfies(*candidate, accepts))
                        {
                            Some(child_kind) => {
                                self.merge_child(id, index, child_kind, child)?;
                                merged += 1;
                            }
                            None => {
                                self.unknown(child, kind)?;
                                shell.wrapped.push(WrappedOpaque {
                                    slot: index,
                                    position: merged,
                                    node: child.clone(),
                                });
                            }
                        }
                    }
                }
                SlotShape::Child {
                    wrapper: None, accepts, ..
                } => {
                    let child_kind = match accepts {
                        KindConstraint::Exactly(child_kind) => Some(child_kind),
                        KindConstraint::Class(_) => catalog.kind_for_tag(&element.tag),
                    };
                    match child_kind {
                        Some(child_kind) => self.merge_child(id, index, child_kind, element)?,
                        None => {
                            self.unknown(element, kind)?;
                            shell.layout.push(Layout::Opaque(element.clone()));
                            continue;
                        }
                    }
                }
            }
            if !shell.layout.contains(&Layout::Slot(index)) {
                shell.layout.push(Layout::Slot(index));
            }
        }

        self.model
            .entity_mut(id)?
            .shells
            .insert(self.document, shell);
        Ok(())
    }

    fn merge_child(
        &mut self,
        parent: EntityId,
        slot: usize,
        kind: EntityKind,
        element: &DocNode,
    ) -> Result<()> {
        let catalog = self.model.catalog;
        let name = if catalog.is_referrable(kind) {
            let name = element
                .child(SHORT_NAME_TAG)
                .map_or("", |n| n.text().trim());
            if name.is_empty() {
                let message = format!("<{}> has no <{SHORT_NAME_TAG}>", element.tag);
                return Err(self.parse_error(message));
            }
            Some(name.to_string())
        } else {
            None
        };
        let path = match (&name, self.model.base_path(parent)) {
            (Some(name), Some(base)) => Some(format!("{base}/{name}")),
            _ => None,
        };

        if let Some(path) = &path
            && let Some(existing) = self.model.index.lookup(path)
        {
            return self.merge_existing(existing, parent, slot, kind, path, element);
        }

        let parent_entity = self.model.entity(parent)?;
        let single = !catalog.slots(parent_entity.kind)[slot].is_many();
        if single && !parent_entity.children_in(slot).is_empty() {
            let message = format!("<{}> repeated in a single-valued slot", element.tag);
            return Err(self.parse_error(message));
        }

        let mut entity = Entity::new(kind, name, catalog.slots(kind));
        entity.parent = Some((parent, slot));
        entity.path.clone_from(&path);
        let id = self.model.graph.insert(entity);
        if let Some(path) = &path {
            self.model.index.register(path, id)?;
        }
        self.model.push_child(parent, slot, id);
        if self.model.origin(parent) != Origin::Document(self.document) {
            self.model.provenance.record(id, self.document);
        }
        self.created += 1;
        self.read_content(id, element, Mode::Owned)
    }

    fn merge_existing(
        &mut self,
        existing: EntityId,
        parent: EntityId,
        slot: usize,
        kind: EntityKind,
        path: &str,
        element: &DocNode,
    ) -> Result<()> {
        let entity = self.model.entity(existing)?;
        if entity.shells.contains_key(&self.document) {
            return Err(ModelError::DuplicatePath {
                path: path.to_string(),
            });
        }
        let same_container = self.model.catalog.is_mergeable(kind)
            && entity.kind == kind
            && entity.parent == Some((parent, slot));
        if !same_container {
            warn!(path, document = %self.source.display(), "merge conflict");
            return Err(ModelError::MergeConflict {
                path: path.to_string(),
                document: self.source.to_path_buf(),
            });
        }
        debug!(path, document = %self.source.display(), "extending container");
        self.read_content(existing, element, Mode::Partial)
    }

    fn unknown(&self, element: &DocNode, parent: EntityKind) -> Result<()> {
        if !self.strict {
            return Ok(());
        }
        let catalog = self.model.catalog;
        let message = match catalog.kind_for_tag(&element.tag) {
            Some(kind) if !catalog.allows_child(parent, kind) => {
                format!("<{}> is not allowed in {parent}", element.tag)
            }
            _ => format!("unknown element <{}> in {parent}", element.tag),
        };
        Err(self.parse_error(message))
    }

    fn parse_error(&self, message: String) -> ModelError {
        ModelError::Parse {
            document: self.source.to_path_buf(),
            message,
        }
    }
}
