//! Building document trees back from the model.
//!
//! For one document, an entity is written in full when the document owns
//! it, as a skeleton (name, child slots, its own verbatim content) when the
//! document only contributes to it, and not at all otherwise.

use crate::catalog::{DEST_ATTRIBUTE, SHORT_NAME_TAG, SlotShape};
use crate::config::WriterConfig;
use crate::document::{Declaration, DocNode, DocTree};
use crate::error::Result;
use crate::graph::{Entity, EntityId, SlotContent};
use crate::model::Model;
use crate::provenance::{DocumentId, Layout, Origin, Shell};

/// Layout entry borrowed from a shell or synthesized from the catalog.
#[derive(Clone, Copy)]
enum Item<'s> {
    Name,
    Slot(usize),
    Opaque(&'s DocNode),
}

/// Tree for one source document.
pub(crate) fn document_tree(
    model: &Model,
    document: DocumentId,
    config: &WriterConfig,
) -> Result<DocTree> {
    let declaration = model
        .provenance
        .document(document)
        .and_then(|record| record.declaration.clone());
    let writer = Writer {
        model,
        document: Some(document),
        config,
    };
    Ok(DocTree {
        declaration,
        root: writer.root()?,
    })
}

/// Tree of the whole merged model, ignoring provenance.
pub(crate) fn merged_tree(model: &Model, config: &WriterConfig) -> Result<DocTree> {
    let writer = Writer {
        model,
        document: None,
        config,
    };
    Ok(DocTree {
        declaration: config.xml_declaration.then(Declaration::default),
        root: writer.root()?,
    })
}

struct Writer<'m> {
    model: &'m Model,
    document: Option<DocumentId>,
    config: &'m WriterConfig,
}

impl Writer<'_> {
    fn root(&self) -> Result<DocNode> {
        let root = self.model.root;
        let tag = self.model.catalog.tag(self.model.entity(root)?.kind);
        let mut node = self.element(root, tag)?;
        if self.shell(self.model.entity(root)?, false).is_none() {
            node.attributes = self.config.root_attributes();
        }
        Ok(node)
    }

    /// Whether the document owns `id` outright.
    fn owns(&self, id: EntityId) -> bool {
        match self.document {
            None => true,
            Some(doc) => self.model.origin(id) == Origin::Document(doc),
        }
    }

    /// Whether any part of `id`'s subtree belongs in the document.
    fn appears(&self, id: EntityId) -> bool {
        let Some(doc) = self.document else {
            return true;
        };
        let Some(entity) = self.model.graph.get(id) else {
            return false;
        };
        self.model.origin(id) == Origin::Document(doc)
            || entity.shells.contains_key(&doc)
            || entity.all_children().any(|child| self.appears(child))
    }

    fn shell<'e>(&self, entity: &'e Entity, full: bool) -> Option<&'e Shell> {
        match self.document {
            Some(doc) => entity
                .shells
                .get(&doc)
                .or_else(|| full.then(|| entity.shells.values().next()).flatten()),
            None => entity.shells.values().next(),
        }
    }

    fn element(&self, id: EntityId, tag: &str) -> Result<DocNode> {
        let catalog = self.model.catalog;
        let entity = self.model.entity(id)?;
        let full = self.owns(id);
        let shell = self.shell(entity, full);
        let slots = catalog.slots(entity.kind);

        let mut node = DocNode::new(tag);
        if let Some(shell) = shell {
            node.attributes.clone_from(&shell.attributes);
        }

        for item in self.layout(entity, shell) {
            match item {
                Item::Name => {
                    if let Some(name) = &entity.name {
                        node.children.push(DocNode::new(SHORT_NAME_TAG).with_text(name.as_str()));
                    }
                }
                Item::Opaque(opaque) => node.children.push(opaque.clone()),
                Item::Slot(index) => match (slots[index].shape, &entity.slots[index]) {
                    (SlotShape::Field { tag, .. }, SlotContent::Field(Some(value))) if full => {
                        node.children.push(DocNode::new(tag).with_text(value.to_string()));
                    }
                    (SlotShape::Reference { tag, .. }, SlotContent::References(refs)) if full => {
                        for reference in refs {
                            let mut element = DocNode::new(tag).with_text(reference.path());
                            if let Some(dest) = reference.dest() {
                                element = element.with_attribute(DEST_ATTRIBUTE, dest);
                            }
                            node.children.push(element);
                        }
                    }
                    (
                        SlotShape::Child {
                            wrapper, tag: role, ..
                        },
                        SlotContent::Children(ids),
                    ) => {
                        let mut children = Vec::new();
                        for child in ids.iter().copied().filter(|child| self.appears(*child)) {
                            let child_tag = match role {
                                Some(role) => role,
                                None => catalog.tag(self.model.entity(child)?.kind),
                            };
                            children.push(self.element(child, child_tag)?);
                        }
                        match wrapper {
                            Some(wrapper) => {
                                let extras =
                                    shell.map(|s| s.wrapped.as_slice()).unwrap_or_default();
                                for extra in extras.iter().rev().filter(|w| w.slot == index) {
                                    let at = extra.position.min(children.len());
                                    children.insert(at, extra.node.clone());
                                }
                                if !children.is_empty() {
                                    let mut group = DocNode::new(wrapper);
                                    group.children = children;
                                    node.children.push(group);
                                }
                            }
                            None => node.children.extend(children),
                        }
                    }
                    _ => {}
                },
            }
        }
        Ok(node)
    }

    /// The shell's element order, with slots it never saw slotted in by
    /// catalog order.
    fn layout<'s>(&self, entity: &Entity, shell: Option<&'s Shell>) -> Vec<Item<'s>> {
        let referrable = self.model.catalog.is_referrable(entity.kind);
        let mut layout: Vec<Item<'s>> = shell
            .map(|s| {
                s.layout
                    .iter()
                    .map(|entry| match entry {
                        Layout::Name => Item::Name,
                        Layout::Slot(index) => Item::Slot(*index),
                        Layout::Opaque(node) => Item::Opaque(node),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if referrable && !layout.iter().any(|item| matches!(item, Item::Name)) {
            layout.insert(0, Item::Name);
        }
        for (index, content) in entity.slots.iter().enumerate() {
            let listed = layout
                .iter()
                .any(|item| matches!(item, Item::Slot(i) if *i == index));
            if listed || content.is_empty() {
                continue;
            }
            let at = layout
                .iter()
                .rposition(|item| matches!(item, Item::Slot(i) if *i < index))
                .or_else(|| layout.iter().position(|item| matches!(item, Item::Name)))
                .map_or(0, |p| p + 1);
            layout.insert(at, Item::Slot(index));
        }
        layout
    }
}
