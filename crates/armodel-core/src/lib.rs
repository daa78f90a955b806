//! In-memory model graph for AUTOSAR (ARXML) documents.
//!
//! Several documents merge into one [`Model`]: a graph of typed entities
//! addressed by `/`-separated short-name paths. References are stored as
//! paths and resolved on demand through the [`index::PathIndex`]. Every
//! mutation is validated against a [`SchemaCatalog`] before it touches the
//! graph, and [`Session::save`] rewrites only the documents whose content
//! changed.

pub mod autosar;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod index;
pub mod memory;
pub(crate) mod merge;
pub mod model;
pub mod provenance;
mod resolver;
pub(crate) mod serializer;
pub mod session;
mod validation;

pub use autosar::{AUTOSAR, AutosarCatalog};
pub use catalog::{EntityKind, FieldValue, KindClass, KindConstraint, SchemaCatalog, ValueType};
pub use config::{ModelConfig, ReaderConfig, WriterConfig};
pub use document::{Declaration, DocNode, DocTree, DocumentIo};
pub use error::{ErrorKind, ModelError, Result};
pub use graph::EntityId;
pub use memory::MemoryIo;
pub use model::{Model, Node};
pub use provenance::{DocumentId, Origin};
pub use session::Session;
