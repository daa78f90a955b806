//! Generic ordered document tree exchanged with the document I/O layer.

use crate::error::Result;
use std::path::Path;

/// One element: tag, attributes in document order, leaf text, children.
///
/// Mixed content is not modelled; an element has either text or children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, tag: &str) -> Option<&DocNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Leaf text, or "" for elements without text.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.as_deref().is_none_or(str::is_empty)
    }
}

/// The `<?xml ...?>` prologue, kept so rewritten documents keep theirs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTree {
    pub declaration: Option<Declaration>,
    pub root: DocNode,
}

impl DocTree {
    pub fn new(root: DocNode) -> Self {
        Self {
            declaration: Some(Declaration::default()),
            root,
        }
    }
}

/// Turns files into [`DocTree`]s and back.
///
/// Implementations own the byte-level format. Malformed input must be
/// reported as [`crate::ModelError::Parse`], file system failures as
/// [`crate::ModelError::Io`].
pub trait DocumentIo {
    fn read(&self, path: &Path) -> Result<DocTree>;

    fn write(&self, path: &Path, tree: &DocTree) -> Result<()>;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
