//! XML text to [`DocTree`].
//!
//! Whitespace between elements is dropped and leaf text is trimmed.
//! Comments, processing instructions and the doctype are skipped.

use armodel_core::{Declaration, DocNode, DocTree};
use quick_xml::Reader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use std::borrow::Cow;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed attribute at byte {position}: {source}")]
    Attribute {
        position: u64,
        #[source]
        source: AttrError,
    },

    #[error("invalid UTF-8 in element or attribute name")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Structure(String),

    #[error("failed to write XML: {0}")]
    Write(#[source] std::io::Error),
}

/// Parse a whole document.
pub fn parse_str(text: &str) -> Result<DocTree, XmlError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut declaration = None;
    let mut stack: Vec<DocNode> = Vec::new();
    let mut root = None;

    loop {
        let event = reader.read_event().map_err(|source| XmlError::Syntax {
            position: reader.error_position(),
            source,
        })?;
        match event {
            Event::Decl(decl) => declaration = Some(read_declaration(&decl)?),
            Event::Start(start) => stack.push(element(&start, reader.buffer_position())?),
            Event::Empty(start) => {
                let node = element(&start, reader.buffer_position())?;
                close(node, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    XmlError::Structure("closing tag without an open element".to_string())
                })?;
                close(node, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|source| XmlError::Syntax {
                    position: reader.buffer_position(),
                    source,
                })?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let data = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| e.utf8_error())?;
                append_text(&mut stack, &data)?;
            }
            Event::Eof => break,
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Structure(format!("<{}> is never closed", open.tag)));
    }
    let root = root.ok_or_else(|| XmlError::Structure("document has no root element".to_string()))?;
    Ok(DocTree { declaration, root })
}

fn element(start: &BytesStart<'_>, position: u64) -> Result<DocNode, XmlError> {
    let mut node = DocNode::new(std::str::from_utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|source| XmlError::Attribute { position, source })?;
        let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute
            .unescape_value()
            .map_err(|source| XmlError::Syntax { position, source })?;
        node.attributes.push((key, value.into_owned()));
    }
    Ok(node)
}

/// Hand a finished element to its parent, or make it the root.
fn close(node: DocNode, stack: &mut [DocNode], root: &mut Option<DocNode>) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(XmlError::Structure(format!(
                "second root element <{}>",
                node.tag
            )));
        }
    }
    Ok(())
}

fn append_text(stack: &mut [DocNode], text: &str) -> Result<(), XmlError> {
    let Some(open) = stack.last_mut() else {
        return Err(XmlError::Structure("text outside the root element".to_string()));
    };
    open.text.get_or_insert_with(String::new).push_str(text);
    Ok(())
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration, XmlError> {
    fn malformed(e: impl std::fmt::Display) -> XmlError {
        XmlError::Structure(format!("malformed XML declaration: {e}"))
    }
    let lossy = |bytes: Cow<'_, [u8]>| String::from_utf8_lossy(&bytes).into_owned();
    Ok(Declaration {
        version: lossy(decl.version().map_err(malformed)?),
        encoding: decl.encoding().transpose().map_err(malformed)?.map(lossy),
        standalone: decl.standalone().transpose().map_err(malformed)?.map(lossy),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements_attributes_and_text() {
        let tree = parse_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR xmlns="http://autosar.org/schema/r4.0">
  <AR-PACKAGES>
    <AR-PACKAGE UUID="p-1">
      <SHORT-NAME>Swcs</SHORT-NAME>
      <ELEMENTS/>
    </AR-PACKAGE>
  </AR-PACKAGES>
</AUTOSAR>
"#,
        )
        .unwrap();

        let declaration = tree.declaration.unwrap();
        assert_eq!(declaration.version, "1.0");
        assert_eq!(declaration.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(tree.root.attribute("xmlns"), Some("http://autosar.org/schema/r4.0"));

        let package = tree.root
            .child("AR-PACKAGES")
            .and_then(|p| p.child("AR-PACKAGE"))
            .unwrap();
        assert_eq!(package.attribute("UUID"), Some("p-1"));
        assert_eq!(package.child("SHORT-NAME").map(DocNode::text), Some("Swcs"));
        assert!(package.child("ELEMENTS").unwrap().is_empty());
    }

    #[test]
    fn test_entities_are_unescaped() {
        let tree = parse_str("<A><DESC>a &lt; b &amp; c</DESC></A>").unwrap();
        assert!(tree.declaration.is_none());
        assert_eq!(tree.root.child("DESC").map(DocNode::text), Some("a < b & c"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tree = parse_str("<A><!-- note --><B>1</B></A>").unwrap();
        assert_eq!(tree.root.children.len(), 1);
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        assert!(matches!(parse_str("<A><B></A>"), Err(XmlError::Syntax { .. })));
    }

    #[test]
    fn test_unclosed_and_empty_documents() {
        assert!(parse_str("<A><B>").is_err());
        assert!(matches!(parse_str(""), Err(XmlError::Structure(_))));
        assert!(matches!(parse_str("<A/><B/>"), Err(XmlError::Structure(_))));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let tree = parse_str("\u{feff}<AUTOSAR/>").unwrap();
        assert_eq!(tree.root.tag, "AUTOSAR");
    }
}
