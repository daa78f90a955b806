//! [`DocTree`] to XML text.

use crate::reader::XmlError;
use armodel_core::{DocNode, DocTree};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Render `tree` with `indent` spaces per level; 0 writes everything on
/// one line. Leaf text stays on the line of its element and elements
/// without content are self-closed.
pub fn to_string(tree: &DocTree, indent: usize) -> Result<String, XmlError> {
    let mut writer = if indent == 0 {
        Writer::new(Vec::new())
    } else {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    };

    if let Some(decl) = &tree.declaration {
        let event = BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        );
        emit(&mut writer, Event::Decl(event))?;
    }
    write_node(&mut writer, &tree.root)?;

    let mut text = String::from_utf8(writer.into_inner()).map_err(|e| e.utf8_error())?;
    text.push('\n');
    Ok(text)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &DocNode) -> Result<(), XmlError> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if node.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = node.text.as_deref().filter(|t| !t.is_empty()) {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(node.tag.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(std::io::Error::other(e)))
}
