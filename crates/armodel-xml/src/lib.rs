//! ARXML files for armodel sessions.
//!
//! [`XmlDocumentIo`] plugs the XML reader and writer into
//! [`armodel_core::Session`]; [`open_session`] builds a session over it.

pub mod reader;
pub mod writer;

use armodel_core::{DocTree, DocumentIo, ModelConfig, ModelError, Session, WriterConfig};
use std::io;
use std::path::Path;
use tracing::debug;

pub use reader::{XmlError, parse_str};
pub use writer::to_string;

/// Reads and writes documents as XML files on disk.
#[derive(Debug, Clone)]
pub struct XmlDocumentIo {
    indent: usize,
}

impl XmlDocumentIo {
    pub fn new(config: &WriterConfig) -> Self {
        Self { indent: config.indent }
    }
}

impl Default for XmlDocumentIo {
    fn default() -> Self {
        Self::new(&WriterConfig::default())
    }
}

impl DocumentIo for XmlDocumentIo {
    fn read(&self, path: &Path) -> armodel_core::Result<DocTree> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => ModelError::Parse {
                document: path.to_path_buf(),
                message: "document is not valid UTF-8".to_string(),
            },
            _ => ModelError::io(path, e),
        })?;
        let tree = parse_str(&text).map_err(|e| ModelError::Parse {
            document: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), bytes = text.len(), "parsed document");
        Ok(tree)
    }

    fn write(&self, path: &Path, tree: &DocTree) -> armodel_core::Result<()> {
        let text = to_string(tree, self.indent)
            .map_err(|e| ModelError::io(path, io::Error::other(e)))?;
        std::fs::write(path, text).map_err(|e| ModelError::io(path, e))
    }
}

/// A session reading and writing ARXML files with `config`.
pub fn open_session(config: ModelConfig) -> Session {
    let io = XmlDocumentIo::new(&config.writer);
    Session::with_config(io, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use armodel_core::ErrorKind;

    #[test]
    fn test_non_utf8_document_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("latin1.arxml");
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n".to_vec();
        bytes.extend_from_slice(b"<AUTOSAR><DESC>caf");
        bytes.extend_from_slice(&[0xE9]);
        bytes.extend_from_slice(b"</DESC></AUTOSAR>\n");
        std::fs::write(&path, bytes).unwrap();

        let err = XmlDocumentIo::default().read(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_missing_document_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = XmlDocumentIo::default()
            .read(&tmp.path().join("absent.arxml"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
