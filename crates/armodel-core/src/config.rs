//! Reader and writer settings.
//!
//! Load order: `armodel.toml` → environment variables → defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file looked up by [`ModelConfig::load`].
pub const CONFIG_FILE: &str = "armodel.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub reader: ReaderConfig,
    pub writer: WriterConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Fail the read on elements the catalog does not know instead of
    /// carrying them through verbatim.
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Spaces per nesting level.
    pub indent: usize,
    pub xml_declaration: bool,
    /// Root attributes of documents created from scratch.
    pub namespace: String,
    pub schema_location: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            xml_declaration: true,
            namespace: "http://autosar.org/schema/r4.0".to_string(),
            schema_location: "http://autosar.org/schema/r4.0 AUTOSAR_00046.xsd".to_string(),
        }
    }
}

impl WriterConfig {
    const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

    /// Attributes of the root element of a new document.
    pub fn root_attributes(&self) -> Vec<(String, String)> {
        vec![
            ("xmlns".to_string(), self.namespace.clone()),
            ("xmlns:xsi".to_string(), Self::XSI.to_string()),
            ("xsi:schemaLocation".to_string(), self.schema_location.clone()),
        ]
    }
}

fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl ModelConfig {
    /// Load `armodel.toml` from `dir`, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        env_override("ARMODEL_STRICT", &mut config.reader.strict);
        env_override("ARMODEL_INDENT", &mut config.writer.indent);

        if config.writer.indent > 16 {
            anyhow::bail!("writer.indent ({}) must be at most 16", config.writer.indent);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert!(!config.reader.strict);
        assert_eq!(config.writer.indent, 2);
        assert!(config.writer.xml_declaration);
        assert_eq!(config.writer.namespace, "http://autosar.org/schema/r4.0");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[reader]
strict = true

[writer]
indent = 4
"#;
        let config: ModelConfig = toml::from_str(toml_str).unwrap();
        assert!(config.reader.strict);
        assert_eq!(config.writer.indent, 4);
        // Defaults for unspecified fields
        assert!(config.writer.xml_declaration);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = ModelConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.writer.indent, 2);
    }

    #[test]
    fn test_load_rejects_oversized_indent() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "[writer]\nindent = 40\n").unwrap();

        let err = ModelConfig::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("writer.indent"));
    }

    #[test]
    fn test_root_attributes_carry_namespace() {
        let writer = WriterConfig {
            namespace: "urn:test".to_string(),
            ..WriterConfig::default()
        };
        let attrs = writer.root_attributes();
        assert_eq!(attrs[0], ("xmlns".to_string(), "urn:test".to_string()));
        assert_eq!(attrs.len(), 3);
    }
}
