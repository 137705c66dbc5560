//! Site document loading
//!
//! Reads a site document from disk and decodes it by file extension.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::TreeDocument;
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

/// Serialization format of a site document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> InfraResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(InfraError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Toml => "toml",
        };
        f.write_str(name)
    }
}

/// Decode `content` as a nested or flat site document.
pub fn parse_document(content: &str, format: DocumentFormat, path: &Path) -> InfraResult<TreeDocument> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|e| InfraError::parse(path, e))
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| InfraError::parse(path, e))
        }
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| InfraError::parse(path, e)),
    }
}

/// Loads site documents through a `FileSystem`.
pub struct DocumentLoader {
    fs: Arc<dyn FileSystem>,
}

impl DocumentLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> InfraResult<TreeDocument> {
        let format = DocumentFormat::from_path(path)?;
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read site document {}", path.display()), e))?;
        debug!("decoding {} bytes as {}", content.len(), format);
        parse_document(&content, format, path)
    }
}
