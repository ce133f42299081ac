//! Extension to MIME type mapping.
//!
//! A built-in table covers the usual web types. A file in the
//! `/etc/mime.types` format can be layered on top:
//!
//! ```text
//! # comment
//! text/css                css
//! image/jpeg              jpeg jpg jpe
//! ```
//!
//! Unknown extensions are served as `text/html`.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// Type used for unknown extensions
pub const DEFAULT_MIME_TYPE: &str = "text/html";

const BUILTIN: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("shtml", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("xml", "application/xml"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("ico", "image/vnd.microsoft.icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("wasm", "application/wasm"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
];

/// Extension to MIME type table
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MimeTable {
    /// Table holding only the built-in types
    pub fn builtin() -> Self {
        let types = BUILTIN
            .iter()
            .map(|(ext, mime)| ((*ext).to_string(), (*mime).to_string()))
            .collect();
        Self { types }
    }

    /// Built-in table overridden by the entries of a mime.types file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MimeTypes` if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::MimeTypes {
            path: path.to_path_buf(),
            source,
        })?;
        let mut table = Self::builtin();
        let added = table.merge(&source);
        tracing::info!("Loaded {} MIME extensions from {:?}", added, path);
        Ok(table)
    }

    /// Merge entries in mime.types format, returning how many extensions
    /// were set.
    pub fn merge(&mut self, source: &str) -> usize {
        let mut added = 0;
        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(mime) = fields.next() else {
                continue;
            };
            for ext in fields {
                self.types.insert(ext.to_ascii_lowercase(), mime.to_string());
                added += 1;
            }
        }
        added
    }

    /// MIME type for an extension, `text/html` if unknown
    pub fn lookup(&self, extension: &str) -> &str {
        self.types
            .get(extension)
            .or_else(|| self.types.get(&extension.to_ascii_lowercase()))
            .map_or(DEFAULT_MIME_TYPE, String::as_str)
    }

    /// MIME type for a normalized archive key
    pub fn for_key(&self, key: &str) -> &str {
        self.lookup(bigpack_format::path::extension(key))
    }

    /// Number of known extensions
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
