//! Configuration for archive access

use bigpack_format::{DATA_FILE, MAP_FILE, MAP2_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the archive lives and how it is read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory holding the three archive files
    pub root: PathBuf,

    /// Data (record) file name
    pub data_file: String,

    /// Secondary (paged) index file name
    pub map_file: String,

    /// Primary (in-memory) index file name
    pub map2_file: String,

    /// Number of map pages kept in the page cache (0 disables it)
    pub page_cache_pages: usize,

    /// Reload the index once and retry when a lookup finds the index files
    /// out of sync
    pub reload_on_out_of_sync: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            data_file: DATA_FILE.to_string(),
            map_file: MAP_FILE.to_string(),
            map2_file: MAP2_FILE.to_string(),
            page_cache_pages: 0,
            reload_on_out_of_sync: true,
        }
    }
}

impl ArchiveConfig {
    /// Create a configuration for the archive in `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the archive directory
    #[must_use]
    pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    /// Override the three file names
    #[must_use]
    pub fn with_file_names(
        mut self,
        data_file: impl Into<String>,
        map_file: impl Into<String>,
        map2_file: impl Into<String>,
    ) -> Self {
        self.data_file = data_file.into();
        self.map_file = map_file.into();
        self.map2_file = map2_file.into();
        self
    }

    /// Set the page cache capacity in pages
    #[must_use]
    pub const fn with_page_cache(mut self, pages: usize) -> Self {
        self.page_cache_pages = pages;
        self
    }

    /// Enable or disable reload-and-retry on out-of-sync lookups
    #[must_use]
    pub const fn with_reload_on_out_of_sync(mut self, enable: bool) -> Self {
        self.reload_on_out_of_sync = enable;
        self
    }

    /// Full path of the data file
    pub fn data_path(&self) -> PathBuf {
        self.root.join(&self.data_file)
    }

    /// Full path of the map file
    pub fn map_path(&self) -> PathBuf {
        self.root.join(&self.map_file)
    }

    /// Full path of the map2 file
    pub fn map2_path(&self) -> PathBuf {
        self.root.join(&self.map2_file)
    }

    /// All three archive file paths, data first
    pub fn paths(&self) -> [PathBuf; 3] {
        [self.data_path(), self.map_path(), self.map2_path()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.data_path(), PathBuf::from("./BigPack.data"));
        assert_eq!(config.map_path(), PathBuf::from("./BigPack.map"));
        assert_eq!(config.map2_path(), PathBuf::from("./BigPack.map2"));
        assert_eq!(config.page_cache_pages, 0);
        assert!(config.reload_on_out_of_sync);
    }

    #[test]
    fn test_builder() {
        let config = ArchiveConfig::new("/srv/site")
            .with_file_names("a.data", "a.map", "a.map2")
            .with_page_cache(64)
            .with_reload_on_out_of_sync(false);

        assert_eq!(
            config.paths(),
            [
                PathBuf::from("/srv/site/a.data"),
                PathBuf::from("/srv/site/a.map"),
                PathBuf::from("/srv/site/a.map2"),
            ]
        );
        assert_eq!(config.page_cache_pages, 64);
        assert!(!config.reload_on_out_of_sync);

        let moved = config.with_root("/srv/other");
        assert_eq!(moved.data_path(), PathBuf::from("/srv/other/a.data"));
    }
}
