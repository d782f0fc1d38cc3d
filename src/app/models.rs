//! Data model of the item list
//!
//! The item list is a YAML mapping from group name to a list of items:
//!
//! ```yaml
//! tools:
//!   - module: ripgrep
//!     filename: rg.tar.gz
//!     download-urls:
//!       - https://example.com/rg.tar.gz
//!       - https://mirror.example.org/rg.tar.gz
//!     keep-updated: true
//! ```
//!
//! Groups keep their file order.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One file to fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DownloadItem {
    /// Display name
    #[serde(default)]
    pub module: String,
    /// Destination relative to the group directory, or an absolute path
    pub filename: String,
    /// Candidate URLs, tried in order
    #[serde(default)]
    pub download_urls: Vec<String>,
    /// Re-download once the cache record has expired
    #[serde(default)]
    pub keep_updated: bool,
}

impl DownloadItem {
    pub fn new(module: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            filename: filename.into(),
            download_urls: Vec::new(),
            keep_updated: false,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.download_urls.push(url.into());
        self
    }

    pub fn with_keep_updated(mut self, keep_updated: bool) -> Self {
        self.keep_updated = keep_updated;
        self
    }

    /// Name shown to the user: the module, or the filename if it has none
    pub fn display_name(&self) -> &str {
        if self.module.trim().is_empty() {
            &self.filename
        } else {
            &self.module
        }
    }

    /// Where this item is stored: `<output_dir>/<group>/<filename>`, unless the filename is absolute
    pub fn destination(&self, output_dir: &Path, group: &str) -> PathBuf {
        let filename = Path::new(&self.filename);
        if filename.is_absolute() {
            filename.to_path_buf()
        } else {
            output_dir.join(group).join(filename)
        }
    }
}

/// Items by group, in file order
pub type ItemGroups = IndexMap<String, Vec<DownloadItem>>;

/// Number of items across all groups
pub fn item_count(groups: &ItemGroups) -> usize {
    groups.values().map(Vec::len).sum()
}
