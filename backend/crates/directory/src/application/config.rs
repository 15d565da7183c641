//! Directory Configuration

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Directory served under `/api/cdn`
    pub cdn_root: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cdn_root: PathBuf::from("cdn"),
        }
    }
}

impl DirectoryConfig {
    pub fn with_cdn_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cdn_root = root.into();
        self
    }
}
