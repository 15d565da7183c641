//! Static file tree served under `/api/cdn`
//!
//! Requested paths are resolved below a fixed root. Anything that would
//! leave the root, through `..` or a symlink, is refused.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{DirectoryError, DirectoryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Files only
    pub size: Option<u64>,
    /// RFC 3339, millisecond precision
    pub modified: String,
    /// Path relative to the root, `/` separated
    pub path: String,
}

/// What a request path resolved to
#[derive(Debug)]
pub enum CdnNode {
    Directory(Vec<DirectoryEntry>),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct CdnRoot {
    root: PathBuf,
}

impl CdnRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `requested` below the root and list or locate it
    pub async fn open(&self, requested: &str) -> DirectoryResult<CdnNode> {
        let relative = sanitize(requested)?;

        let root = tokio::fs::canonicalize(&self.root).await.map_err(|e| {
            DirectoryError::Io(format!("CDN root {}: {e}", self.root.display()))
        })?;
        let target = tokio::fs::canonicalize(root.join(&relative))
            .await
            .map_err(io_error)?;

        if !target.starts_with(&root) {
            tracing::warn!(requested, "CDN path resolves outside the root");
            return Err(DirectoryError::AccessDenied);
        }

        let metadata = tokio::fs::metadata(&target).await.map_err(io_error)?;
        if metadata.is_dir() {
            let prefix = relative_display(&relative);
            Ok(CdnNode::Directory(list(&target, &prefix).await?))
        } else if metadata.is_file() {
            Ok(CdnNode::File(target))
        } else {
            Err(DirectoryError::NotFound)
        }
    }
}

/// Reject absolute paths and parent components, drop `.` and empty segments
fn sanitize(requested: &str) -> DirectoryResult<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(requested.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                tracing::warn!(requested, "CDN path traversal attempt");
                return Err(DirectoryError::AccessDenied);
            }
        }
    }
    Ok(clean)
}

fn relative_display(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn io_error(e: std::io::Error) -> DirectoryError {
    match e.kind() {
        IoErrorKind::NotFound | IoErrorKind::NotADirectory => DirectoryError::NotFound,
        IoErrorKind::PermissionDenied => DirectoryError::AccessDenied,
        _ => DirectoryError::Io(e.to_string()),
    }
}

async fn list(dir: &Path, prefix: &str) -> DirectoryResult<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(io_error)?;

    while let Some(entry) = read_dir.next_entry().await.map_err(io_error)? {
        // Follows symlinks; dangling ones are skipped
        let Ok(metadata) = tokio::fs::metadata(entry.path()).await else {
            continue;
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let entry_type = if metadata.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        };
        let modified = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        entries.push(DirectoryEntry {
            size: (entry_type == EntryType::File).then_some(metadata.len()),
            name,
            entry_type,
            modified,
            path,
        });
    }

    entries.sort_by(|a, b| {
        let dirs_first = (a.entry_type != EntryType::Directory).cmp(&(b.entry_type != EntryType::Directory));
        dirs_first
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("docs/nested")).await.unwrap();
        tokio::fs::create_dir(dir.path().join("Images")).await.unwrap();
        tokio::fs::write(dir.path().join("b.txt"), b"bee").await.unwrap();
        tokio::fs::write(dir.path().join("A.txt"), b"a").await.unwrap();
        tokio::fs::write(dir.path().join("docs/guide.pdf"), b"%PDF").await.unwrap();
        dir
    }

    #[tokio::test]
    async fn test_root_listing_sorted_dirs_first() {
        let dir = tree().await;
        let cdn = CdnRoot::new(dir.path());

        let CdnNode::Directory(entries) = cdn.open("").await.unwrap() else {
            panic!("expected a directory");
        };
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "Images", "A.txt", "b.txt"]);

        let b = &entries[3];
        assert_eq!(b.entry_type, EntryType::File);
        assert_eq!(b.size, Some(3));
        assert_eq!(b.path, "b.txt");
        assert!(b.modified.ends_with('Z'));
        assert_eq!(entries[0].size, None);
    }

    #[tokio::test]
    async fn test_nested_listing_paths() {
        let dir = tree().await;
        let cdn = CdnRoot::new(dir.path());

        let CdnNode::Directory(entries) = cdn.open("/docs/").await.unwrap() else {
            panic!("expected a directory");
        };
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["docs/nested", "docs/guide.pdf"]);
    }

    #[tokio::test]
    async fn test_file_resolves() {
        let dir = tree().await;
        let cdn = CdnRoot::new(dir.path());

        match cdn.open("docs/./guide.pdf").await.unwrap() {
            CdnNode::File(path) => assert!(path.ends_with("docs/guide.pdf")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_escape_denied() {
        let dir = tree().await;
        let cdn = CdnRoot::new(dir.path().join("docs"));

        assert!(matches!(cdn.open("../b.txt").await, Err(DirectoryError::AccessDenied)));
        assert!(matches!(cdn.open("nested/../../b.txt").await, Err(DirectoryError::AccessDenied)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_denied() {
        let dir = tree().await;
        let outside = tempfile::tempdir().unwrap();
        tokio::fs::write(outside.path().join("secret"), b"x").await.unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let cdn = CdnRoot::new(dir.path());
        assert!(matches!(cdn.open("link/secret").await, Err(DirectoryError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let dir = tree().await;
        let cdn = CdnRoot::new(dir.path());

        assert!(matches!(cdn.open("nope.txt").await, Err(DirectoryError::NotFound)));
        assert!(matches!(cdn.open("b.txt/child").await, Err(DirectoryError::NotFound)));
    }
}
