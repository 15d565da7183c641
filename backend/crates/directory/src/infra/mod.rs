//! Infrastructure Layer
//!
//! Filesystem access for the CDN.

pub mod cdn;

pub use cdn::{CdnNode, CdnRoot, DirectoryEntry, EntryType};
