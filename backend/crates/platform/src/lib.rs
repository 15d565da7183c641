//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random bytes, SHA-256, base64url)
//! - Cookie building and extraction
//! - Redundant key-value storage over several media (`storage`)

pub mod cookie;
pub mod crypto;
pub mod storage;
