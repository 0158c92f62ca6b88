//! Typed cache key builder.
//!
//! All cache users share one key space; every key is built here so the
//! namespaces never collide.

use std::fmt;

use sha2::{Digest, Sha256};

/// A namespaced cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey<'a> {
    /// Cached page for a request URI (path + query). The URI is hashed.
    Page(&'a str),
    /// Key list of a page-cache invalidation group.
    Group(&'a str),
    /// Pending response metadata of a user.
    Meta(&'a str),
    /// Snapshot of all settings.
    Settings,
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CacheKey::Page(uri) => {
                let digest = Sha256::digest(uri.as_bytes());
                write!(f, "page.{}", hex::encode(digest))
            }
            CacheKey::Group(name) => write!(f, "group.{}", name),
            CacheKey::Meta(user) => write!(f, "meta.{}", user),
            CacheKey::Settings => write!(f, "settings"),
        }
    }
}
