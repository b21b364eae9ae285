// ── Asset path rewriting ──
//
// The backend reports page and thumbnail paths under its storage root
// (`/downloaded/...`); the files are served from a different public prefix.

use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_PREFIX: &str = "/downloaded";
pub const DEFAULT_PUBLIC_PREFIX: &str = "/static";

/// Maps storage-internal paths onto their public location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRewriter {
    storage_prefix: String,
    public_prefix: String,
}

impl AssetRewriter {
    pub fn new(storage_prefix: impl Into<String>, public_prefix: impl Into<String>) -> Self {
        Self {
            storage_prefix: storage_prefix.into(),
            public_prefix: public_prefix.into(),
        }
    }

    /// Replace the first occurrence of the storage prefix.
    ///
    /// Paths that do not contain the prefix pass through untouched.
    pub fn rewrite(&self, path: &str) -> String {
        if self.storage_prefix.is_empty() {
            return path.to_owned();
        }
        path.replacen(&self.storage_prefix, &self.public_prefix, 1)
    }

    pub fn storage_prefix(&self) -> &str {
        &self.storage_prefix
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }
}

impl Default for AssetRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_PREFIX, DEFAULT_PUBLIC_PREFIX)
    }
}
