//! In-memory static asset store.
//!
//! The sandbox has no filesystem, so the host registers asset bytes up
//! front and the engine serves them as a routing fallback. Path handling
//! follows ordinary static-file rules: traversal segments are rejected and
//! `/` resolves to `/index.html`.

use std::collections::HashMap;

use tracing::debug;

use crate::util;

/// A registered asset: content bytes plus the MIME type derived from its
/// extension at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

/// Normalize a request path to an asset key.
///
/// Returns `None` for paths that do not start with `/` or that contain
/// `.` / `..` segments. `/` and paths ending in `/` resolve to
/// `index.html` in that directory.
#[must_use]
pub fn normalize_path(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }
    if path.split('/').any(|segment| segment == ".." || segment == ".") {
        return None;
    }
    if path.ends_with('/') {
        Some(format!("{path}index.html"))
    } else {
        Some(path.to_string())
    }
}

/// Registry of host-provided static assets keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    assets: HashMap<String, StaticAsset>,
}

impl StaticAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset under a path. The content type is derived from
    /// the path's extension; unknown extensions serve as
    /// `application/octet-stream`. Returns `false` for invalid paths.
    pub fn add(&mut self, path: &str, content: Vec<u8>) -> bool {
        let Some(key) = normalize_path(path) else {
            debug!(path, "rejected static asset path");
            return false;
        };
        let extension = key.rsplit('.').next().unwrap_or("");
        let content_type = util::get_content_type(extension);
        self.assets.insert(
            key,
            StaticAsset {
                content,
                content_type,
            },
        );
        true
    }

    /// Look up an asset for a request path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&StaticAsset> {
        let key = normalize_path(path)?;
        self.assets.get(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
