//! Prompt source storage.
//!
//! A [`PromptStore`] lists, loads, saves, and deletes prompt sources and
//! partials. Stores deal in raw text ([`PromptData`]); turning source into a
//! [`ParsedPrompt`](crate::prompt::ParsedPrompt) is the template engine's job.
//!
//! Every loaded prompt carries a `version`: the [`source_version`] hash of
//! its text. Asking for a specific version of a prompt whose content has
//! since changed fails with [`PromptError::VersionMismatch`].
//!
//! # Submodules
//!
//! - [`memory`]: [`MemoryStore`], a map-backed store for tests and embedding.
//! - [`dir`]: [`DirStore`], `.prompt` files in a directory tree.

pub mod dir;
pub mod memory;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

pub use dir::{DirStore, DirStoreConfig};
pub use memory::MemoryStore;

use crate::error::{PromptError, Result};
use crate::prompt::{PartialData, PartialRef, PromptData, PromptRef};

/// Boxed future returned by [`PromptStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Pagination options for listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Cursor returned by a previous page.
    pub cursor: Option<String>,
    /// Maximum number of items per page. `None` and `Some(0)` return
    /// everything from the cursor on.
    pub limit: Option<usize>,
}

impl ListOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// Selects which stored prompt to load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub variant: Option<String>,
    /// Expected content version; loading fails if the source has changed.
    pub version: Option<String>,
}

impl LoadOptions {
    pub fn variant(variant: impl Into<String>) -> Self {
        Self {
            variant: Some(variant.into()),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// One page of listing results.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Storage backend for prompt sources and partials.
pub trait PromptStore: Send + Sync {
    /// List prompts, sorted by name then variant.
    fn list(&self, options: ListOptions) -> StoreFuture<'_, PaginatedList<PromptRef>>;

    /// List partials, sorted by name then variant.
    fn list_partials(&self, options: ListOptions) -> StoreFuture<'_, PaginatedList<PartialRef>>;

    /// Load a prompt source.
    fn load<'a>(&'a self, name: &'a str, options: LoadOptions) -> StoreFuture<'a, PromptData>;

    /// Load a partial source.
    fn load_partial<'a>(
        &'a self,
        name: &'a str,
        options: LoadOptions,
    ) -> StoreFuture<'a, PartialData>;

    /// Create or replace a prompt source. Any `version` on the input is ignored.
    fn save(&self, prompt: PromptData) -> StoreFuture<'_, ()>;

    /// Remove a prompt source.
    fn delete<'a>(&'a self, name: &'a str, variant: Option<&'a str>) -> StoreFuture<'a, ()>;
}

/// Content version of a prompt source: 64-bit FNV-1a, as 16 hex digits.
pub fn source_version(source: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in source.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")
}

/// Attach the content version to a loaded record, checking it against the
/// requested one.
pub(crate) fn versioned(
    prompt_ref: PromptRef,
    source: String,
    requested: Option<&str>,
) -> Result<PromptData> {
    let version = source_version(&source);
    if let Some(requested) = requested
        && requested != version
    {
        return Err(PromptError::VersionMismatch {
            name: prompt_ref.to_string(),
            requested: requested.to_string(),
            found: version,
        });
    }
    Ok(PromptData::new(prompt_ref.with_version(version), source))
}

/// Slice a sorted listing according to `options`. The cursor is the
/// decimal offset of the next page.
pub(crate) fn paginate<T>(items: Vec<T>, options: &ListOptions) -> Result<PaginatedList<T>> {
    let start = match &options.cursor {
        Some(cursor) => cursor
            .parse::<usize>()
            .ok()
            .filter(|offset| *offset <= items.len())
            .ok_or_else(|| PromptError::InvalidCursor(cursor.clone()))?,
        None => 0,
    };
    let end = match options.limit {
        Some(limit) if limit > 0 => start.saturating_add(limit).min(items.len()),
        _ => items.len(),
    };
    let cursor = (end < items.len()).then(|| end.to_string());
    let items = items.into_iter().skip(start).take(end - start).collect();
    Ok(PaginatedList { items, cursor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_stable_hex() {
        let v = source_version("Hello {{name}}");
        assert_eq!(v.len(), 16);
        assert_eq!(v, source_version("Hello {{name}}"));
        assert_ne!(v, source_version("Hello {{name}}!"));
        assert_eq!(source_version(""), "cbf29ce484222325");
    }

    #[test]
    fn versioned_checks_requested() {
        let source = "body".to_string();
        let version = source_version(&source);
        let ok = versioned(PromptRef::new("p"), source.clone(), Some(&version)).unwrap();
        assert_eq!(ok.prompt_ref.version.as_deref(), Some(version.as_str()));

        let err = versioned(PromptRef::new("p"), source, Some("deadbeef")).unwrap_err();
        assert!(matches!(err, PromptError::VersionMismatch { .. }));
    }

    #[test]
    fn paginate_walks_pages() {
        let items: Vec<u32> = (0..5).collect();
        let first = paginate(items.clone(), &ListOptions::default().with_limit(2)).unwrap();
        assert_eq!(first.items, vec![0, 1]);
        assert_eq!(first.cursor.as_deref(), Some("2"));

        let last = paginate(
            items.clone(),
            &ListOptions::default().with_limit(10).with_cursor("4"),
        )
        .unwrap();
        assert_eq!(last.items, vec![4]);
        assert_eq!(last.cursor, None);

        let all = paginate(items, &ListOptions::default()).unwrap();
        assert_eq!(all.items.len(), 5);
        assert_eq!(all.cursor, None);
    }

    #[test]
    fn zero_limit_means_unlimited() {
        let items: Vec<u32> = (0..3).collect();
        let page = paginate(items.clone(), &ListOptions::default().with_limit(0)).unwrap();
        assert_eq!(page.items, items);
        assert_eq!(page.cursor, None);

        let rest = paginate(items, &ListOptions::default().with_limit(0).with_cursor("1")).unwrap();
        assert_eq!(rest.items, vec![1, 2]);
        assert_eq!(rest.cursor, None);
    }

    #[test]
    fn paginate_rejects_foreign_cursor() {
        let items: Vec<u32> = (0..3).collect();
        assert!(paginate(items.clone(), &ListOptions::default().with_cursor("abc")).is_err());
        assert!(paginate(items, &ListOptions::default().with_cursor("9")).is_err());
    }
}
