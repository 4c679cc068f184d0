//! Name-based lookup of tools and schemas.
//!
//! A prompt may reference tools and schemas by name instead of defining them
//! inline. Resolution is delegated to pluggable, possibly asynchronous
//! resolvers:
//!
//! - [`ToolResolver`] maps a tool name to a [`ToolDefinition`](crate::ToolDefinition).
//! - [`SchemaResolver`] maps a schema name to a JSON Schema document.
//!
//! A resolver answers `None` when the name is unknown, which is distinct
//! from answering with an empty schema or definition. Callers that need a
//! name to resolve ([`resolve_tools`], [`resolve_schemas`]) turn `None` into
//! an error.
//!
//! # Submodules
//!
//! - [`tools`]: [`ToolResolver`], [`ToolRegistry`], [`resolve_tools`].
//! - [`schema`]: [`SchemaResolver`], [`SchemaRegistry`], [`resolve_schemas`].

pub mod schema;
pub mod tools;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub use schema::{SchemaRegistry, SchemaResolver, resolve_schemas};
pub use tools::{ToolRegistry, ToolResolver, resolve_tools};

/// Boxed future returned by resolver lookups. `None` means "not found".
pub type ResolveFuture<'a, T> = Pin<Box<dyn Future<Output = Option<T>> + Send + 'a>>;

/// Type-erased async lookup for [`FnResolver`].
type ErasedLookup<T> =
    Box<dyn Fn(String) -> Pin<Box<dyn Future<Output = Option<T>> + Send>> + Send + Sync>;

/// A closure-backed resolver.
///
/// Implements [`ToolResolver`] when `T` is
/// [`ToolDefinition`](crate::ToolDefinition) and [`SchemaResolver`] when `T`
/// is `serde_json::Value`. Use it to bridge an existing registry (a database,
/// a remote catalog) without defining a struct.
///
/// # Example
///
/// ```
/// use promptkit::resolve::{FnResolver, SchemaResolver};
/// use serde_json::json;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let resolver = FnResolver::new(|name: String| async move {
///     (name == "Person").then(|| json!({"type": "object"}))
/// });
/// assert!(resolver.resolve_schema("Person").await.is_some());
/// assert!(resolver.resolve_schema("Nope").await.is_none());
/// # });
/// ```
pub struct FnResolver<T> {
    lookup: ErasedLookup<T>,
}

impl<T: Send + 'static> FnResolver<T> {
    pub fn new<F, Fut>(lookup: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let erased = move |name: String| -> Pin<Box<dyn Future<Output = Option<T>> + Send>> {
            Box::pin(lookup(name))
        };
        Self {
            lookup: Box::new(erased),
        }
    }

    fn lookup(&self, name: &str) -> ResolveFuture<'_, T> {
        (self.lookup)(name.to_string())
    }
}

/// Closure-backed [`ToolResolver`].
pub type FnToolResolver = FnResolver<crate::ToolDefinition>;

/// Closure-backed [`SchemaResolver`].
pub type FnSchemaResolver = FnResolver<serde_json::Value>;

impl<T> fmt::Debug for FnResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}
