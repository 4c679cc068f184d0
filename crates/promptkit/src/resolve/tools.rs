//! Tool resolution.

use std::collections::{HashMap, HashSet};
use std::fmt;

use futures::future::try_join_all;
use tracing::{debug, trace};

use super::{FnResolver, ResolveFuture};
use crate::error::{PromptError, Result};
use crate::metadata::{PromptMetadata, ToolDefinition};

/// Looks up tool definitions by name.
///
/// Implementations must be cheap to call concurrently; [`resolve_tools`]
/// issues every lookup for a prompt at once.
pub trait ToolResolver: Send + Sync {
    /// Resolve `name` to a definition, or `None` if the tool is unknown.
    fn resolve_tool<'a>(&'a self, name: &'a str) -> ResolveFuture<'a, ToolDefinition>;
}

impl ToolResolver for FnResolver<ToolDefinition> {
    fn resolve_tool<'a>(&'a self, name: &'a str) -> ResolveFuture<'a, ToolDefinition> {
        self.lookup(name)
    }
}

// ── ToolRegistry ───────────────────────────────────────────────────

/// An in-memory set of tool definitions keyed by name.
///
/// ```
/// use promptkit::resolve::ToolRegistry;
/// use promptkit::ToolDefinition;
/// use serde_json::json;
///
/// let registry = ToolRegistry::new()
///     .with(ToolDefinition::new("search", json!({"type": "object"})))
///     .with(ToolDefinition::new("clock", json!({"type": "object"})));
/// assert_eq!(registry.len(), 2);
/// assert!(registry.get("search").is_some());
/// ```
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Replaces any existing tool with the same name.
    pub fn register(&mut self, def: ToolDefinition) {
        if self.tools.contains_key(&def.name) {
            debug!("Replacing tool definition '{}'", def.name);
        }
        self.tools.insert(def.name.clone(), def);
    }

    /// Register a definition (builder pattern).
    pub fn with(mut self, def: ToolDefinition) -> Self {
        self.register(def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().cloned().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolResolver for ToolRegistry {
    fn resolve_tool<'a>(&'a self, name: &'a str) -> ResolveFuture<'a, ToolDefinition> {
        let found = self.tools.get(name).cloned();
        Box::pin(async move { found })
    }
}

// ── Resolution ─────────────────────────────────────────────────────

/// Resolve the names in `metadata.tools` into inline `toolDefs`.
///
/// - Inline definitions come first and win on a name collision: a name
///   already present in `toolDefs` is not looked up.
/// - Duplicate names are looked up once.
/// - Lookups run concurrently; resolved definitions are appended in
///   `tools` order.
/// - On success `tools` is cleared. Any name the resolver does not know
///   fails the whole call with [`PromptError::ToolNotFound`].
pub async fn resolve_tools(
    mut metadata: PromptMetadata,
    resolver: &dyn ToolResolver,
) -> Result<PromptMetadata> {
    let names = match metadata.tools.take() {
        Some(names) if !names.is_empty() => names,
        other => {
            metadata.tools = other;
            return Ok(metadata);
        }
    };

    let mut seen: HashSet<String> = metadata
        .tool_defs
        .iter()
        .flatten()
        .map(|def| def.name.clone())
        .collect();
    let mut pending = Vec::with_capacity(names.len());
    for name in names {
        if seen.insert(name.clone()) {
            pending.push(name);
        } else {
            trace!("Tool '{name}' already defined inline or listed twice; skipping lookup");
        }
    }

    debug!("Resolving {} tool reference(s)", pending.len());
    let lookups = pending.iter().map(|name| async move {
        resolver
            .resolve_tool(name)
            .await
            .ok_or_else(|| PromptError::ToolNotFound(name.clone()))
    });
    let resolved = try_join_all(lookups).await?;

    if !resolved.is_empty() {
        metadata
            .tool_defs
            .get_or_insert_with(Vec::new)
            .extend(resolved);
    }
    Ok(metadata)
}
