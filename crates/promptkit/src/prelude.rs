//! Convenience re-exports for common `promptkit` types.
//!
//! Meant to be glob-imported:
//!
//! ```ignore
//! use promptkit::prelude::*;
//! ```
//!
//! Pulls in the contract types, the compiled-prompt trait and its closure
//! adapter, the resolver traits and registries, and the store trait with
//! its backends. Resolution passes and store option types are left to
//! their modules.

// ── Contract types ──────────────────────────────────────────────────
pub use crate::{
    DataArgument, Document, InputSpec, Media, Message, OutputFormat, OutputSpec, Part,
    PromptError, PromptMetadata, RenderedPrompt, Role, ToolDefinition, ToolRequest, ToolResponse,
    json_schema_for,
};

// ── Compiled prompts ────────────────────────────────────────────────
pub use crate::prompt::{
    CompiledPrompt, FnPrompt, ParsedPrompt, PromptData, PromptRef, RenderRequest,
};

// ── Resolution ──────────────────────────────────────────────────────
pub use crate::resolve::{
    FnResolver, FnSchemaResolver, FnToolResolver, SchemaRegistry, SchemaResolver, ToolRegistry,
    ToolResolver,
};

// ── Storage ─────────────────────────────────────────────────────────
pub use crate::store::{DirStore, DirStoreConfig, MemoryStore, PromptStore};
