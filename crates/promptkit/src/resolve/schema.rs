//! Named schema resolution.
//!
//! Any schema slot in [`PromptMetadata`] may hold either a schema document
//! or a bare JSON string naming a registered schema. [`resolve_schemas`]
//! swaps the names for the documents. The documents themselves are opaque
//! here and are never validated.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, trace};

use super::{FnResolver, ResolveFuture};
use crate::error::{PromptError, Result};
use crate::metadata::PromptMetadata;

/// Looks up JSON Schema documents by name.
pub trait SchemaResolver: Send + Sync {
    /// Resolve `name` to a schema, or `None` if it is unknown.
    fn resolve_schema<'a>(&'a self, name: &'a str) -> ResolveFuture<'a, Value>;
}

impl SchemaResolver for FnResolver<Value> {
    fn resolve_schema<'a>(&'a self, name: &'a str) -> ResolveFuture<'a, Value> {
        self.lookup(name)
    }
}

/// An in-memory map of named schemas.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Value>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. Replaces any existing schema with the same name.
    pub fn register(&mut self, name: impl Into<String>, schema: Value) {
        self.schemas.insert(name.into(), schema);
    }

    /// Register a schema (builder pattern).
    pub fn with(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.register(name, schema);
        self
    }

    /// Register the JSON Schema generated for a Rust type under `name`.
    pub fn with_type<T: schemars::JsonSchema>(self, name: impl Into<String>) -> Self {
        self.with(name, crate::json_schema_for::<T>())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaResolver for SchemaRegistry {
    fn resolve_schema<'a>(&'a self, name: &'a str) -> ResolveFuture<'a, Value> {
        let found = self.schemas.get(name).cloned();
        Box::pin(async move { found })
    }
}

/// Replace every named schema reference in `metadata` with its document.
///
/// Visits `input.schema`, `output.schema`, and the `inputSchema` /
/// `outputSchema` of each inline tool. Slots holding anything other than a
/// JSON string are left untouched. An unknown name fails with
/// [`PromptError::SchemaNotFound`].
pub async fn resolve_schemas(
    mut metadata: PromptMetadata,
    resolver: &dyn SchemaResolver,
) -> Result<PromptMetadata> {
    if let Some(slot) = metadata.input.as_mut().and_then(|i| i.schema.as_mut()) {
        resolve_slot(slot, resolver).await?;
    }
    if let Some(slot) = metadata.output.as_mut().and_then(|o| o.schema.as_mut()) {
        resolve_slot(slot, resolver).await?;
    }
    for def in metadata.tool_defs.iter_mut().flatten() {
        resolve_slot(&mut def.input_schema, resolver).await?;
        if let Some(slot) = def.output_schema.as_mut() {
            resolve_slot(slot, resolver).await?;
        }
    }
    Ok(metadata)
}

async fn resolve_slot(slot: &mut Value, resolver: &dyn SchemaResolver) -> Result<()> {
    let Value::String(name) = slot else {
        return Ok(());
    };
    let name = name.clone();
    trace!("Resolving schema reference '{name}'");
    match resolver.resolve_schema(&name).await {
        Some(schema) => {
            debug!("Resolved schema '{name}'");
            *slot = schema;
            Ok(())
        }
        None => Err(PromptError::SchemaNotFound(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{InputSpec, OutputSpec, ToolDefinition};
    use serde_json::json;

    #[tokio::test]
    async fn absent_differs_from_empty() {
        let registry = SchemaRegistry::new().with("Empty", json!({}));
        assert_eq!(registry.resolve_schema("Empty").await, Some(json!({})));
        assert_eq!(registry.resolve_schema("Missing").await, None);
    }

    #[tokio::test]
    async fn named_references_are_replaced() {
        let person = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        let registry = SchemaRegistry::new()
            .with("Person", person.clone())
            .with("Reply", json!({"type": "string"}));
        let meta = PromptMetadata::default()
            .with_input(InputSpec {
                default: None,
                schema: Some(json!("Person")),
            })
            .with_output(OutputSpec {
                format: None,
                schema: Some(json!("Reply")),
            })
            .with_tool_def(
                ToolDefinition::new("lookup", json!("Person")).with_output_schema(json!("Reply")),
            );

        let out = resolve_schemas(meta, &registry).await.unwrap();
        assert_eq!(out.input.unwrap().schema, Some(person.clone()));
        assert_eq!(out.output.unwrap().schema, Some(json!({"type": "string"})));
        let tool = &out.tool_defs.unwrap()[0];
        assert_eq!(tool.input_schema, person);
        assert_eq!(tool.output_schema, Some(json!({"type": "string"})));
    }

    #[tokio::test]
    async fn inline_schemas_pass_through() {
        let inline = json!({"type": "object"});
        let meta = PromptMetadata::default().with_input(InputSpec {
            default: None,
            schema: Some(inline.clone()),
        });
        let out = resolve_schemas(meta, &SchemaRegistry::new()).await.unwrap();
        assert_eq!(out.input.unwrap().schema, Some(inline));
    }

    #[tokio::test]
    async fn unknown_reference_is_an_error() {
        let meta = PromptMetadata::default().with_output(OutputSpec {
            format: None,
            schema: Some(json!("Ghost")),
        });
        let err = resolve_schemas(meta, &SchemaRegistry::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PromptError::SchemaNotFound(ref n) if n == "Ghost"));
    }

    #[test]
    fn registry_from_rust_type() {
        #[derive(schemars::JsonSchema)]
        #[allow(dead_code)]
        struct Answer {
            text: String,
        }
        let registry = SchemaRegistry::new().with_type::<Answer>("Answer");
        assert_eq!(registry.get("Answer").unwrap()["type"], "object");
    }
}
