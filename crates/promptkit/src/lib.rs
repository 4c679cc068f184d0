//! Typed prompt data contract for LLM prompt-templating systems.
//!
//! `promptkit` defines the values exchanged between a prompt template engine
//! and its callers: prompt metadata, messages made of content parts, tool
//! definitions, render inputs, and rendered outputs. It also carries the
//! plumbing that sits around an engine: metadata merging, name-based tool
//! and schema resolution, input defaults, and prompt source storage.
//!
//! The template engine itself is not part of this crate. A
//! [`CompiledPrompt`] is the contract an engine fulfils; [`FnPrompt`] adapts
//! any async closure to it.
//!
//! # Getting started
//!
//! ```
//! use promptkit::prelude::*;
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let tools = ToolRegistry::new()
//!     .with(ToolDefinition::new("weather", json!({"type": "object"})));
//!
//! let prompt = FnPrompt::new(
//!     ParsedPrompt::new(
//!         PromptMetadata::default()
//!             .with_name("forecast")
//!             .with_model("googleai/gemini-2.0-flash")
//!             .with_tool("weather"),
//!         "What is the weather in {{city}}?",
//!     ),
//!     // Stand-in engine: a real one would evaluate the template.
//!     |req: RenderRequest| async move {
//!         let city = req.data.input_value("city").and_then(|v| v.as_str()).unwrap_or("?");
//!         Ok(vec![Message::user(format!("What is the weather in {city}?"))])
//!     },
//! )
//! .with_tool_resolver(tools);
//!
//! let rendered = prompt
//!     .render(DataArgument::new().with_input("city", json!("Oslo")), None)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(rendered.messages[0].text(), "What is the weather in Oslo?");
//! assert_eq!(rendered.metadata.tool_defs.unwrap()[0].name, "weather");
//! # });
//! ```
//!
//! # Wire format
//!
//! Every type serializes to JSON with camelCase keys (`toolRequest`,
//! `toolDefs`, `contentType`, ...). Optional fields that are absent are
//! omitted rather than written as `null`, so a value survives a
//! serialize/deserialize round trip unchanged. [`json_schema_for`] exports
//! the JSON Schema of any contract type for interoperating systems.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`part`] | [`Part`] sum type: text, data, media, tool request/response, pending |
//! | [`message`] | [`Message`], [`Role`], [`Document`] |
//! | [`metadata`] | [`PromptMetadata`], [`ToolDefinition`], input/output specs, merging |
//! | [`render`] | [`DataArgument`], [`RenderedPrompt`] |
//! | [`resolve`] | [`ToolResolver`], [`SchemaResolver`], registries, resolution passes |
//! | [`prompt`] | [`CompiledPrompt`], [`FnPrompt`], [`ParsedPrompt`], [`PromptRef`] |
//! | [`store`] | [`PromptStore`], [`MemoryStore`], [`DirStore`] |
//!
//! [`ToolResolver`]: resolve::ToolResolver
//! [`SchemaResolver`]: resolve::SchemaResolver
//! [`PromptStore`]: store::PromptStore
//! [`MemoryStore`]: store::MemoryStore
//! [`DirStore`]: store::DirStore

pub mod error;
pub mod message;
pub mod metadata;
pub mod part;
pub mod prelude;
pub mod prompt;
pub mod render;
pub mod resolve;
pub mod store;

use schemars::JsonSchema;

pub use error::{PromptError, Result};
pub use message::{Document, Message, Role};
pub use metadata::{
    InputSpec, ModelConfig, OutputFormat, OutputSpec, PromptMetadata, ToolDefinition,
};
pub use part::{Media, Metadata, Part, PartKind, ToolRequest, ToolResponse};
pub use prompt::{
    CompiledPrompt, FnPrompt, ParsedPrompt, PartialData, PartialRef, PromptData, PromptFuture,
    PromptRef, RenderRequest,
};
pub use render::{CONTEXT_PREFIX, DataArgument, RenderedPrompt};

// Re-export schemars for downstream crates.
pub use schemars;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// Works for the contract types themselves as well as for caller types used
/// as tool inputs or structured outputs.
///
/// # Example
///
/// ```
/// use promptkit::{json_schema_for, Message};
///
/// let schema = json_schema_for::<Message>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"role".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn part_schema_lists_every_payload() {
        let schema = json_schema_for::<Part>();
        let keys: Vec<&String> = schema["oneOf"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|alt| alt["properties"].as_object().unwrap().keys())
            .collect();
        for key in ["text", "data", "media", "toolRequest", "toolResponse", "metadata"] {
            assert!(keys.iter().any(|k| k.as_str() == key), "missing {key}");
        }
    }

    #[test]
    fn rendered_prompt_schema_requires_messages() {
        let schema = json_schema_for::<RenderedPrompt>();
        assert!(
            schema["required"]
                .as_array()
                .unwrap()
                .contains(&json!("messages"))
        );
    }

    #[test]
    fn full_rendered_prompt_round_trip() {
        let value = json!({
            "name": "triage",
            "variant": "v2",
            "model": "vertexai/gemini-1.5-pro",
            "tools": ["lookupTicket"],
            "toolDefs": [{
                "name": "escalate",
                "description": "Escalate to a human",
                "inputSchema": {"type": "object"},
                "outputSchema": {"type": "boolean"}
            }],
            "config": {"temperature": 0.4},
            "input": {"default": {"tier": "free"}, "schema": "Ticket"},
            "output": {"format": "json", "schema": {"type": "object"}},
            "metadata": {"owner": "support"},
            "messages": [
                {"role": "system", "content": [{"text": "You triage tickets."}]},
                {"role": "user", "content": [
                    {"text": "My invoice is wrong"},
                    {"media": {"url": "https://x/invoice.pdf", "contentType": "application/pdf"}}
                ]},
                {"role": "model", "content": [
                    {"toolRequest": {"name": "lookupTicket", "input": {"id": 42}, "ref": "r1"}}
                ]},
                {"role": "tool", "content": [
                    {"toolResponse": {"name": "lookupTicket", "output": {"status": "open"}, "ref": "r1"}}
                ]},
                {"role": "model", "content": [
                    {"data": {"priority": "high"}, "metadata": {"confidence": 0.9}},
                    {"metadata": {"pending": true, "awaiting": "approval"}}
                ]}
            ]
        });
        let rendered: RenderedPrompt = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(rendered.messages.len(), 5);
        assert_eq!(rendered.metadata.output.as_ref().unwrap().format, Some(OutputFormat::Json));
        assert_eq!(serde_json::to_value(&rendered).unwrap(), value);
    }

    #[test]
    fn tool_definition_round_trip_keeps_optionals() {
        let minimal = json!({"name": "t", "inputSchema": {}});
        let def: ToolDefinition = serde_json::from_value(minimal.clone()).unwrap();
        assert_eq!(serde_json::to_value(&def).unwrap(), minimal);
    }
}
