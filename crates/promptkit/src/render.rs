//! Rendering inputs and outputs.
//!
//! [`DataArgument`] is what a caller hands to a compiled prompt;
//! [`RenderedPrompt`] is what comes back: the effective metadata plus the
//! messages ready to send to a model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::message::{Document, Message};
use crate::metadata::{InputSpec, PromptMetadata};

/// Prefix under which `context` entries are exposed to templates
/// (`context.auth` is visible as `@auth`).
pub const CONTEXT_PREFIX: &str = "@";

/// Runtime input for rendering a prompt. Every field is optional.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct DataArgument {
    /// Template input variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
    /// Retrieved documents made available to the template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<Vec<Document>>,
    /// Prior conversation history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    /// Ambient values (auth, session state, ...) exposed under [`CONTEXT_PREFIX`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl DataArgument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one input variable.
    pub fn with_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.input
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
        self
    }

    pub fn with_doc(mut self, doc: Document) -> Self {
        self.docs.get_or_insert_with(Vec::new).push(doc);
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Set one context entry. `name` is given without the `@` prefix.
    pub fn with_context(mut self, name: impl Into<String>, value: Value) -> Self {
        self.context
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
        self
    }

    /// Fill input variables the caller did not supply from `input.default`.
    ///
    /// Caller-supplied values always win, including explicit `null`.
    pub fn with_defaults(mut self, spec: Option<&InputSpec>) -> Self {
        let Some(defaults) = spec.and_then(|s| s.default.as_ref()) else {
            return self;
        };
        let input = self.input.get_or_insert_with(Map::new);
        for (key, value) in defaults {
            if !input.contains_key(key) {
                trace!("Input '{key}' taken from defaults");
                input.insert(key.clone(), value.clone());
            }
        }
        self
    }

    /// Look up an input variable.
    pub fn input_value(&self, name: &str) -> Option<&Value> {
        self.input.as_ref().and_then(|input| input.get(name))
    }

    /// Context entries keyed the way templates see them (`@name`).
    pub fn context_variables(&self) -> Map<String, Value> {
        self.context
            .iter()
            .flatten()
            .map(|(k, v)| (format!("{CONTEXT_PREFIX}{k}"), v.clone()))
            .collect()
    }
}

/// The fully rendered prompt: effective metadata plus the messages to send.
///
/// On the wire the metadata fields sit at the top level next to `messages`.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
pub struct RenderedPrompt {
    #[serde(flatten)]
    pub metadata: PromptMetadata,
    pub messages: Vec<Message>,
}

impl RenderedPrompt {
    pub fn new(metadata: PromptMetadata, messages: Vec<Message>) -> Self {
        Self { metadata, messages }
    }

    /// Whether any message still holds a pending placeholder part.
    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(Message::has_pending)
    }
}
