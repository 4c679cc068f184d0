//! Prompt metadata and tool definitions.
//!
//! [`PromptMetadata`] is the declarative configuration of a prompt: which
//! model it targets, which tools it may call, opaque model configuration,
//! input defaults and schema, and the expected output format. Almost every
//! field is optional; absent fields are omitted from the JSON form.
//!
//! Schemas and model configuration are kept as untyped JSON. Their shape
//! belongs to the model provider or schema library in use.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::part::Metadata;

/// Opaque, model-specific configuration (temperature, max tokens, ...).
pub type ModelConfig = Map<String, Value>;

// ── ToolDefinition ─────────────────────────────────────────────────

/// A named capability the model may invoke.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name, unique within a registry.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the tool input.
    pub input_schema: Value,
    /// JSON Schema of the tool output.
    #[serde(
        default,
        deserialize_with = "crate::part::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub output_schema: Option<Value>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema,
            output_schema: None,
        }
    }

    /// Create a definition whose input schema is derived from a Rust type.
    ///
    /// ```
    /// use promptkit::ToolDefinition;
    /// use schemars::JsonSchema;
    ///
    /// #[derive(JsonSchema)]
    /// #[allow(dead_code)]
    /// struct WeatherArgs {
    ///     city: String,
    /// }
    ///
    /// let def = ToolDefinition::for_input::<WeatherArgs>("weather");
    /// assert_eq!(def.input_schema["type"], "object");
    /// ```
    pub fn for_input<T: JsonSchema>(name: impl Into<String>) -> Self {
        Self::new(name, crate::json_schema_for::<T>())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

// ── Input / output ─────────────────────────────────────────────────

/// Input configuration: default values and the input schema.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
pub struct InputSpec {
    /// Values used for input variables the caller does not supply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Map<String, Value>>,
    /// Schema of the input variables, or the name of a registered schema.
    #[serde(
        default,
        deserialize_with = "crate::part::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<Value>,
}

/// Requested output format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputFormat {
    Json,
    Text,
    Other(String),
}

impl From<String> for OutputFormat {
    fn from(s: String) -> Self {
        match s.as_str() {
            "json" => OutputFormat::Json,
            "text" => OutputFormat::Text,
            _ => OutputFormat::Other(s),
        }
    }
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        OutputFormat::from(s.to_string())
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => "json".to_string(),
            OutputFormat::Text => "text".to_string(),
            OutputFormat::Other(s) => s,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Other(s) => write!(f, "{s}"),
        }
    }
}

impl JsonSchema for OutputFormat {
    fn schema_name() -> String {
        "OutputFormat".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        String::json_schema(generator)
    }
}

/// Output configuration: format tag and output schema.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
pub struct OutputSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    /// Schema of the structured output, or the name of a registered schema.
    #[serde(
        default,
        deserialize_with = "crate::part::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<Value>,
}

// ── PromptMetadata ─────────────────────────────────────────────────

/// Declarative configuration describing how a prompt is rendered.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target model identifier, e.g. `"googleai/gemini-2.0-flash"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tools referenced by name; resolved through a
    /// [`ToolResolver`](crate::resolve::ToolResolver).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    /// Tools defined inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_defs: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ModelConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSpec>,
    /// The unprocessed frontmatter the metadata was built from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Map<String, Value>>,
    /// Namespaced extension fields, keyed by namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<BTreeMap<String, Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl PromptMetadata {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Reference a tool by name (appended to `tools`).
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    /// Add an inline tool definition (appended to `toolDefs`).
    pub fn with_tool_def(mut self, def: ToolDefinition) -> Self {
        self.tool_defs.get_or_insert_with(Vec::new).push(def);
        self
    }

    /// Set a single model configuration entry.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config
            .get_or_insert_with(ModelConfig::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_input(mut self, input: InputSpec) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_output(mut self, output: OutputSpec) -> Self {
        self.output = Some(output);
        self
    }

    /// Merge `overrides` on top of `self`.
    ///
    /// Scalar and list fields take the override when it is present. The
    /// `config`, `raw`, `metadata`, and `ext` maps are merged key by key with
    /// override keys winning; `input` and `output` merge per sub-field, and
    /// `input.default` merges key by key.
    pub fn merge(&self, overrides: &PromptMetadata) -> PromptMetadata {
        PromptMetadata {
            name: pick(&overrides.name, &self.name),
            variant: pick(&overrides.variant, &self.variant),
            version: pick(&overrides.version, &self.version),
            description: pick(&overrides.description, &self.description),
            model: pick(&overrides.model, &self.model),
            tools: pick(&overrides.tools, &self.tools),
            tool_defs: pick(&overrides.tool_defs, &self.tool_defs),
            config: merge_maps(&self.config, &overrides.config),
            input: merge_input(&self.input, &overrides.input),
            output: merge_output(&self.output, &overrides.output),
            raw: merge_maps(&self.raw, &overrides.raw),
            ext: match (&self.ext, &overrides.ext) {
                (None, None) => None,
                (base, over) => {
                    let mut merged = base.clone().unwrap_or_default();
                    merged.extend(over.iter().flatten().map(|(k, v)| (k.clone(), v.clone())));
                    Some(merged)
                }
            },
            metadata: merge_maps(&self.metadata, &overrides.metadata),
        }
    }

    /// Names listed in `tools`, in order.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().flatten().map(String::as_str)
    }
}

fn pick<T: Clone>(over: &Option<T>, base: &Option<T>) -> Option<T> {
    over.clone().or_else(|| base.clone())
}

fn merge_maps(
    base: &Option<Map<String, Value>>,
    over: &Option<Map<String, Value>>,
) -> Option<Map<String, Value>> {
    match (base, over) {
        (None, None) => None,
        (base, over) => {
            let mut merged = base.clone().unwrap_or_default();
            if let Some(over) = over {
                merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(merged)
        }
    }
}

fn merge_input(base: &Option<InputSpec>, over: &Option<InputSpec>) -> Option<InputSpec> {
    match (base, over) {
        (None, None) => None,
        (base, over) => {
            let empty = InputSpec::default();
            let base = base.as_ref().unwrap_or(&empty);
            let over = over.as_ref().unwrap_or(&empty);
            Some(InputSpec {
                default: merge_maps(&base.default, &over.default),
                schema: pick(&over.schema, &base.schema),
            })
        }
    }
}

fn merge_output(base: &Option<OutputSpec>, over: &Option<OutputSpec>) -> Option<OutputSpec> {
    match (base, over) {
        (None, None) => None,
        (base, over) => {
            let empty = OutputSpec::default();
            let base = base.as_ref().unwrap_or(&empty);
            let over = over.as_ref().unwrap_or(&empty);
            Some(OutputSpec {
                format: pick(&over.format, &base.format),
                schema: pick(&over.schema, &base.schema),
            })
        }
    }
}
