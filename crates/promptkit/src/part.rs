//! Message content parts.
//!
//! A [`Part`] is one unit of content inside a [`Message`](crate::Message) or
//! [`Document`](crate::Document). On the wire a part is a JSON object with
//! exactly one payload key (`text`, `data`, `media`, `toolRequest`,
//! `toolResponse`) plus an optional `metadata` map. A part with no payload is
//! only valid as a *pending* placeholder, marked by `metadata.pending: true`.
//!
//! In Rust the payloads are enum variants, so a part holding two payloads
//! cannot be constructed. Deserialization goes through a flat wire struct
//! and rejects objects that carry zero or several payload keys.

use std::fmt;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, ObjectValidation, Schema, SchemaObject, SubschemaValidation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::PromptError;

/// Free-form metadata attached to parts, messages, documents, and prompts.
pub type Metadata = Map<String, Value>;

/// Metadata key that marks a payload-less part as pending.
pub const PENDING_KEY: &str = "pending";

/// Deserialize a present field as `Some`, so an explicit `null` survives a
/// round trip as `Some(Value::Null)` instead of collapsing into absence.
/// Pair with `#[serde(default)]` so a missing field is still `None`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ── Payloads ───────────────────────────────────────────────────────

/// Reference to media content (image, audio, video, file).
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// URL of the media. May be a `data:` URL.
    pub url: String,
    /// MIME type, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Media {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A request from the model to invoke a tool.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct ToolRequest {
    /// Name of the tool to invoke.
    pub name: String,
    /// Tool input, shaped by the tool's `inputSchema`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub input: Option<Value>,
    /// Correlation id pairing this request with its response.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ToolRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
            reference: None,
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// The result of a tool invocation, sent back to the model.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct ToolResponse {
    /// Name of the tool that produced the output.
    pub name: String,
    /// Tool output, shaped by the tool's `outputSchema`. A tool that
    /// returned `null` is `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub output: Option<Value>,
    /// Correlation id of the originating [`ToolRequest`].
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ToolResponse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: None,
            reference: None,
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// ── Part ───────────────────────────────────────────────────────────

/// Which payload a [`Part`] carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartKind {
    Text,
    Data,
    Media,
    ToolRequest,
    ToolResponse,
    Pending,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Text => write!(f, "text"),
            PartKind::Data => write!(f, "data"),
            PartKind::Media => write!(f, "media"),
            PartKind::ToolRequest => write!(f, "toolRequest"),
            PartKind::ToolResponse => write!(f, "toolResponse"),
            PartKind::Pending => write!(f, "pending"),
        }
    }
}

/// One unit of message or document content.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "PartWire", into = "PartWire")]
pub enum Part {
    Text {
        text: String,
        metadata: Option<Metadata>,
    },
    Data {
        data: Map<String, Value>,
        metadata: Option<Metadata>,
    },
    Media {
        media: Media,
        metadata: Option<Metadata>,
    },
    ToolRequest {
        tool_request: ToolRequest,
        metadata: Option<Metadata>,
    },
    ToolResponse {
        tool_response: ToolResponse,
        metadata: Option<Metadata>,
    },
    /// Placeholder for content that is not available yet.
    ///
    /// `metadata` holds everything except the pending flag: serialization
    /// always writes `metadata.pending: true`, and deserialization strips
    /// it again, so a pending part round-trips unchanged.
    Pending { metadata: Metadata },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            metadata: None,
        }
    }

    pub fn data(data: Map<String, Value>) -> Self {
        Part::Data {
            data,
            metadata: None,
        }
    }

    pub fn media(media: Media) -> Self {
        Part::Media {
            media,
            metadata: None,
        }
    }

    pub fn tool_request(tool_request: ToolRequest) -> Self {
        Part::ToolRequest {
            tool_request,
            metadata: None,
        }
    }

    pub fn tool_response(tool_response: ToolResponse) -> Self {
        Part::ToolResponse {
            tool_response,
            metadata: None,
        }
    }

    /// A pending placeholder with no other metadata.
    pub fn pending() -> Self {
        Part::Pending {
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry, creating the map if needed.
    ///
    /// Setting `pending` on a pending part is ignored; the flag is implied.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        match &mut self {
            Part::Pending { metadata } => {
                if key != PENDING_KEY {
                    metadata.insert(key, value);
                }
            }
            Part::Text { metadata, .. }
            | Part::Data { metadata, .. }
            | Part::Media { metadata, .. }
            | Part::ToolRequest { metadata, .. }
            | Part::ToolResponse { metadata, .. } => {
                metadata.get_or_insert_with(Metadata::new).insert(key, value);
            }
        }
        self
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Part::Pending { metadata } => Some(metadata),
            Part::Text { metadata, .. }
            | Part::Data { metadata, .. }
            | Part::Media { metadata, .. }
            | Part::ToolRequest { metadata, .. }
            | Part::ToolResponse { metadata, .. } => metadata.as_ref(),
        }
    }

    pub fn kind(&self) -> PartKind {
        match self {
            Part::Text { .. } => PartKind::Text,
            Part::Data { .. } => PartKind::Data,
            Part::Media { .. } => PartKind::Media,
            Part::ToolRequest { .. } => PartKind::ToolRequest,
            Part::ToolResponse { .. } => PartKind::ToolResponse,
            Part::Pending { .. } => PartKind::Pending,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        match self {
            Part::ToolRequest { tool_request, .. } => Some(tool_request),
            _ => None,
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolResponse> {
        match self {
            Part::ToolResponse { tool_response, .. } => Some(tool_response),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Part::Pending { .. })
    }
}

impl From<&str> for Part {
    fn from(text: &str) -> Self {
        Part::text(text)
    }
}

impl From<String> for Part {
    fn from(text: String) -> Self {
        Part::text(text)
    }
}

impl JsonSchema for Part {
    fn schema_name() -> String {
        "Part".to_string()
    }

    /// One alternative per payload, each closed to other keys, plus the
    /// payload-less pending form.
    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        let metadata = generator.subschema_for::<Metadata>();
        let one_of = vec![
            payload_schema("text", generator.subschema_for::<String>(), &metadata),
            payload_schema("data", generator.subschema_for::<Map<String, Value>>(), &metadata),
            payload_schema("media", generator.subschema_for::<Media>(), &metadata),
            payload_schema("toolRequest", generator.subschema_for::<ToolRequest>(), &metadata),
            payload_schema("toolResponse", generator.subschema_for::<ToolResponse>(), &metadata),
            pending_schema(),
        ];
        SchemaObject {
            subschemas: Some(Box::new(SubschemaValidation {
                one_of: Some(one_of),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

fn closed_object(object: ObjectValidation) -> Schema {
    SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        object: Some(Box::new(ObjectValidation {
            additional_properties: Some(Box::new(Schema::Bool(false))),
            ..object
        })),
        ..Default::default()
    }
    .into()
}

fn payload_schema(key: &str, payload: Schema, metadata: &Schema) -> Schema {
    let mut object = ObjectValidation::default();
    object.properties.insert(key.to_string(), payload);
    object.properties.insert("metadata".to_string(), metadata.clone());
    object.required.insert(key.to_string());
    closed_object(object)
}

fn pending_schema() -> Schema {
    let mut flag = ObjectValidation::default();
    flag.properties.insert(
        PENDING_KEY.to_string(),
        SchemaObject {
            const_value: Some(Value::Bool(true)),
            ..Default::default()
        }
        .into(),
    );
    flag.required.insert(PENDING_KEY.to_string());
    let metadata: Schema = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        object: Some(Box::new(flag)),
        ..Default::default()
    }
    .into();

    let mut object = ObjectValidation::default();
    object.properties.insert("metadata".to_string(), metadata);
    object.required.insert("metadata".to_string());
    closed_object(object)
}

// ── Wire form ──────────────────────────────────────────────────────

/// Flat JSON shape of a part: every payload key optional.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PartWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_request: Option<ToolRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_response: Option<ToolResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
}

impl PartWire {
    fn payload_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.text.is_some() {
            keys.push("text");
        }
        if self.data.is_some() {
            keys.push("data");
        }
        if self.media.is_some() {
            keys.push("media");
        }
        if self.tool_request.is_some() {
            keys.push("toolRequest");
        }
        if self.tool_response.is_some() {
            keys.push("toolResponse");
        }
        keys
    }
}

impl TryFrom<PartWire> for Part {
    type Error = PromptError;

    fn try_from(wire: PartWire) -> Result<Self, Self::Error> {
        let keys = wire.payload_keys();
        if keys.len() > 1 {
            return Err(PromptError::InvalidPart(format!(
                "expected exactly one payload, found {}",
                keys.join(", ")
            )));
        }

        let metadata = wire.metadata;
        if let Some(text) = wire.text {
            return Ok(Part::Text { text, metadata });
        }
        if let Some(data) = wire.data {
            return Ok(Part::Data { data, metadata });
        }
        if let Some(media) = wire.media {
            return Ok(Part::Media { media, metadata });
        }
        if let Some(tool_request) = wire.tool_request {
            return Ok(Part::ToolRequest {
                tool_request,
                metadata,
            });
        }
        if let Some(tool_response) = wire.tool_response {
            return Ok(Part::ToolResponse {
                tool_response,
                metadata,
            });
        }

        match metadata {
            Some(mut metadata) if metadata.get(PENDING_KEY) == Some(&Value::Bool(true)) => {
                metadata.remove(PENDING_KEY);
                Ok(Part::Pending { metadata })
            }
            _ => Err(PromptError::InvalidPart(
                "part has no payload and is not marked pending".into(),
            )),
        }
    }
}

impl From<Part> for PartWire {
    fn from(part: Part) -> Self {
        match part {
            Part::Text { text, metadata } => PartWire {
                text: Some(text),
                metadata,
                ..Default::default()
            },
            Part::Data { data, metadata } => PartWire {
                data: Some(data),
                metadata,
                ..Default::default()
            },
            Part::Media { media, metadata } => PartWire {
                media: Some(media),
                metadata,
                ..Default::default()
            },
            Part::ToolRequest {
                tool_request,
                metadata,
            } => PartWire {
                tool_request: Some(tool_request),
                metadata,
                ..Default::default()
            },
            Part::ToolResponse {
                tool_response,
                metadata,
            } => PartWire {
                tool_response: Some(tool_response),
                metadata,
                ..Default::default()
            },
            Part::Pending { mut metadata } => {
                metadata.insert(PENDING_KEY.to_string(), Value::Bool(true));
                PartWire {
                    metadata: Some(metadata),
                    ..Default::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_part_wire_shape() {
        let part = Part::text("hello");
        assert_eq!(serde_json::to_value(&part).unwrap(), json!({"text": "hello"}));
    }

    #[test]
    fn each_payload_deserializes_to_its_variant() {
        let cases = [
            (json!({"text": "hi"}), PartKind::Text),
            (json!({"data": {"k": 1}}), PartKind::Data),
            (
                json!({"media": {"url": "https://x/y.png", "contentType": "image/png"}}),
                PartKind::Media,
            ),
            (
                json!({"toolRequest": {"name": "search", "input": {"q": "rust"}, "ref": "1"}}),
                PartKind::ToolRequest,
            ),
            (
                json!({"toolResponse": {"name": "search", "output": [1, 2]}}),
                PartKind::ToolResponse,
            ),
            (json!({"metadata": {"pending": true}}), PartKind::Pending),
        ];
        for (value, kind) in cases {
            let part: Part = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(part.kind(), kind, "{value}");
        }
    }

    #[test]
    fn two_payloads_rejected() {
        let err = serde_json::from_value::<Part>(json!({"text": "a", "data": {}})).unwrap_err();
        assert!(err.to_string().contains("exactly one payload"), "{err}");
    }

    #[test]
    fn empty_part_rejected() {
        assert!(serde_json::from_value::<Part>(json!({})).is_err());
        assert!(serde_json::from_value::<Part>(json!({"metadata": {"pending": false}})).is_err());
        assert!(serde_json::from_value::<Part>(json!({"metadata": {"source": "x"}})).is_err());
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(serde_json::from_value::<Part>(json!({"text": "a", "extra": 1})).is_err());
    }

    #[test]
    fn tool_request_uses_ref_key() {
        let part = Part::tool_request(
            ToolRequest::new("lookup")
                .with_input(json!({"id": 7}))
                .with_ref("call-1"),
        );
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["toolRequest"]["ref"], "call-1");
        assert!(value["toolRequest"].get("reference").is_none());
        assert_eq!(part.as_tool_request().unwrap().name, "lookup");
    }

    #[test]
    fn pending_always_serializes_flag() {
        let part = Part::Pending {
            metadata: Metadata::new(),
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value, json!({"metadata": {"pending": true}}));
    }

    #[test]
    fn pending_keeps_extra_metadata_and_flag() {
        let part = Part::pending()
            .with_metadata("reason", json!("awaiting upload"))
            .with_metadata(PENDING_KEY, json!(false));
        assert!(part.is_pending());
        let meta = part.metadata().unwrap();
        assert_eq!(meta["reason"], "awaiting upload");
        assert!(!meta.contains_key(PENDING_KEY));

        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({"metadata": {"pending": true, "reason": "awaiting upload"}})
        );
    }

    #[test]
    fn pending_round_trips_equal() {
        let part = Part::Pending {
            metadata: Metadata::new(),
        };
        let back: Part = serde_json::from_value(serde_json::to_value(&part).unwrap()).unwrap();
        assert_eq!(back, part);
        assert_eq!(back, Part::pending());
    }

    #[test]
    fn explicit_null_output_survives_round_trip() {
        let value = json!({"toolResponse": {"name": "t", "output": null}});
        let part: Part = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(part.as_tool_response().unwrap().output, Some(Value::Null));
        assert_eq!(serde_json::to_value(&part).unwrap(), value);

        let value = json!({"toolRequest": {"name": "t", "input": null}});
        let part: Part = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&part).unwrap(), value);

        let absent: Part = serde_json::from_value(json!({"toolResponse": {"name": "t"}})).unwrap();
        assert_eq!(absent.as_tool_response().unwrap().output, None);
    }

    #[test]
    fn schema_has_one_closed_alternative_per_form() {
        let schema = crate::json_schema_for::<Part>();
        let one_of = schema["oneOf"].as_array().unwrap();
        assert_eq!(one_of.len(), 6);
        for alt in one_of {
            assert_eq!(alt["additionalProperties"], json!(false), "{alt}");
            assert_eq!(alt["required"].as_array().unwrap().len(), 1, "{alt}");
        }
        let required: Vec<&str> = one_of
            .iter()
            .map(|alt| alt["required"][0].as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["text", "data", "media", "toolRequest", "toolResponse", "metadata"]
        );
        assert_eq!(one_of[5]["properties"]["metadata"]["properties"]["pending"]["const"], true);
    }

    #[test]
    fn metadata_survives_round_trip() {
        let part = Part::media(Media::new("gs://bucket/a.wav").with_content_type("audio/wav"))
            .with_metadata("duration", json!(3.5));
        let back: Part = serde_json::from_str(&serde_json::to_string(&part).unwrap()).unwrap();
        assert_eq!(back, part);
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let part = Part::tool_response(ToolResponse::new("noop"));
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value, json!({"toolResponse": {"name": "noop"}}));
    }
}
