//! Stored and compiled prompts.
//!
//! [`PromptData`] is a prompt as it sits in a [`PromptStore`](crate::store::PromptStore):
//! a reference plus raw source text. [`ParsedPrompt`] is metadata plus the
//! template body. A [`CompiledPrompt`] is the callable that turns a
//! [`DataArgument`] into a [`RenderedPrompt`].
//!
//! The template engine itself is supplied by the caller. [`FnPrompt`] wraps
//! an engine closure and does the surrounding work: metadata merging, tool
//! and schema resolution, and input defaults.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::message::Message;
use crate::metadata::PromptMetadata;
use crate::render::{DataArgument, RenderedPrompt};
use crate::resolve::{SchemaResolver, ToolResolver, resolve_schemas, resolve_tools};

// ── References and records ─────────────────────────────────────────

/// Identifies a stored prompt or partial.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct PromptRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Content hash of the source; see [`source_version`](crate::store::source_version).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PromptRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: None,
            version: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for PromptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}.{variant}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A stored prompt: its reference plus raw source text.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq)]
pub struct PromptData {
    #[serde(flatten)]
    pub prompt_ref: PromptRef,
    pub source: String,
}

impl PromptData {
    pub fn new(prompt_ref: PromptRef, source: impl Into<String>) -> Self {
        Self {
            prompt_ref,
            source: source.into(),
        }
    }
}

/// Partials share the prompt reference shape.
pub type PartialRef = PromptRef;
/// Partials share the stored prompt shape.
pub type PartialData = PromptData;

/// Prompt metadata together with its template body.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
pub struct ParsedPrompt {
    #[serde(flatten)]
    pub metadata: PromptMetadata,
    pub template: String,
}

impl ParsedPrompt {
    pub fn new(metadata: PromptMetadata, template: impl Into<String>) -> Self {
        Self {
            metadata,
            template: template.into(),
        }
    }
}

// ── CompiledPrompt ─────────────────────────────────────────────────

/// Boxed future returned by [`CompiledPrompt::render`].
pub type PromptFuture<'a> = Pin<Box<dyn Future<Output = Result<RenderedPrompt>> + Send + 'a>>;

/// A template bound to its metadata, reduced to a single render call.
///
/// `options` carries caller overrides; they take precedence over the
/// prompt's own metadata as described in [`PromptMetadata::merge`].
pub trait CompiledPrompt: Send + Sync {
    /// The parsed prompt this callable was compiled from.
    fn prompt(&self) -> &ParsedPrompt;

    /// Render the prompt for `data`.
    fn render(&self, data: DataArgument, options: Option<PromptMetadata>) -> PromptFuture<'_>;
}

/// What an engine receives for one render: the template, the effective
/// metadata, and the input with defaults applied.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub template: String,
    pub metadata: PromptMetadata,
    pub data: DataArgument,
}

/// Type-erased async engine for [`FnPrompt`].
type ErasedEngine = Box<
    dyn Fn(RenderRequest) -> Pin<Box<dyn Future<Output = Result<Vec<Message>>> + Send>>
        + Send
        + Sync,
>;

/// A [`CompiledPrompt`] backed by an engine closure.
///
/// # Example
///
/// ```
/// use promptkit::prelude::*;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let prompt = FnPrompt::new(
///     ParsedPrompt::new(PromptMetadata::default().with_model("echo"), "ignored"),
///     |req: RenderRequest| async move { Ok(vec![Message::user(req.template)]) },
/// );
/// let rendered = prompt.render(DataArgument::new(), None).await.unwrap();
/// assert_eq!(rendered.metadata.model.as_deref(), Some("echo"));
/// assert_eq!(rendered.messages[0].text(), "ignored");
/// # });
/// ```
pub struct FnPrompt {
    prompt: ParsedPrompt,
    engine: ErasedEngine,
    tool_resolver: Option<Arc<dyn ToolResolver>>,
    schema_resolver: Option<Arc<dyn SchemaResolver>>,
}

impl FnPrompt {
    pub fn new<F, Fut>(prompt: ParsedPrompt, engine: F) -> Self
    where
        F: Fn(RenderRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Message>>> + Send + 'static,
    {
        let erased = move |request: RenderRequest| -> Pin<
            Box<dyn Future<Output = Result<Vec<Message>>> + Send>,
        > { Box::pin(engine(request)) };
        Self {
            prompt,
            engine: Box::new(erased),
            tool_resolver: None,
            schema_resolver: None,
        }
    }

    /// Resolve `tools` names through `resolver` before rendering.
    pub fn with_tool_resolver(self, resolver: impl ToolResolver + 'static) -> Self {
        self.with_shared_tool_resolver(Arc::new(resolver))
    }

    pub fn with_shared_tool_resolver(mut self, resolver: Arc<dyn ToolResolver>) -> Self {
        self.tool_resolver = Some(resolver);
        self
    }

    /// Resolve named schema references through `resolver` before rendering.
    pub fn with_schema_resolver(self, resolver: impl SchemaResolver + 'static) -> Self {
        self.with_shared_schema_resolver(Arc::new(resolver))
    }

    pub fn with_shared_schema_resolver(mut self, resolver: Arc<dyn SchemaResolver>) -> Self {
        self.schema_resolver = Some(resolver);
        self
    }

    async fn render_inner(
        &self,
        data: DataArgument,
        options: Option<PromptMetadata>,
    ) -> Result<RenderedPrompt> {
        let label = self.prompt.metadata.name.as_deref().unwrap_or("(anonymous)");
        debug!(
            "Rendering prompt {label}: overrides={}, tool_resolver={}, schema_resolver={}",
            options.is_some(),
            self.tool_resolver.is_some(),
            self.schema_resolver.is_some(),
        );

        let mut metadata = match &options {
            Some(overrides) => self.prompt.metadata.merge(overrides),
            None => self.prompt.metadata.clone(),
        };
        if let Some(resolver) = &self.tool_resolver {
            metadata = resolve_tools(metadata, &**resolver).await?;
        }
        if let Some(resolver) = &self.schema_resolver {
            metadata = resolve_schemas(metadata, &**resolver).await?;
        }
        let data = data.with_defaults(metadata.input.as_ref());

        let request = RenderRequest {
            template: self.prompt.template.clone(),
            metadata: metadata.clone(),
            data,
        };
        let messages = (self.engine)(request).await?;
        debug!("Rendered prompt {label}: {} message(s)", messages.len());

        Ok(RenderedPrompt::new(metadata, messages))
    }
}

impl CompiledPrompt for FnPrompt {
    fn prompt(&self) -> &ParsedPrompt {
        &self.prompt
    }

    fn render(&self, data: DataArgument, options: Option<PromptMetadata>) -> PromptFuture<'_> {
        Box::pin(self.render_inner(data, options))
    }
}

impl fmt::Debug for FnPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPrompt")
            .field("name", &self.prompt.metadata.name)
            .field("tool_resolver", &self.tool_resolver.is_some())
            .field("schema_resolver", &self.schema_resolver.is_some())
            .finish()
    }
}
