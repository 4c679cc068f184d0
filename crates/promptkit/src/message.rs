//! Conversation messages and reference documents.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::part::{Metadata, Part};

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Tool,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
            Role::Tool => write!(f, "tool"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A message in the conversation: a role and its ordered content parts.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Message {
    pub fn new(role: Role, content: Vec<Part>) -> Self {
        Self {
            role,
            content,
            metadata: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Part::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// A tool-role message carrying the given tool responses.
    pub fn tool(parts: Vec<Part>) -> Self {
        Self::new(Role::Tool, parts)
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Concatenate the text of every text part, in order.
    pub fn text(&self) -> String {
        concat_text(&self.content)
    }

    /// Whether any part is still a pending placeholder.
    pub fn has_pending(&self) -> bool {
        self.content.iter().any(Part::is_pending)
    }
}

/// Retrieved or reference content, independent of any conversational role.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
pub struct Document {
    pub content: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Document {
    pub fn new(content: Vec<Part>) -> Self {
        Self {
            content,
            metadata: None,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Part::text(text)])
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn text(&self) -> String {
        concat_text(&self.content)
    }
}

fn concat_text(parts: &[Part]) -> String {
    parts.iter().filter_map(Part::as_text).collect()
}
