//! Error type shared by resolution, rendering, and storage.
//!
//! Resolvers report "not found" as `None`; the functions that *require* a
//! lookup to succeed turn that into the matching [`PromptError`] variant.

use thiserror::Error;

/// Errors produced while preparing, rendering, or storing prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    /// A tool named in `tools` could not be resolved to a definition.
    #[error("unable to resolve tool '{0}' to a recognized tool definition")]
    ToolNotFound(String),

    /// A named schema reference could not be resolved.
    #[error("unable to resolve schema '{0}'")]
    SchemaNotFound(String),

    /// No stored prompt matches the requested name/variant.
    #[error("prompt '{0}' not found")]
    PromptNotFound(String),

    /// No stored partial matches the requested name.
    #[error("partial '{0}' not found")]
    PartialNotFound(String),

    /// A prompt was found but its content hash differs from the requested version.
    #[error("version mismatch for '{name}': requested {requested}, found {found}")]
    VersionMismatch {
        name: String,
        requested: String,
        found: String,
    },

    /// A prompt or partial name that cannot be mapped onto storage.
    #[error("invalid prompt name '{0}'")]
    InvalidName(String),

    /// A pagination cursor that this store did not issue.
    #[error("invalid list cursor '{0}'")]
    InvalidCursor(String),

    /// A part whose payload fields violate the one-payload rule.
    #[error("invalid part: {0}")]
    InvalidPart(String),

    /// Failure reported by the external rendering engine.
    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = PromptError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_subject() {
        let err = PromptError::ToolNotFound("search".into());
        assert!(err.to_string().contains("'search'"));

        let err = PromptError::VersionMismatch {
            name: "greet".into(),
            requested: "abc".into(),
            found: "def".into(),
        };
        assert_eq!(
            err.to_string(),
            "version mismatch for 'greet': requested abc, found def"
        );
    }

    #[test]
    fn io_errors_convert() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(PromptError::Io(_))));
    }
}
