//! Inspect stored prompts and check contract documents.
//!
//! # Examples
//!
//! ```sh
//! # List prompts (or partials) in a prompt directory
//! promptkit list --dir prompts
//! promptkit list --dir prompts --partials
//!
//! # Print a prompt source, optionally a specific variant
//! promptkit show --dir prompts greeting --variant formal
//!
//! # Check that a JSON document matches a contract type
//! promptkit check rendered output.json
//! cat part.json | promptkit check part -
//!
//! # Print the JSON Schema of a contract type
//! promptkit schema metadata
//!
//! # Verbose logging to stderr
//! RUST_LOG=promptkit=debug promptkit list --dir prompts
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use promptkit::store::{DirStore, DirStoreConfig, ListOptions, LoadOptions, PromptStore};
use promptkit::{
    DataArgument, Message, Part, PromptError, PromptMetadata, RenderedPrompt, ToolDefinition,
    json_schema_for,
};
use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inspect stored prompts and check contract documents.
#[derive(Parser)]
#[command(name = "promptkit", version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "promptkit=trace").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List prompts stored in a directory.
    List {
        /// Prompt directory.
        #[arg(long, default_value = "prompts")]
        dir: PathBuf,

        /// List partials instead of prompts.
        #[arg(long)]
        partials: bool,

        /// Source file extension.
        #[arg(long, default_value = "prompt")]
        extension: String,
    },

    /// Print the source of a stored prompt.
    Show {
        /// Prompt directory.
        #[arg(long, default_value = "prompts")]
        dir: PathBuf,

        /// Prompt name, with `/` separating subdirectories.
        name: String,

        /// Variant to load instead of the default.
        #[arg(long)]
        variant: Option<String>,

        /// Fail unless the source has this content version.
        #[arg(long)]
        version: Option<String>,

        /// Load a partial instead of a prompt.
        #[arg(long)]
        partial: bool,

        /// Source file extension.
        #[arg(long, default_value = "prompt")]
        extension: String,
    },

    /// Parse a JSON document as a contract type and summarize it.
    Check {
        /// Contract type to parse as.
        kind: Kind,

        /// JSON file, or `-` for stdin.
        file: String,
    },

    /// Print the JSON Schema of a contract type.
    Schema {
        /// Contract type.
        kind: Kind,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Rendered,
    Message,
    Part,
    Tool,
    Data,
    Metadata,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), PromptError> {
    match command {
        Command::List {
            dir,
            partials,
            extension,
        } => {
            let store = store_for(dir, extension);
            let page = if partials {
                store.list_partials(ListOptions::default()).await?
            } else {
                store.list(ListOptions::default()).await?
            };
            for item in page.items {
                println!("{item} {}", item.version.as_deref().unwrap_or("-"));
            }
        }
        Command::Show {
            dir,
            name,
            variant,
            version,
            partial,
            extension,
        } => {
            let store = store_for(dir, extension);
            let options = LoadOptions {
                variant,
                version,
            };
            let data = if partial {
                store.load_partial(&name, options).await?
            } else {
                store.load(&name, options).await?
            };
            debug!(
                "Loaded {} (version {})",
                data.prompt_ref,
                data.prompt_ref.version.as_deref().unwrap_or("-")
            );
            print!("{}", data.source);
            if !data.source.ends_with('\n') {
                println!();
            }
        }
        Command::Check { kind, file } => {
            let text = read_input(&file).await?;
            println!("{}", check(kind, &text)?);
        }
        Command::Schema { kind } => {
            let schema = schema(kind);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

fn store_for(dir: PathBuf, extension: String) -> DirStore {
    DirStore::new(DirStoreConfig::new(dir).with_extension(extension))
}

async fn read_input(file: &str) -> Result<String, PromptError> {
    if file == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    } else {
        Ok(tokio::fs::read_to_string(file).await?)
    }
}

fn parse<T: DeserializeOwned>(text: &str) -> Result<T, PromptError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse `text` as `kind` and describe what was found.
fn check(kind: Kind, text: &str) -> Result<String, PromptError> {
    let summary = match kind {
        Kind::Rendered => {
            let rendered: RenderedPrompt = parse(text)?;
            let tools = rendered.metadata.tool_defs.as_ref().map_or(0, Vec::len);
            format!(
                "rendered prompt: {} message(s), model {}, {tools} tool definition(s){}",
                rendered.messages.len(),
                rendered.metadata.model.as_deref().unwrap_or("-"),
                if rendered.has_pending() { ", pending" } else { "" },
            )
        }
        Kind::Message => {
            let message: Message = parse(text)?;
            format!(
                "message: role {}, parts [{}]",
                message.role,
                part_kinds(&message.content)
            )
        }
        Kind::Part => {
            let part: Part = parse(text)?;
            format!("part: {}", part.kind())
        }
        Kind::Tool => {
            let tool: ToolDefinition = parse(text)?;
            format!(
                "tool: {}{}",
                tool.name,
                if tool.output_schema.is_some() {
                    " (with output schema)"
                } else {
                    ""
                }
            )
        }
        Kind::Data => {
            let data: DataArgument = parse(text)?;
            format!(
                "data: {} input(s), {} doc(s), {} message(s), {} context item(s)",
                data.input.as_ref().map_or(0, |m| m.len()),
                data.docs.as_ref().map_or(0, Vec::len),
                data.messages.as_ref().map_or(0, Vec::len),
                data.context.as_ref().map_or(0, |m| m.len()),
            )
        }
        Kind::Metadata => {
            let metadata: PromptMetadata = parse(text)?;
            let tools: Vec<&str> = metadata.tool_names().collect();
            format!(
                "metadata: name {}, model {}, tools [{}]",
                metadata.name.as_deref().unwrap_or("-"),
                metadata.model.as_deref().unwrap_or("-"),
                tools.join(", ")
            )
        }
    };
    Ok(summary)
}

fn part_kinds(parts: &[Part]) -> String {
    parts
        .iter()
        .map(|p| p.kind().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn schema(kind: Kind) -> serde_json::Value {
    match kind {
        Kind::Rendered => json_schema_for::<RenderedPrompt>(),
        Kind::Message => json_schema_for::<Message>(),
        Kind::Part => json_schema_for::<Part>(),
        Kind::Tool => json_schema_for::<ToolDefinition>(),
        Kind::Data => json_schema_for::<DataArgument>(),
        Kind::Metadata => json_schema_for::<PromptMetadata>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_message_lists_part_kinds() {
        let text = r#"{"role":"model","content":[{"text":"hi"},{"toolRequest":{"name":"t"}}]}"#;
        let summary = check(Kind::Message, text).unwrap();
        assert_eq!(summary, "message: role model, parts [text, toolRequest]");
    }

    #[test]
    fn check_rejects_ambiguous_part() {
        let err = check(Kind::Part, r#"{"text":"a","media":{"url":"u"}}"#).unwrap_err();
        assert!(matches!(err, PromptError::Json(_)));
    }

    #[test]
    fn check_rendered_requires_messages() {
        assert!(check(Kind::Rendered, r#"{"model":"m"}"#).is_err());
        let summary = check(Kind::Rendered, r#"{"model":"m","messages":[]}"#).unwrap();
        assert!(summary.starts_with("rendered prompt: 0 message(s), model m"));
    }

    #[tokio::test]
    async fn store_for_lists_and_loads_custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.hbs"), "{{text}}").unwrap();

        let store = store_for(dir.path().to_path_buf(), "hbs".to_string());
        let page = store.list(ListOptions::default()).await.unwrap();
        assert_eq!(page.items[0].name, "summary");
        let data = store
            .load(&page.items[0].name, LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(data.source, "{{text}}");
    }

    #[test]
    fn show_accepts_extension() {
        let cli = Cli::try_parse_from([
            "promptkit", "show", "--dir", "p", "summary", "--extension", "hbs",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Show { ref extension, .. } if extension == "hbs"));
    }

    #[test]
    fn schema_for_every_kind_is_an_object() {
        for kind in Kind::value_variants() {
            assert!(schema(*kind).is_object(), "{kind:?}");
        }
    }
}
