//! End-to-end rendering through `FnPrompt` with a toy substitution engine.

use std::sync::Arc;

use promptkit::prelude::*;
use promptkit::store::LoadOptions;
use promptkit::{CONTEXT_PREFIX, PromptError};
use schemars::JsonSchema;
use serde_json::{Map, Value, json};

/// Replace `{{key}}` with input values and `{{@key}}` with context values.
fn substitute(template: &str, data: &DataArgument) -> String {
    let mut vars: Map<String, Value> = data.input.clone().unwrap_or_default();
    vars.extend(data.context_variables());
    let mut out = template.to_string();
    for (key, value) in vars {
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        out = out.replace(&format!("{{{{{key}}}}}"), &text);
    }
    out
}

fn engine_prompt(metadata: PromptMetadata, template: &str) -> FnPrompt {
    FnPrompt::new(
        ParsedPrompt::new(metadata, template),
        |req: RenderRequest| async move {
            Ok(vec![Message::user(substitute(&req.template, &req.data))])
        },
    )
}

#[derive(JsonSchema)]
#[allow(dead_code)]
struct Ticket {
    id: u64,
    subject: String,
}

#[tokio::test]
async fn hello_ana() {
    let prompt = engine_prompt(PromptMetadata::default(), "Hello {{name}}");
    let rendered = prompt
        .render(DataArgument::new().with_input("name", json!("Ana")), None)
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&rendered.messages).unwrap(),
        json!([{"role": "user", "content": [{"text": "Hello Ana"}]}])
    );
}

#[tokio::test]
async fn stored_source_renders_with_defaults_and_context() {
    let store = MemoryStore::new().with_prompt(
        "welcome",
        Some("vip"),
        "Welcome {{name}} ({{tier}}) via {{@channel}}",
    );
    let data = store
        .load("welcome", LoadOptions::variant("vip"))
        .await
        .unwrap();

    let metadata = PromptMetadata::default()
        .with_name(data.prompt_ref.name.clone())
        .with_variant("vip")
        .with_input(InputSpec {
            default: Some(
                [("tier".to_string(), json!("gold"))]
                    .into_iter()
                    .collect(),
            ),
            schema: None,
        });
    let prompt = engine_prompt(metadata, &data.source);

    let rendered = prompt
        .render(
            DataArgument::new()
                .with_input("name", json!("Bo"))
                .with_context("channel", json!("sms")),
            None,
        )
        .await
        .unwrap();
    assert_eq!(rendered.messages[0].text(), "Welcome Bo (gold) via sms");
    assert_eq!(rendered.metadata.variant.as_deref(), Some("vip"));
    assert_eq!(CONTEXT_PREFIX, "@");
}

#[tokio::test]
async fn overrides_tools_and_schemas_flow_into_output() {
    let lookups = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = lookups.clone();
    let tools = FnToolResolver::new(move |name: String| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            (name == "lookupTicket" || name == "escalate")
                .then(|| ToolDefinition::new(name, json!({"type": "object"})))
        }
    });
    let schemas = SchemaRegistry::new().with_type::<Ticket>("Ticket");

    let metadata = PromptMetadata::default()
        .with_name("triage")
        .with_model("a/base")
        .with_tool("lookupTicket")
        .with_tool("escalate")
        .with_tool_def(
            ToolDefinition::new("escalate", json!({"type": "object"}))
                .with_description("inline wins"),
        )
        .with_config("temperature", json!(0.2))
        .with_input(InputSpec {
            default: None,
            schema: Some(json!("Ticket")),
        });

    let prompt = engine_prompt(metadata, "Triage {{subject}}")
        .with_tool_resolver(tools)
        .with_schema_resolver(schemas);

    let overrides = PromptMetadata::default()
        .with_model("b/override")
        .with_config("maxOutputTokens", json!(256));
    let rendered = prompt
        .render(
            DataArgument::new().with_input("subject", json!("refund")),
            Some(overrides),
        )
        .await
        .unwrap();

    let meta = &rendered.metadata;
    assert_eq!(meta.model.as_deref(), Some("b/override"));
    assert_eq!(
        meta.config.as_ref().unwrap().get("temperature"),
        Some(&json!(0.2))
    );
    assert_eq!(
        meta.config.as_ref().unwrap().get("maxOutputTokens"),
        Some(&json!(256))
    );
    assert_eq!(meta.tools, None);

    let defs = meta.tool_defs.as_ref().unwrap();
    let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["escalate", "lookupTicket"]);
    assert_eq!(defs[0].description.as_deref(), Some("inline wins"));
    assert_eq!(lookups.load(std::sync::atomic::Ordering::SeqCst), 1);

    let schema = meta.input.as_ref().unwrap().schema.as_ref().unwrap();
    assert!(schema["properties"]["subject"].is_object());
    assert_eq!(rendered.messages[0].text(), "Triage refund");
}

#[tokio::test]
async fn unknown_tool_fails_before_engine_runs() {
    let prompt = FnPrompt::new(
        ParsedPrompt::new(PromptMetadata::default().with_tool("missing"), ""),
        |_req: RenderRequest| async move {
            Err::<Vec<Message>, _>(PromptError::Render("engine must not run".into()))
        },
    )
    .with_tool_resolver(ToolRegistry::new());

    let err = prompt.render(DataArgument::new(), None).await.unwrap_err();
    assert!(matches!(err, PromptError::ToolNotFound(ref n) if n == "missing"));
}

#[tokio::test]
async fn engine_errors_propagate() {
    let prompt = FnPrompt::new(
        ParsedPrompt::new(PromptMetadata::default(), "{{#if}}"),
        |_req: RenderRequest| async move {
            Err::<Vec<Message>, _>(PromptError::Render("unclosed block".into()))
        },
    );
    let err = prompt.render(DataArgument::new(), None).await.unwrap_err();
    assert_eq!(err.to_string(), "render failed: unclosed block");
}

#[tokio::test]
async fn compiled_prompts_are_object_safe() {
    let prompts: Vec<Box<dyn CompiledPrompt>> = vec![
        Box::new(engine_prompt(PromptMetadata::default().with_name("a"), "A {{x}}")),
        Box::new(engine_prompt(PromptMetadata::default().with_name("b"), "B {{x}}")),
    ];
    let mut texts = Vec::new();
    for prompt in &prompts {
        let rendered = prompt
            .render(DataArgument::new().with_input("x", json!(1)), None)
            .await
            .unwrap();
        texts.push(rendered.messages[0].text());
    }
    assert_eq!(texts, vec!["A 1", "B 1"]);
    assert_eq!(prompts[1].prompt().metadata.name.as_deref(), Some("b"));
}
