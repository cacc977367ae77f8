//! Prompt registration and dispatch.

use serde_json::{Map, Value};

use crate::store::SharedStore;
use crate::types::{McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult};

use super::{greeting, summarize_notes};

pub struct PromptRegistry;

impl PromptRegistry {
    pub fn list_prompts() -> Vec<PromptDefinition> {
        vec![
            PromptDefinition {
                name: "greeting".to_string(),
                description: Some("A customizable greeting message".to_string()),
                arguments: Some(vec![
                    PromptArgument {
                        name: "name".to_string(),
                        description: Some("Name of the person to greet".to_string()),
                        required: true,
                    },
                    PromptArgument {
                        name: "style".to_string(),
                        description: Some(
                            "Style of greeting (formal, casual, enthusiastic)".to_string(),
                        ),
                        required: false,
                    },
                ]),
            },
            PromptDefinition {
                name: "summarize_notes".to_string(),
                description: Some("Creates a prompt to summarize stored notes".to_string()),
                arguments: Some(vec![PromptArgument {
                    name: "max_notes".to_string(),
                    description: Some("Maximum number of notes to include".to_string()),
                    required: false,
                }]),
            },
        ]
    }

    pub fn contains(name: &str) -> bool {
        Self::list_prompts().iter().any(|p| p.name == name)
    }

    pub async fn get(
        name: &str,
        arguments: Option<Value>,
        store: &SharedStore,
    ) -> McpResult<PromptGetResult> {
        let args = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(Value::Object(map)) => Value::Object(map),
            Some(_) => {
                return Err(McpError::InvalidParams(
                    "Prompt arguments must be an object".to_string(),
                ))
            }
        };

        match name {
            "greeting" => greeting::expand(&args),
            "summarize_notes" => summarize_notes::expand(&args, store).await,
            _ => Err(McpError::PromptNotFound(name.to_string())),
        }
    }
}

/// Read a prompt argument as text. Numbers and booleans are accepted as-is.
pub(crate) fn string_arg(args: &Value, name: &str) -> Option<String> {
    match args.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::shared_store;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_prompt() {
        let err = PromptRegistry::get("nope", None, &shared_store())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Prompt not found: nope");
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn test_summarize_reads_store() {
        let store = shared_store();
        store
            .lock()
            .await
            .add_note("buy milk", vec!["todo".into()])
            .unwrap();
        let result = PromptRegistry::get("summarize_notes", Some(json!({"max_notes": "5"})), &store)
            .await
            .unwrap();
        let text = serde_json::to_value(&result.messages[0].content).unwrap();
        assert_eq!(
            text["text"],
            "Please summarize these notes:\n\n- buy milk (tags: todo)"
        );
    }

    #[tokio::test]
    async fn test_summarize_empty() {
        let result = PromptRegistry::get("summarize_notes", None, &shared_store())
            .await
            .unwrap();
        let text = serde_json::to_value(&result.messages[0].content).unwrap();
        assert!(text["text"].as_str().unwrap().ends_with("No notes available."));
    }
}
