//! Argument completion for prompts and resource templates.

use crate::store::SharedStore;
use crate::types::{CompleteParams, CompletionResult, CompletionValues, McpError, McpResult};

use super::greeting::STYLES;
use super::registry::PromptRegistry;

const MAX_COMPLETIONS: usize = 100;

pub async fn complete(params: &CompleteParams, store: &SharedStore) -> McpResult<CompletionResult> {
    let reference = &params.reference;
    let argument = &params.argument;

    let candidates: Vec<String> = match reference.kind.as_str() {
        "ref/prompt" => {
            let name = reference.name.as_deref().unwrap_or_default();
            if !PromptRegistry::contains(name) {
                return Err(McpError::PromptNotFound(name.to_string()));
            }
            match (name, argument.name.as_str()) {
                ("greeting", "style") => STYLES.iter().map(|s| s.to_string()).collect(),
                _ => Vec::new(),
            }
        }
        "ref/resource" => match (reference.uri.as_deref(), argument.name.as_str()) {
            (Some("note://{id}"), "id") => {
                let store = store.lock().await;
                store.notes().iter().map(|n| n.id.to_string()).collect()
            }
            _ => Vec::new(),
        },
        other => {
            return Err(McpError::InvalidParams(format!(
                "Unknown completion reference type: {other}"
            )))
        }
    };

    let matching: Vec<String> = candidates
        .into_iter()
        .filter(|c| c.starts_with(argument.value.as_str()))
        .collect();
    let total = matching.len();
    let values: Vec<String> = matching.into_iter().take(MAX_COMPLETIONS).collect();

    Ok(CompletionResult {
        completion: CompletionValues {
            has_more: total > values.len(),
            total: Some(total),
            values,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::shared_store;
    use crate::types::{CompletionArgument, CompletionReference};

    fn params(kind: &str, name: Option<&str>, uri: Option<&str>, arg: &str, value: &str) -> CompleteParams {
        CompleteParams {
            reference: CompletionReference {
                kind: kind.to_string(),
                name: name.map(str::to_string),
                uri: uri.map(str::to_string),
            },
            argument: CompletionArgument {
                name: arg.to_string(),
                value: value.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_greeting_styles() {
        let store = shared_store();
        let all = complete(&params("ref/prompt", Some("greeting"), None, "style", ""), &store)
            .await
            .unwrap();
        assert_eq!(all.completion.values, vec!["formal", "casual", "enthusiastic"]);
        assert!(!all.completion.has_more);

        let prefixed = complete(&params("ref/prompt", Some("greeting"), None, "style", "c"), &store)
            .await
            .unwrap();
        assert_eq!(prefixed.completion.values, vec!["casual"]);
    }

    #[tokio::test]
    async fn test_note_ids() {
        let store = shared_store();
        {
            let mut s = store.lock().await;
            for i in 0..12 {
                s.add_note(&format!("n{i}"), vec![]).unwrap();
            }
        }
        let result = complete(&params("ref/resource", None, Some("note://{id}"), "id", "1"), &store)
            .await
            .unwrap();
        assert_eq!(result.completion.values, vec!["1", "10", "11", "12"]);
    }

    #[tokio::test]
    async fn test_cap_sets_has_more() {
        let store = shared_store();
        {
            let mut s = store.lock().await;
            for i in 0..150 {
                s.add_note(&format!("n{i}"), vec![]).unwrap();
            }
        }
        let result = complete(&params("ref/resource", None, Some("note://{id}"), "id", ""), &store)
            .await
            .unwrap();
        assert_eq!(result.completion.values.len(), MAX_COMPLETIONS);
        assert_eq!(result.completion.total, Some(150));
        assert!(result.completion.has_more);
    }
}
