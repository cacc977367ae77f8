//! Prompt: greeting - A customizable greeting message.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

use super::registry::string_arg;

pub const STYLES: [&str; 3] = ["formal", "casual", "enthusiastic"];

pub fn expand(args: &Value) -> McpResult<PromptGetResult> {
    let name = string_arg(args, "name")
        .ok_or_else(|| McpError::InvalidParams("'name' argument is required".to_string()))?;
    let style = string_arg(args, "style").unwrap_or_else(|| "casual".to_string());

    let text = match style.as_str() {
        "formal" => format!("Good day, {name}. How may I assist you today?"),
        "casual" => format!("Hello, {name}! How can I help you?"),
        "enthusiastic" => format!("Hey {name}! Great to see you! What's up?"),
        other => {
            return Err(McpError::InvalidParams(format!(
                "Unknown greeting style '{other}', expected one of: {}",
                STYLES.join(", ")
            )))
        }
    };

    Ok(PromptGetResult {
        description: Some(format!("A {style} greeting for {name}")),
        messages: vec![PromptMessage::user(text)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolContent;
    use serde_json::json;

    fn text(result: &PromptGetResult) -> &str {
        match &result.messages[0].content {
            ToolContent::Text { text } => text,
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_styles() {
        let formal = expand(&json!({"name": "Ada", "style": "formal"})).unwrap();
        assert_eq!(text(&formal), "Good day, Ada. How may I assist you today?");
        let casual = expand(&json!({"name": "Ada"})).unwrap();
        assert_eq!(text(&casual), "Hello, Ada! How can I help you?");
        assert_eq!(casual.messages[0].role, "user");
    }

    #[test]
    fn test_missing_name() {
        assert_eq!(expand(&json!({})).unwrap_err().code(), -32602);
    }
}
