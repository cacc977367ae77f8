//! Resource URI templates and static resource definitions.

use crate::types::{ResourceDefinition, ResourceTemplateDefinition};

pub const STATUS_URI: &str = "server://status";
pub const NOTES_URI: &str = "server://notes";
pub const COUNTER_URI: &str = "server://counter";
pub const NOTE_URI_PREFIX: &str = "note://";

pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
    vec![ResourceTemplateDefinition {
        uri_template: "note://{id}".to_string(),
        name: "Individual Note".to_string(),
        description: Some("Access a specific note by ID".to_string()),
        mime_type: Some("application/json".to_string()),
    }]
}

pub fn list_resources() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: STATUS_URI.to_string(),
            name: "Server Status".to_string(),
            description: Some("Current server status and health information".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        ResourceDefinition {
            uri: NOTES_URI.to_string(),
            name: "All Notes".to_string(),
            description: Some("All notes stored on the server".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        ResourceDefinition {
            uri: COUNTER_URI.to_string(),
            name: "Counter Value".to_string(),
            description: Some("Current counter value".to_string()),
            mime_type: Some("text/plain".to_string()),
        },
    ]
}
