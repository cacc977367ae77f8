//! Server-to-client notifications queued in a session's outbox.

use serde_json::json;

use crate::types::{JsonRpcNotification, ProgressParams, ProgressToken};

pub const PROGRESS_METHOD: &str = "notifications/progress";
pub const RESOURCE_UPDATED_METHOD: &str = "notifications/resources/updated";

/// One queued notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Progress {
        token: Option<ProgressToken>,
        progress: u64,
        total: u64,
        message: String,
    },
    ResourceUpdated {
        uri: String,
    },
    KeepAlive,
}

impl Notification {
    pub fn resource_updated(uri: impl Into<String>) -> Self {
        Notification::ResourceUpdated { uri: uri.into() }
    }

    pub fn method(&self) -> Option<&'static str> {
        match self {
            Notification::Progress { .. } => Some(PROGRESS_METHOD),
            Notification::ResourceUpdated { .. } => Some(RESOURCE_UPDATED_METHOD),
            Notification::KeepAlive => None,
        }
    }

    /// The JSON-RPC envelope pushed to the client. Keep-alives have none.
    pub fn to_envelope(&self) -> Option<JsonRpcNotification> {
        match self {
            Notification::Progress {
                token,
                progress,
                total,
                message,
            } => {
                let params = ProgressParams {
                    progress_token: token.clone(),
                    progress: *progress,
                    total: *total,
                    message: message.clone(),
                };
                Some(JsonRpcNotification::new(
                    PROGRESS_METHOD,
                    serde_json::to_value(params).ok(),
                ))
            }
            Notification::ResourceUpdated { uri } => Some(JsonRpcNotification::new(
                RESOURCE_UPDATED_METHOD,
                Some(json!({ "uri": uri })),
            )),
            Notification::KeepAlive => None,
        }
    }
}
