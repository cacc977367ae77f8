//! Credentials and the authorization hook consulted for privileged tools.

/// What a client presented when it connected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub bearer_token: Option<String>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    /// Parse an `Authorization: Bearer <token>` header value.
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let token = value.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self::bearer(token))
        }
    }
}

/// Decides whether a session may invoke a privileged tool.
pub trait AuthHook: Send + Sync {
    fn is_authorized(&self, tool: &str, credentials: Option<&Credentials>) -> bool;
}

/// Permits every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AuthHook for AllowAll {
    fn is_authorized(&self, _tool: &str, _credentials: Option<&Credentials>) -> bool {
        true
    }
}

/// Permits calls whose bearer token matches the configured one.
#[derive(Debug, Clone)]
pub struct BearerTokenAuth {
    token: String,
}

impl BearerTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl AuthHook for BearerTokenAuth {
    fn is_authorized(&self, tool: &str, credentials: Option<&Credentials>) -> bool {
        let allowed = credentials
            .and_then(|c| c.bearer_token.as_deref())
            .is_some_and(|presented| presented == self.token);
        if !allowed {
            tracing::warn!(tool, "Rejected privileged tool call: missing or wrong bearer token");
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authorization_header() {
        assert_eq!(
            Credentials::from_authorization_header("Bearer abc"),
            Some(Credentials::bearer("abc"))
        );
        assert_eq!(Credentials::from_authorization_header("Basic abc"), None);
        assert_eq!(Credentials::from_authorization_header("Bearer "), None);
    }

    #[test]
    fn test_bearer_auth() {
        let auth = BearerTokenAuth::new("secret");
        assert!(auth.is_authorized("add_note", Some(&Credentials::bearer("secret"))));
        assert!(!auth.is_authorized("add_note", Some(&Credentials::bearer("nope"))));
        assert!(!auth.is_authorized("add_note", None));
        assert!(AllowAll.is_authorized("add_note", None));
    }
}
