use serde::Serialize;

use crate::response::Response;

/// A failed call to a named dependency, in a form that can be logged or
/// returned to callers as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    /// Logical name of the dependency.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client: String,

    /// URL of the request that failed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,

    /// Status line, e.g. `"404 Not Found"`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,

    #[serde(rename = "code", skip_serializing_if = "is_zero")]
    pub status_code: u16,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceError {
    /// Describe `resp` as a failure of the dependency named `client`.
    pub fn new(client: impl Into<String>, message: impl Into<String>, resp: &Response) -> Self {
        Self {
            client: client.into(),
            uri: resp.url().map(|u| u.to_string()).unwrap_or_default(),
            status: resp.status().to_string(),
            status_code: resp.code(),
            message: message.into(),
            error: None,
        }
    }

    /// Attach the underlying error.
    pub fn with_error(mut self, err: &dyn std::error::Error) -> Self {
        self.error = Some(err.to_string());
        self
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let detail = self.error.as_deref().unwrap_or(&self.message);
        if self.status_code == 0 {
            write!(f, "[{}] error: {}", self.client, detail)
        } else {
            write!(f, "[{}] error: {} | {}", self.client, self.status_code, detail)
        }
    }
}

impl std::error::Error for ServiceError {}

fn is_zero(code: &u16) -> bool {
    *code == 0
}
