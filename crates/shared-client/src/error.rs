/// Reasons a [`ClientConfig`](shared_config::ClientConfig) cannot become a
/// [`Client`](crate::Client).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base URL {0:?} cannot carry a path")]
    NotABase(String),
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("could not build transport: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Errors produced by [`Client`](crate::Client) and
/// [`Response`](crate::Response).
///
/// A non-2xx reply is not an error: it is returned as a `Response` and the
/// caller inspects its classification.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client: {0}, could not create client")]
    Config(#[from] ConfigError),
    #[error("client: could not encode request body: {0}")]
    Encoding(#[source] serde_json::Error),
    #[error("client: {0}, could not build request")]
    RequestBuild(#[source] reqwest::Error),
    #[error("client: {0}, could not make request")]
    Transport(#[source] reqwest::Error),
    #[error("client: request to {url} exceeded its deadline")]
    DeadlineExceeded { url: String },
    #[error("client: {0}, could not read response body")]
    Body(#[source] reqwest::Error),
    #[error("client: could not decode response body: {0}")]
    Decoding(#[source] serde_json::Error),
}

impl ClientError {
    /// True for network-level failures: DNS, connect, TLS, timeouts and
    /// expired call deadlines.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::DeadlineExceeded { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::DeadlineExceeded { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_exceeded_is_a_transport_timeout() {
        let err = ClientError::DeadlineExceeded {
            url: "http://a/b".into(),
        };
        assert!(err.is_transport());
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "client: request to http://a/b exceeded its deadline"
        );
    }

    #[test]
    fn encoding_error_is_not_transport() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ClientError::Encoding(source);
        assert!(!err.is_transport());
        assert!(!err.is_timeout());
    }

    #[test]
    fn config_error_keeps_component_tag() {
        let err: ClientError = ConfigError::NotABase("mailto:a@b".into()).into();
        assert_eq!(
            err.to_string(),
            "client: base URL \"mailto:a@b\" cannot carry a path, could not create client"
        );
    }
}
