use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config value: {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connection failures classified into a closed set of kinds, so callers
/// never have to match on the driver's own error hierarchy.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("connection timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Other(String),
}

impl ConnectError {
    /// Convenience constructor for `.map_err(ConnectError::other)`.
    pub fn other<E: std::fmt::Display>(e: E) -> Self {
        Self::Other(e.to_string())
    }

    pub fn timeout<E: std::fmt::Display>(e: E) -> Self {
        Self::Timeout(e.to_string())
    }

    /// Stable lowercase tag for logs and serialized results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::Timeout(_) => "timeout",
            Self::Other(_) => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectError;

    #[test]
    fn test_connect_error_kind_tags() {
        assert_eq!(
            ConnectError::ServiceUnavailable("x".into()).kind(),
            "service_unavailable"
        );
        assert_eq!(
            ConnectError::AuthenticationFailed("x".into()).kind(),
            "authentication_failed"
        );
        assert_eq!(ConnectError::Timeout("x".into()).kind(), "timeout");
        assert_eq!(ConnectError::Other("x".into()).kind(), "generic");
    }

    #[test]
    fn test_connect_error_display_includes_message() {
        let err = ConnectError::AuthenticationFailed("bad credentials".into());
        assert_eq!(err.to_string(), "authentication failed: bad credentials");
    }
}
