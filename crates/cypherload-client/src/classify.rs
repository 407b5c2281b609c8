use cypherload_core::error::ConnectError;

/// Map a driver error message onto the closed connectivity taxonomy.
///
/// Classification is by message text so the driver's own error hierarchy
/// never leaks out of this crate. Unrecognized messages fall through to
/// the generic kind.
pub fn classify_connect_error(message: &str) -> ConnectError {
    let lower = message.to_lowercase();
    if lower.contains("auth") || lower.contains("unauthorized") || lower.contains("credential") {
        ConnectError::AuthenticationFailed(message.to_string())
    } else if lower.contains("timed out") || lower.contains("timeout") {
        ConnectError::Timeout(message.to_string())
    } else if lower.contains("connection refused")
        || lower.contains("connection reset")
        || lower.contains("broken pipe")
        || lower.contains("unreachable")
        || lower.contains("unavailable")
        || lower.contains("dns")
        || lower.contains("io error")
    {
        ConnectError::ServiceUnavailable(message.to_string())
    } else {
        ConnectError::Other(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_messages_classified() {
        let err = classify_connect_error("Unauthorized: The client is unauthorized due to authentication failure");
        assert_eq!(err.kind(), "authentication_failed");

        let err = classify_connect_error("invalid credentials for user neo4j");
        assert_eq!(err.kind(), "authentication_failed");
    }

    #[test]
    fn test_refused_connection_classified_unavailable() {
        let err = classify_connect_error("I/O error: Connection refused (os error 111)");
        assert_eq!(err.kind(), "service_unavailable");

        let err = classify_connect_error("host unreachable");
        assert_eq!(err.kind(), "service_unavailable");
    }

    #[test]
    fn test_timeout_classified() {
        let err = classify_connect_error("operation timed out");
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_unknown_message_is_generic() {
        let err = classify_connect_error("protocol version mismatch");
        assert_eq!(err.kind(), "generic");
        assert!(err.to_string().contains("protocol version mismatch"));
    }
}
