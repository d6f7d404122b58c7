use std::time::Duration;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum GraylogError {
    /// The service could not be reached at all (connect, DNS, reset, request timeout).
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The request could not be built or followed (bad URL, scheme, redirect).
    /// Retrying cannot fix it.
    #[error("request error: {0}")]
    Request(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body was not valid JSON or lacked an expected field.
    #[error("decode error: {0}")]
    Decode(String),
    /// The polled condition never became true before the deadline.
    #[error("timed out after {waited:?} waiting for {condition}")]
    Timeout {
        /// Human-readable description of the awaited condition.
        condition: String,
        /// Time spent polling before giving up.
        waited: Duration,
    },
    /// A request observed its cancellation signal firing.
    #[error("request cancelled: poll deadline elapsed")]
    Cancelled,
}

impl GraylogError {
    /// Splits `reqwest` failures into unreachable-service and permanent request errors.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_redirect() || err.is_status() {
            Self::Request(err)
        } else {
            Self::Transport(err)
        }
    }

    /// Returns `true` when the service was not reachable at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` for an HTTP 404 answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::GraylogError;

    #[test]
    fn timeout_message_names_condition_and_duration() {
        let err = GraylogError::Timeout {
            condition: "graylog api".to_owned(),
            waited: Duration::from_millis(1500),
        };
        let text = err.to_string();
        assert!(text.contains("graylog api"));
        assert!(text.contains("1.5s"));
    }

    #[test]
    fn classification_helpers() {
        let not_found = GraylogError::Http {
            status: 404,
            body: String::new(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_transport());
        assert!(!GraylogError::Decode("x".to_owned()).is_not_found());
    }

    #[test]
    fn builder_failures_are_not_transport() {
        let err = reqwest::Client::new()
            .get("http://[::1")
            .build()
            .expect_err("unterminated ipv6 host must not parse");
        let err = GraylogError::from_reqwest(err);
        assert!(matches!(err, GraylogError::Request(_)));
        assert!(!err.is_transport());
    }
}
