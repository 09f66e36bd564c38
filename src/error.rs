use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("connect failure: {0}")]
    Connect(String),

    #[error("request timeout")]
    Timeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http error {status}")]
    Http { status: u16, retriable: bool },

    #[error("body read failed: {0}")]
    Body(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::InvalidUrl(_) => false,
            Self::RedirectLoop => false,
            Self::Http { retriable, .. } => *retriable,

            Self::Connect(_) => true,
            Self::Timeout => true,
            Self::Body(_) => true,
            Self::Unknown(_) => true,
        }
    }

    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::Http {
            status: status.as_u16(),
            retriable: status.is_server_error()
                || status == reqwest::StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

/// Raised only when markup cannot be turned into a page at all.
/// Missing sections are never errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty document")]
    EmptyDocument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_throttling_retry() {
        assert!(FetchError::from_status(reqwest::StatusCode::BAD_GATEWAY).should_retry());
        assert!(FetchError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS).should_retry());
        assert!(FetchError::Timeout.should_retry());
    }

    #[test]
    fn missing_article_is_final() {
        let err = FetchError::from_status(reqwest::StatusCode::NOT_FOUND);
        assert!(!err.should_retry());
        assert_eq!(err.to_string(), "http error 404");
        assert!(!FetchError::InvalidUrl("nope".into()).should_retry());
    }
}
