use serde::{Deserialize, Serialize};

/// Uniform outcome of every call made through the API client.
///
/// Exactly one of `data` or `error` is present. `message` is whatever
/// human-readable message the server attached, if any.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RequestResult<T> {
    Success {
        data: T,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Failure {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl<T> RequestResult<T> {
    pub fn success(data: T, message: Option<String>) -> Self {
        RequestResult::Success { data, message }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        RequestResult::Failure {
            error: error.into(),
            message: None,
        }
    }

    pub fn failure_with_message(error: impl Into<String>, message: Option<String>) -> Self {
        RequestResult::Failure {
            error: error.into(),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestResult::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            RequestResult::Success { data, .. } => Some(data),
            RequestResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestResult::Success { .. } => None,
            RequestResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            RequestResult::Success { message, .. } | RequestResult::Failure { message, .. } => {
                message.as_deref()
            }
        }
    }

    /// Maps the success payload, keeping message and error untouched.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> RequestResult<U> {
        match self {
            RequestResult::Success { data, message } => RequestResult::Success {
                data: f(data),
                message,
            },
            RequestResult::Failure { error, message } => RequestResult::Failure { error, message },
        }
    }

    /// Like `map`, but the mapping may itself fail.
    pub fn and_then<U, F: FnOnce(T) -> Result<U, String>>(self, f: F) -> RequestResult<U> {
        match self {
            RequestResult::Success { data, message } => match f(data) {
                Ok(data) => RequestResult::Success { data, message },
                Err(error) => RequestResult::Failure { error, message },
            },
            RequestResult::Failure { error, message } => RequestResult::Failure { error, message },
        }
    }

    /// Drops the server message and returns a plain `Result`.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            RequestResult::Success { data, .. } => Ok(data),
            RequestResult::Failure { error, .. } => Err(error),
        }
    }
}

/// Paging metadata attached to list responses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}
