use serde::{Deserialize, Serialize};

use super::user::User;

/// Client-side view of the current authentication.
///
/// `is_authenticated` implies `token.is_some()`. `loading` is only set while
/// the store initializes or a login call is in flight.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionState {
    /// State of a freshly created store, before `initialize` has run.
    pub fn initial() -> Self {
        SessionState {
            loading: true,
            ..Self::anonymous()
        }
    }

    /// Fully signed-out state.
    pub fn anonymous() -> Self {
        SessionState {
            is_authenticated: false,
            token: None,
            user: None,
            loading: false,
        }
    }

    pub fn authenticated(token: impl Into<String>) -> Self {
        SessionState {
            is_authenticated: true,
            token: Some(token.into()),
            user: None,
            loading: false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Outcome of `SessionStore::login`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginOutcome {
    pub fn succeeded() -> Self {
        LoginOutcome {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        LoginOutcome {
            success: false,
            error: Some(error.into()),
        }
    }
}
