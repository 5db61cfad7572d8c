pub mod navigator;
pub mod session_store;
pub mod token;

// Re-export from the submodules so we can do "use crate::session::*;"
pub use navigator::{Navigator, TracingNavigator};
pub use session_store::{is_authenticated, SessionStore, TokenSource};
pub use token::{is_token_expired, is_token_expired_at, token_expiry, TokenError};
