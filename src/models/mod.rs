pub mod result;
pub mod session;
pub mod user;

// Re-export so callers can "use crate::models::*;"
pub use result::{Pagination, RequestResult};
pub use session::{LoginOutcome, SessionState};
pub use user::{LoginRequest, LoginResponse, User};
