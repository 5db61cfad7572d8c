pub mod api_client;
pub mod normalizer;

// Re-export so callers can do "use crate::client::{ApiClient, RequestOptions};"
pub use api_client::{ApiClient, RequestOptions};
pub use normalizer::{extract_error, normalize_response, transport_failure};
