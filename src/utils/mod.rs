/// Path and URL normalization for user input
pub mod path;
/// Retry with linear backoff
pub mod retry;

pub use path::{normalize_url, normalize_user_input_path, sanitize_filename};
pub use retry::with_retry;
