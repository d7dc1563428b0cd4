/// Type alias for Result with anyhow::Error as the error type.
/// Typed [`SizeError`](crate::shared::error::SizeError) values travel inside it.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
