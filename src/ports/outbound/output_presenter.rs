use crate::shared::Result;

/// OutputPresenter port for delivering a rendered report
///
/// Implemented for stdout and for a report file chosen with `--output`.
pub trait OutputPresenter {
    /// Writes `content` to the destination
    ///
    /// # Errors
    /// Returns an error if the destination cannot be written
    fn present(&self, content: &str) -> Result<()>;
}
