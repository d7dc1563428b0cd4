use crate::application::dto::Report;
use crate::shared::Result;

/// ReportFormatter port for rendering measurement reports
///
/// This port abstracts the output format (colored text, JSON).
pub trait ReportFormatter {
    /// Renders a report
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, report: &Report) -> Result<String>;
}
