use crate::application::dto::Report;
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    metadata: Metadata,
    #[serde(flatten)]
    report: &'a Report,
}

#[derive(Debug, Serialize)]
struct Metadata {
    tool: Tool,
    generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    version: &'static str,
}

/// JsonFormatter adapter for machine-readable reports
///
/// This adapter implements the ReportFormatter port. Unknown figures are
/// written as `null`, never as zero.
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        let envelope = Envelope {
            metadata: Metadata {
                tool: Tool {
                    name: env!("CARGO_PKG_NAME"),
                    version: env!("CARGO_PKG_VERSION"),
                },
                generated_at: Utc::now(),
            },
            report,
        };

        let mut json = serde_json::to_string_pretty(&envelope)?;
        json.push('\n');
        Ok(json)
    }
}
