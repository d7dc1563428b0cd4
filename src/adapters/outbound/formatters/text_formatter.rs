use crate::application::dto::{
    BatchReport, ChangeReport, PackageSnapshot, Report, ResolutionReport, UnresolvedDependency,
    VersionComparisonReport,
};
use crate::measurement::services::{DependencyShare, SizeDifference, TrafficChange};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use std::io::IsTerminal;

/// Shown wherever a figure could not be computed.
const NOT_AVAILABLE: &str = "N/A";

/// Width of the label column.
const LABEL_WIDTH: usize = 22;

/// Human-readable byte size, 1024-based.
///
/// ```
/// use package_size::adapters::outbound::formatters::format_size;
///
/// assert_eq!(format_size(0u64), "0 B");
/// assert_eq!(format_size(500u64), "500 B");
/// assert_eq!(format_size(1536u64), "1.50 KB");
/// ```
pub fn format_size(bytes: impl Into<u128>) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let bytes = bytes.into();
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Integer with thousands separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

pub fn format_percent(percent: Option<f64>) -> String {
    percent
        .map(|p| format!("{:.2}%", p))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Time elapsed since `then`, in its largest whole unit ("3 months ago").
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const UNITS: &[(&str, i64)] = &[
        ("year", 365 * 24 * 3600),
        ("month", 30 * 24 * 3600),
        ("week", 7 * 24 * 3600),
        ("day", 24 * 3600),
        ("hour", 3600),
        ("minute", 60),
    ];

    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    UNITS
        .iter()
        .find(|(_, unit_seconds)| seconds >= *unit_seconds)
        .map(|(unit, unit_seconds)| {
            let n = seconds / unit_seconds;
            format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
        })
        .unwrap_or_else(|| "just now".to_string())
}

fn format_optional_size(bytes: Option<u128>) -> String {
    bytes
        .map(format_size)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn format_optional_count(count: Option<u64>) -> String {
    count
        .map(format_count)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// TextFormatter adapter rendering reports for a terminal
///
/// This adapter implements the ReportFormatter port. Colours are used only
/// when enabled, so the same output can be written to a file.
pub struct TextFormatter {
    color: bool,
    now: DateTime<Utc>,
}

impl TextFormatter {
    /// Colours follow whether stdout is a terminal.
    pub fn new() -> Self {
        Self::with_color(std::io::stdout().is_terminal())
    }

    pub fn with_color(color: bool) -> Self {
        Self {
            color,
            now: Utc::now(),
        }
    }

    #[cfg(test)]
    fn at(now: DateTime<Utc>) -> Self {
        Self { color: false, now }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn name(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn good(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn bad(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn line(&self, output: &mut String, label: &str, value: &str) {
        let _ = writeln!(
            output,
            "   {:<width$} {}",
            format!("{}:", label),
            value,
            width = LABEL_WIDTH
        );
    }

    fn released(&self, released_at: Option<DateTime<Utc>>) -> String {
        match released_at {
            Some(at) => format!("{} ({})", at.format("%Y-%m-%d"), format_age(at, self.now)),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper methods for rendering sections
impl TextFormatter {
    fn render_snapshot(&self, output: &mut String, icon: &str, snapshot: &PackageSnapshot) {
        let measurement = &snapshot.measurement;
        let _ = writeln!(output, "{} {}", icon, self.name(&snapshot.package.to_string()));

        self.line(output, "Released", &self.released(snapshot.released_at));
        if let Some(latest) = &snapshot.latest {
            let value = format!(
                "{} (released {})",
                latest.version,
                latest
                    .released_at
                    .map(|at| format_age(at, self.now))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string())
            );
            self.line(output, "Latest", &self.dim(&value));
        }
        self.line(
            output,
            "Installed size",
            &format_size(measurement.installed_size_bytes),
        );
        self.line(
            output,
            "Sub-dependencies",
            &format_optional_count(measurement.subdependency_count),
        );
        self.line(
            output,
            "Downloads last week",
            &format!(
                "{} ({} of all versions)",
                format_optional_count(measurement.downloads_last_week),
                format_percent(snapshot.percent_downloads_of_version)
            ),
        );
        self.line(
            output,
            "Traffic last week",
            &format_optional_size(snapshot.traffic_last_week),
        );
        output.push('\n');
    }

    fn render_shares(&self, output: &mut String, title: &str, shares: &[DependencyShare]) {
        if shares.is_empty() {
            return;
        }
        let _ = writeln!(output, "{}", self.heading(title));
        for share in shares {
            let _ = writeln!(output, "   {}", self.name(&share.dependency.to_string()));
            self.line(
                output,
                "Installed size",
                &format!(
                    "{} ({} of package)",
                    format_size(share.installed_size_bytes),
                    format_percent(share.percent_of_package_size)
                ),
            );
            self.line(
                output,
                "Sub-dependencies",
                &format!(
                    "{} ({} of package)",
                    format_optional_count(share.subdependency_count),
                    format_percent(share.percent_of_package_subdependencies)
                ),
            );
            self.line(
                output,
                "Downloads last week",
                &format!(
                    "{} ({} of all versions)",
                    format_optional_count(share.downloads_last_week),
                    format_percent(share.percent_downloads_of_version)
                ),
            );
            self.line(
                output,
                "Via the package",
                &format!(
                    "{} of its downloads, {} traffic",
                    format_percent(share.percent_of_dependency_downloads),
                    format_optional_size(share.traffic_from_package)
                ),
            );
        }
        output.push('\n');
    }

    fn render_difference(&self, output: &mut String, difference: &SizeDifference) {
        self.line(
            output,
            "Size",
            &format!(
                "{} → {} ({} of before)",
                format_size(difference.old_size_bytes),
                format_size(difference.new_size_bytes),
                format_percent(difference.percent_of_old_size)
            ),
        );
        self.line(
            output,
            "Traffic last week",
            &format!(
                "{} → {}",
                format_optional_size(difference.traffic_before),
                format_optional_size(difference.traffic_after)
            ),
        );

        let change = match difference.traffic_change {
            Some(TrafficChange::NoChange) => "no change".to_string(),
            Some(TrafficChange::Saved(bytes)) => {
                self.good(&format!("{} saved", format_size(bytes)))
            }
            Some(TrafficChange::Wasted(bytes)) => {
                self.bad(&format!("{} more", format_size(bytes)))
            }
            None => NOT_AVAILABLE.to_string(),
        };
        self.line(output, "Traffic change", &change);
    }

    fn render_unresolved(&self, output: &mut String, unresolved: &[UnresolvedDependency]) {
        if unresolved.is_empty() {
            return;
        }
        let _ = writeln!(output, "{}", self.heading("⚠️  Not resolved"));
        for failure in unresolved {
            let _ = writeln!(
                output,
                "   {}@{} {}",
                failure.name,
                failure.constraint,
                self.dim(&format!("({})", failure.reason))
            );
        }
        output.push('\n');
    }

    fn render_change(&self, output: &mut String, report: &ChangeReport) {
        let statistics = &report.statistics;
        self.render_snapshot(output, "📦", &report.package);
        self.render_shares(output, "➖ Removed", &statistics.removed);
        self.render_shares(output, "➕ Added", &statistics.added);

        let _ = writeln!(output, "{}", self.heading("📊 Estimate"));
        self.render_difference(output, &statistics.difference);
        self.line(
            output,
            "Sub-dependencies",
            &format!(
                "{} → {}",
                format_optional_count(statistics.baseline_subdependency_count),
                format_optional_count(statistics.new_subdependency_count)
            ),
        );

        if let Some(verified) = &report.verified {
            self.line(
                output,
                "Verified install",
                &format!(
                    "{}, {} packages",
                    format_size(verified.installed_size_bytes),
                    verified
                        .package_count
                        .map(|count| format_count(count as u64))
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
                ),
            );
        }
    }

    fn render_versions(&self, output: &mut String, report: &VersionComparisonReport) {
        self.render_snapshot(output, "📦", &report.old);
        self.render_snapshot(output, "📦", &report.new);

        let _ = writeln!(output, "{}", self.heading("📊 Difference"));
        self.render_difference(output, &report.difference);
        let change = report
            .subdependency_change
            .map(|delta| format!("{:+}", delta))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        self.line(output, "Sub-dependencies", &change);
    }

    fn render_dependencies(&self, output: &mut String, report: &BatchReport) {
        self.render_snapshot(output, "📦", &report.package);

        let mut shares: Vec<&DependencyShare> = report.dependencies.iter().collect();
        shares.sort_by(|a, b| b.installed_size_bytes.cmp(&a.installed_size_bytes));

        let _ = writeln!(output, "{}", self.heading("🧩 Direct dependencies"));
        if shares.is_empty() {
            let _ = writeln!(output, "   {}", self.dim("none"));
        }
        for share in shares {
            let _ = writeln!(
                output,
                "   {:<40} {:>12} {:>9} {:>10}",
                share.dependency.to_string(),
                format_size(share.installed_size_bytes),
                format_percent(share.percent_of_package_size),
                format_optional_count(share.subdependency_count)
            );
        }
        self.line(
            output,
            "Sum of dependencies",
            &format_size(report.total_dependency_size_bytes),
        );
        output.push('\n');
        self.render_unresolved(output, &report.unresolved);
    }

    fn render_resolution(&self, output: &mut String, report: &ResolutionReport) {
        let _ = writeln!(output, "📦 {}", self.name(&report.package.to_string()));
        for dependency in &report.resolved {
            let _ = writeln!(output, "   {}", dependency);
        }
        output.push('\n');
        self.render_unresolved(output, &report.unresolved);
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        let mut output = String::new();
        match report {
            Report::Measure(snapshot) => self.render_snapshot(&mut output, "📦", snapshot),
            Report::Change(change) => self.render_change(&mut output, change),
            Report::Versions(versions) => self.render_versions(&mut output, versions),
            Report::Dependencies(batch) => self.render_dependencies(&mut output, batch),
            Report::Resolution(resolution) => self.render_resolution(&mut output, resolution),
        }
        Ok(output)
    }
}
