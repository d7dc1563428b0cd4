//! npm range syntax on top of the `semver` crate.
//!
//! `semver::VersionReq` follows Cargo's dialect, where a bare `1.2.3` means
//! `^1.2.3` and comparators are comma separated. npm ranges are rewritten
//! into that dialect before parsing:
//!
//! | npm                | semver crate            |
//! |--------------------|-------------------------|
//! | `1.2.3`            | `=1.2.3`                |
//! | `1.2` / `1.2.x`    | `=1.2`                  |
//! | `*`, `x`, empty    | `*`                     |
//! | `>= 1.2 < 2`       | `>=1.2, <2`             |
//! | `1.0.0 - 2.0.0`    | `>=1.0.0, <=2.0.0`      |
//! | `a \|\| b`         | any alternative matches |

use semver::{Version, VersionReq};
use std::fmt;

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// A parsed npm version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl NpmRange {
    /// Parses npm range text. Any invalid alternative makes the whole
    /// range invalid; the error string describes the offending part.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let alternatives = text
            .split("||")
            .map(parse_alternative)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: text.trim().to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

impl fmt::Display for NpmRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn parse_alternative(text: &str) -> std::result::Result<VersionReq, String> {
    let text = text.trim();

    let comparators = match text.split_once(" - ") {
        Some((low, high)) => vec![
            convert_comparator(">=", low.trim())?,
            convert_comparator("<=", high.trim())?,
        ],
        None => tokenize(text)
            .into_iter()
            .map(|(op, version)| convert_comparator(&op, &version))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    let comparators: Vec<String> = comparators.into_iter().flatten().collect();
    if comparators.is_empty() {
        return Ok(VersionReq::STAR);
    }

    let converted = comparators.join(", ");
    VersionReq::parse(&converted).map_err(|e| format!("\"{}\": {}", text, e))
}

/// Splits `>= 1.2 <2` into `[(">=", "1.2"), ("<", "2")]`, joining operators
/// separated from their version by whitespace.
fn tokenize(text: &str) -> Vec<(String, String)> {
    let mut comparators = Vec::new();
    let mut pending_op = String::new();

    for token in text.split_whitespace() {
        let version_start = token
            .find(|c: char| !OPERATOR_CHARS.contains(&c))
            .unwrap_or(token.len());
        let (op, version) = token.split_at(version_start);
        pending_op.push_str(op);

        if !version.is_empty() {
            comparators.push((std::mem::take(&mut pending_op), version.to_string()));
        }
    }

    if !pending_op.is_empty() {
        comparators.push((pending_op, String::new()));
    }

    comparators
}

/// Converts one npm comparator. `None` means "matches everything".
fn convert_comparator(op: &str, version: &str) -> std::result::Result<Option<String>, String> {
    let version = version.strip_prefix(['v', 'V']).unwrap_or(version);
    if version.is_empty() {
        return Err(format!("operator \"{}\" has no version", op));
    }

    // Build metadata never affects matching.
    let version = version.split_once('+').map_or(version, |(v, _)| v);

    let parts: Vec<&str> = version.splitn(3, '.').collect();
    let wildcard_at = parts
        .iter()
        .position(|p| matches!(*p, "x" | "X" | "*"));

    let version = match wildcard_at {
        Some(0) => return Ok(None),
        Some(idx) => parts[..idx].join("."),
        None => version.to_string(),
    };

    let op = match op {
        "" => "=",
        other => other,
    };

    Ok(Some(format!("{}{}", op, version)))
}
