use crate::shared::error::SizeError;
use crate::shared::Result;
use std::fmt;
use std::str::FromStr;

/// Longest package name the npm registry accepts.
const MAX_NAME_LENGTH: usize = 214;

/// A package name plus an optional, still unparsed, version constraint.
///
/// A missing constraint means "whatever the registry tags as latest".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencySpecifier {
    name: String,
    constraint: Option<String>,
}

impl DependencySpecifier {
    /// Creates a specifier from already separated parts.
    ///
    /// An empty or blank constraint is treated as absent.
    ///
    /// # Errors
    /// Returns [`SizeError::InvalidSpecifier`] when the name is not a valid
    /// npm package name.
    pub fn new(name: impl Into<String>, constraint: Option<String>) -> Result<Self> {
        let name = name.into();
        validate_package_name(&name)?;

        let constraint = constraint
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self { name, constraint })
    }

    /// Parses free-form input such as `foo`, `foo@^1.2`, `foo ^1.2` or
    /// `@scope/foo@1.2.3`.
    ///
    /// A space separates name and constraint. Without a space, the first `@`
    /// after the leading character splits them so scoped names stay intact.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SizeError::InvalidSpecifier {
                input: input.to_string(),
                reason: "specifier is empty".to_string(),
            }
            .into());
        }

        let (name, constraint) = split_specifier(input);
        Self::new(name, constraint.map(str::to_string)).map_err(|err| {
            match err.downcast::<SizeError>() {
                Ok(SizeError::InvalidSpecifier { reason, .. }) => SizeError::InvalidSpecifier {
                    input: input.to_string(),
                    reason,
                }
                .into(),
                Ok(other) => other.into(),
                Err(err) => err,
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }
}

impl FromStr for DependencySpecifier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DependencySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(constraint) => write!(f, "{}@{}", self.name, constraint),
            None => write!(f, "{}", self.name),
        }
    }
}

fn split_specifier(input: &str) -> (&str, Option<&str>) {
    if let Some((name, rest)) = input.split_once(char::is_whitespace) {
        return (name, Some(rest.trim()));
    }

    // Skip index 0 so the scope marker of "@scope/name" is never a separator.
    match input.char_indices().skip(1).find(|(_, c)| *c == '@') {
        Some((at, _)) => (&input[..at], Some(&input[at + 1..])),
        None => (input, None),
    }
}

/// Checks the subset of npm naming rules that matter for registry lookups.
pub fn validate_package_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.len() > MAX_NAME_LENGTH {
        Some("name is longer than 214 characters")
    } else if name.chars().any(char::is_whitespace) {
        Some("name contains whitespace")
    } else if name.starts_with('.') || name.starts_with('_') {
        Some("name cannot start with '.' or '_'")
    } else if let Some(scoped) = name.strip_prefix('@') {
        match scoped.split_once('/') {
            Some((scope, pkg)) if !scope.is_empty() && !pkg.is_empty() && !pkg.contains('/') => {
                None
            }
            _ => Some("scoped names must look like @scope/name"),
        }
    } else if name.contains('/') {
        Some("unscoped names cannot contain '/'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SizeError::InvalidSpecifier {
            input: name.to_string(),
            reason: reason.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}
