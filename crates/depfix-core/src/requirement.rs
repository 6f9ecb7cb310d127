use crate::error::{DepfixError, DepfixResult};
use crate::package::normalize_name;
use crate::specifier::SpecifierSet;

/// A dependency declaration as found in a release's `requires_dist`
/// metadata, e.g. `requests[security] (>=2.8.1) ; python_version < "3.10"`.
///
/// The marker expression is kept as opaque text; callers decide whether a
/// marked requirement applies.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// Normalized package name.
    pub name: String,
    /// Requested extras.
    pub extras: Vec<String>,
    /// Version constraints.
    pub specifiers: SpecifierSet,
    /// Raw environment marker, if any.
    pub marker: Option<String>,
}

impl Requirement {
    /// Parse one requirement line.
    pub fn parse(line: &str) -> DepfixResult<Self> {
        let (main, marker) = match line.split_once(';') {
            Some((main, marker)) => {
                let marker = marker.trim();
                (main, (!marker.is_empty()).then(|| marker.to_string()))
            }
            None => (line, None),
        };
        let main = main.trim();

        let name_len = main
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
            .unwrap_or(main.len());
        if name_len == 0 {
            return Err(DepfixError::package(format!(
                "requirement '{}' has no package name",
                line
            )));
        }
        let name = normalize_name(&main[..name_len]);
        let mut rest = main[name_len..].trim_start();

        let mut extras = Vec::new();
        if let Some(tail) = rest.strip_prefix('[') {
            let close = tail.find(']').ok_or_else(|| {
                DepfixError::package(format!("unterminated extras in requirement '{}'", line))
            })?;
            extras = tail[..close]
                .split(',')
                .map(|extra| extra.trim().to_string())
                .filter(|extra| !extra.is_empty())
                .collect();
            rest = tail[close + 1..].trim_start();
        }

        let mut spec_text = rest.trim();
        if let Some(inner) = spec_text
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
        {
            spec_text = inner.trim();
        }

        Ok(Self {
            name,
            extras,
            specifiers: SpecifierSet::parse(spec_text),
            marker,
        })
    }
}
