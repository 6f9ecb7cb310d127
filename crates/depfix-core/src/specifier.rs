use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::{DepfixError, DepfixResult};
use crate::version::{InstalledVersion, Version};

/// Marker some enumerators emit for unconstrained edges. Filtered before
/// specifier construction; it never reaches `Specifier::parse`.
pub const ANY_MARKER: &str = "Any";

/// Comparison operator of a version specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Compatible,
    ArbitraryEqual,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Compatible => "~=",
            Operator::ArbitraryEqual => "===",
        }
    }
}

// Longest operators first so `===` is not read as `==`.
const OPERATORS: &[(&str, Operator)] = &[
    ("===", Operator::ArbitraryEqual),
    ("==", Operator::Equal),
    ("!=", Operator::NotEqual),
    ("<=", Operator::LessEqual),
    (">=", Operator::GreaterEqual),
    ("~=", Operator::Compatible),
    ("<", Operator::Less),
    (">", Operator::Greater),
];

/// A single version constraint of the form `<op><version>`.
#[derive(Debug, Clone)]
pub struct Specifier {
    op: Operator,
    operand: String,
    version: Option<Version>,
    wildcard: bool,
}

impl Specifier {
    /// Parse one specifier fragment, e.g. `>=1.21.1` or `==2.26.*`.
    pub fn parse(input: &str) -> DepfixResult<Self> {
        let text = input.trim();
        let (op, operand) = OPERATORS
            .iter()
            .find_map(|(symbol, op)| text.strip_prefix(symbol).map(|rest| (*op, rest.trim())))
            .ok_or_else(|| {
                DepfixError::version(format!("missing comparison operator in '{}'", input))
            })?;
        if operand.is_empty() {
            return Err(DepfixError::version(format!("missing version in '{}'", input)));
        }

        let (version, wildcard) = match op {
            Operator::ArbitraryEqual => (None, false),
            Operator::Equal | Operator::NotEqual => match operand.strip_suffix(".*") {
                Some(prefix) => (Some(Version::parse(prefix)?), true),
                None => (Some(Version::parse(operand)?), false),
            },
            Operator::Compatible => {
                let version = Version::parse(operand)?;
                if version.release().len() < 2 {
                    return Err(DepfixError::version(format!(
                        "compatible release clause '{}' needs at least two release segments",
                        input
                    )));
                }
                (Some(version), false)
            }
            _ => (Some(Version::parse(operand)?), false),
        };

        Ok(Self {
            op,
            operand: operand.to_string(),
            version,
            wildcard,
        })
    }

    /// The specifier's operator.
    pub fn op(&self) -> Operator {
        self.op
    }

    /// Whether the operand itself names a pre-release.
    pub fn operand_is_prerelease(&self) -> bool {
        self.version.as_ref().is_some_and(Version::is_prerelease)
    }

    /// Whether a version satisfies this specifier.
    pub fn contains(&self, version: &Version) -> bool {
        let Some(operand) = &self.version else {
            // arbitrary equality compares the exact text
            return self.operand.eq_ignore_ascii_case(&version.to_string());
        };
        match self.op {
            Operator::Equal => self.matches_equal(version, operand),
            Operator::NotEqual => !self.matches_equal(version, operand),
            Operator::LessEqual => version.without_local() <= *operand,
            Operator::GreaterEqual => version.without_local() >= *operand,
            Operator::Less => {
                // an exclusive bound does not admit pre-releases of the
                // bound itself unless the bound is one
                version.without_local() < *operand
                    && !(version.is_prerelease()
                        && !operand.is_prerelease()
                        && version.same_release(operand))
            }
            Operator::Greater => {
                version.without_local() > *operand
                    && !(version.is_postrelease()
                        && !operand.is_postrelease()
                        && version.same_release(operand))
            }
            Operator::Compatible => {
                version.without_local() >= *operand
                    && prefix_matches(version, operand, operand.release().len() - 1)
            }
            Operator::ArbitraryEqual => unreachable!("arbitrary equality has no parsed operand"),
        }
    }

    fn matches_equal(&self, version: &Version, operand: &Version) -> bool {
        if self.wildcard {
            return version.epoch() == operand.epoch()
                && prefix_matches(version, operand, operand.release().len());
        }
        if operand.has_local() {
            version == operand
        } else {
            version.without_local() == *operand
        }
    }
}

fn prefix_matches(version: &Version, operand: &Version, segments: usize) -> bool {
    (0..segments).all(|index| version.release_component(index) == operand.release_component(index))
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.operand)
    }
}

impl FromStr for Specifier {
    type Err = DepfixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// An ordered conjunction of specifiers. The empty set is the wildcard:
/// it satisfies every parseable version.
#[derive(Debug, Clone, Default)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    /// Create the empty (unconstrained) set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated specifier list. An invalid fragment is
    /// reported and the whole set degrades to unconstrained; this path
    /// is never fatal.
    pub fn parse(input: &str) -> Self {
        let text = input.trim();
        if text.is_empty() || text == ANY_MARKER {
            return Self::new();
        }
        let mut specifiers = Vec::new();
        for fragment in text.split(',') {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            match Specifier::parse(fragment) {
                Ok(specifier) => specifiers.push(specifier),
                Err(err) => {
                    warn!("treating '{}' as unconstrained: {}", input, err);
                    return Self::new();
                }
            }
        }
        Self { specifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Specifier> {
        self.specifiers.iter()
    }

    /// Whether a version satisfies every member of the set.
    ///
    /// Pre-releases are excluded unless some member names a pre-release
    /// operand, with one exception: a strict-equality member that the
    /// version matches admits it anyway.
    pub fn contains(&self, version: &Version) -> bool {
        if self.specifiers.is_empty() {
            return true;
        }
        if !self.specifiers.iter().all(|s| s.contains(version)) {
            return false;
        }
        if version.is_prerelease() && !self.allows_prereleases() {
            return self.specifiers.iter().any(|s| {
                matches!(s.op(), Operator::Equal | Operator::ArbitraryEqual) && s.contains(version)
            });
        }
        true
    }

    fn allows_prereleases(&self) -> bool {
        self.specifiers.iter().any(Specifier::operand_is_prerelease)
    }

    /// Whether an installed version satisfies the set. The unknown
    /// sentinel satisfies only the empty set.
    pub fn satisfied_by(&self, installed: &InstalledVersion) -> bool {
        match installed.version() {
            Some(version) => self.contains(version),
            None => self.is_empty(),
        }
    }

    /// Intersection is concatenation: the result demands both sets.
    pub fn intersect(&self, other: &SpecifierSet) -> SpecifierSet {
        let mut combined = self.clone();
        combined.intersect_with(other);
        combined
    }

    /// In-place intersection.
    pub fn intersect_with(&mut self, other: &SpecifierSet) {
        self.specifiers.extend(other.specifiers.iter().cloned());
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for specifier in &self.specifiers {
            if !first {
                write!(f, ",")?;
            }
            specifier.fmt(f)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for SpecifierSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpecifierSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(SpecifierSet::parse(&text))
    }
}

impl FromStr for SpecifierSet {
    type Err = DepfixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
