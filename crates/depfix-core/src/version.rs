use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{DepfixError, DepfixResult};

/// Pre-release cycle of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreTag {
    Alpha,
    Beta,
    Rc,
}

impl PreTag {
    fn as_str(self) -> &'static str {
        match self {
            PreTag::Alpha => "a",
            PreTag::Beta => "b",
            PreTag::Rc => "rc",
        }
    }
}

/// One dot-separated segment of a local version label. Numeric segments
/// order after alphanumeric ones, which the derived ordering provides
/// through the variant order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LocalSegment {
    Text(String),
    Number(u64),
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Text(s) => write!(f, "{}", s),
            LocalSegment::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Package version following PEP 440: `[N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]`.
///
/// Ordering and equality follow the PEP comparison rules, so trailing
/// zero release segments are insignificant (`1.0 == 1.0.0`).
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreTag, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

impl Version {
    /// Parse a version string. Accepts the usual lenient spellings
    /// (leading `v`, mixed separators, alternate pre-release words).
    pub fn parse(input: &str) -> DepfixResult<Self> {
        let invalid = || DepfixError::version(format!("invalid version '{}'", input));

        let text = input.trim().to_ascii_lowercase();
        let text = text.strip_prefix('v').unwrap_or(&text);
        if text.is_empty() {
            return Err(invalid());
        }

        let (text, local) = match text.split_once('+') {
            Some((main, label)) => (main, parse_local(label).ok_or_else(invalid)?),
            None => (text, Vec::new()),
        };

        let (epoch, text) = match text.split_once('!') {
            Some((epoch, rest)) => (epoch.parse::<u64>().map_err(|_| invalid())?, rest),
            None => (0, text),
        };

        let (first, mut rest) = take_number(text).ok_or_else(invalid)?;
        let mut release = vec![first];
        while let Some(tail) = rest.strip_prefix('.') {
            match take_number(tail) {
                Some((segment, tail)) => {
                    release.push(segment);
                    rest = tail;
                }
                None => break,
            }
        }

        let mut pre = None;
        if let Some((tag, number, tail)) = take_tagged(rest, PRE_WORDS) {
            pre = Some((tag, number));
            rest = tail;
        }

        let mut post = None;
        if let Some(tail) = rest.strip_prefix('-') {
            // implicit post release, e.g. `1.0-1`
            if let Some((number, tail)) = take_number(tail) {
                post = Some(number);
                rest = tail;
            }
        }
        if post.is_none() {
            if let Some(((), number, tail)) = take_tagged(rest, POST_WORDS) {
                post = Some(number);
                rest = tail;
            }
        }

        let mut dev = None;
        if let Some(((), number, tail)) = take_tagged(rest, DEV_WORDS) {
            dev = Some(number);
            rest = tail;
        }

        if !rest.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// Get the version epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get the release segments as parsed.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Get a release segment, treating missing trailing segments as zero.
    pub fn release_component(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    /// Whether this version is a pre-release or developmental release.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Whether this version is a post-release.
    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// Whether this version carries a local version label.
    pub fn has_local(&self) -> bool {
        !self.local.is_empty()
    }

    /// Copy of this version with the local label removed.
    pub fn without_local(&self) -> Version {
        Version {
            local: Vec::new(),
            ..self.clone()
        }
    }

    /// Whether both versions name the same (epoch, release), padding the
    /// shorter release with zeros.
    pub fn same_release(&self, other: &Version) -> bool {
        self.epoch == other.epoch && cmp_release(&self.release, &other.release) == Ordering::Equal
    }

    fn pre_key(&self) -> (u8, u8, u64) {
        match self.pre {
            Some((tag, number)) => (1, tag as u8, number),
            // a bare dev release sorts before any pre-release of the same release
            None if self.post.is_none() && self.dev.is_some() => (0, 0, 0),
            None => (2, 0, 0),
        }
    }
}

fn cmp_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for index in 0..len {
        let left = a.get(index).copied().unwrap_or(0);
        let right = b.get(index).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| cmp_release(&self.release, &other.release))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| match (self.dev, other.dev) {
                // a release without a dev marker orders after its dev builds
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(&b),
            })
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let mut first = true;
        for segment in &self.release {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        if let Some((tag, number)) = self.pre {
            write!(f, "{}{}", tag.as_str(), number)?;
        }
        if let Some(number) = self.post {
            write!(f, ".post{}", number)?;
        }
        if let Some(number) = self.dev {
            write!(f, ".dev{}", number)?;
        }
        if !self.local.is_empty() {
            write!(f, "+")?;
            let mut first = true;
            for segment in &self.local {
                if !first {
                    write!(f, ".")?;
                }
                write!(f, "{}", segment)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = DepfixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Version::parse(&text).map_err(de::Error::custom)
    }
}

const PRE_WORDS: &[(&str, PreTag)] = &[
    ("alpha", PreTag::Alpha),
    ("beta", PreTag::Beta),
    ("preview", PreTag::Rc),
    ("pre", PreTag::Rc),
    ("rc", PreTag::Rc),
    ("a", PreTag::Alpha),
    ("b", PreTag::Beta),
    ("c", PreTag::Rc),
];

const POST_WORDS: &[(&str, ())] = &[("post", ()), ("rev", ()), ("r", ())];

const DEV_WORDS: &[(&str, ())] = &[("dev", ())];

fn take_number(text: &str) -> Option<(u64, &str)> {
    let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let number = text[..digits].parse::<u64>().ok()?;
    Some((number, &text[digits..]))
}

fn strip_separator(text: &str) -> &str {
    text.strip_prefix(['.', '-', '_']).unwrap_or(text)
}

fn take_tagged<'a, T: Copy>(text: &'a str, words: &[(&str, T)]) -> Option<(T, u64, &'a str)> {
    let body = strip_separator(text);
    for (word, tag) in words {
        if let Some(after) = body.strip_prefix(word) {
            return match take_number(strip_separator(after)) {
                Some((number, rest)) => Some((*tag, number, rest)),
                None => Some((*tag, 0, after)),
            };
        }
    }
    None
}

fn parse_local(label: &str) -> Option<Vec<LocalSegment>> {
    if label.is_empty() {
        return None;
    }
    let mut segments = Vec::new();
    for part in label.split(['.', '-', '_']) {
        if part.is_empty() {
            return None;
        }
        let segment = match part.parse::<u64>() {
            Ok(number) => LocalSegment::Number(number),
            Err(_) => LocalSegment::Text(part.to_string()),
        };
        segments.push(segment);
    }
    Some(segments)
}

/// Installed version as reported by the environment. Keeps the raw text
/// around when it does not parse; the unknown form satisfies no
/// specifier except the empty set.
#[derive(Debug, Clone)]
pub enum InstalledVersion {
    Parsed(Version),
    Unknown(String),
}

impl InstalledVersion {
    /// Lenient parse; never fails.
    pub fn parse(raw: &str) -> Self {
        match Version::parse(raw) {
            Ok(version) => InstalledVersion::Parsed(version),
            Err(_) => {
                debug!("keeping unparseable installed version '{}'", raw);
                InstalledVersion::Unknown(raw.trim().to_string())
            }
        }
    }

    /// The parsed version, when there is one.
    pub fn version(&self) -> Option<&Version> {
        match self {
            InstalledVersion::Parsed(version) => Some(version),
            InstalledVersion::Unknown(_) => None,
        }
    }

    /// Whether the reported version failed to parse.
    pub fn is_unknown(&self) -> bool {
        matches!(self, InstalledVersion::Unknown(_))
    }

    /// Whether the enumerator reported no version at all.
    pub fn is_unset(&self) -> bool {
        matches!(self, InstalledVersion::Unknown(raw) if raw.is_empty())
    }
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstalledVersion::Parsed(version) => version.fmt(f),
            InstalledVersion::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

impl PartialEq for InstalledVersion {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InstalledVersion::Parsed(a), InstalledVersion::Parsed(b)) => a == b,
            (InstalledVersion::Unknown(a), InstalledVersion::Unknown(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for InstalledVersion {}

impl Serialize for InstalledVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
