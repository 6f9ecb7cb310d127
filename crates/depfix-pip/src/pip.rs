use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use depfix_core::{
    normalize_name, CommandOutput, Conflict, ConflictKind, DepfixError, DepfixResult,
    InstalledVersion, PackageManager, SpecifierSet, Version,
};

/// Subprocess adapter around pip and the dependency tree enumerator,
/// always invoked through a specific interpreter (`python -m ...`).
#[derive(Debug, Clone)]
pub struct PipClient {
    python: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ListedPackage {
    name: String,
    version: String,
}

/// One row of `pip list --outdated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutdatedPackage {
    pub name: String,
    pub version: String,
    pub latest_version: String,
}

#[derive(Debug)]
struct RawOutput {
    code: i32,
    stdout: String,
    stderr: String,
}

impl RawOutput {
    fn success(&self) -> bool {
        self.code == 0
    }

    fn combined(self) -> CommandOutput {
        let mut output = self.stdout;
        if !self.stderr.is_empty() {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&self.stderr);
        }
        CommandOutput {
            code: self.code,
            output,
        }
    }
}

impl PipClient {
    /// Create an adapter for the given interpreter.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> DepfixResult<RawOutput> {
        debug!("running {} {}", self.python.display(), args.join(" "));
        let output = Command::new(&self.python)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| {
                DepfixError::execution(format!(
                    "failed to spawn {}: {}",
                    self.python.display(),
                    err
                ))
            })?;
        Ok(RawOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Capture the enumerator's JSON tree for the interpreter's
    /// environment.
    pub async fn dependency_tree(&self) -> DepfixResult<String> {
        let raw = self.run(&["-m", "pipdeptree", "--json-tree"]).await?;
        if !raw.success() {
            return Err(DepfixError::execution(format!(
                "pipdeptree exited with status {}: {}",
                raw.code,
                raw.stderr.trim()
            )));
        }
        if raw.stdout.trim().is_empty() {
            warn!("the enumerator reported no installed packages");
            return Ok("[]".to_string());
        }
        Ok(raw.stdout)
    }

    /// Run `pip check` and parse whatever breakage it reports. pip exits
    /// non-zero when it finds problems, so the exit code is not an error
    /// here.
    pub async fn check(&self) -> DepfixResult<Vec<Conflict>> {
        let raw = self.run(&["-m", "pip", "check"]).await?;
        let mut combined = raw.stdout;
        combined.push('\n');
        combined.push_str(&raw.stderr);
        Ok(parse_check_output(&combined))
    }

    /// List installed packages with newer releases available.
    pub async fn list_outdated(&self) -> DepfixResult<Vec<OutdatedPackage>> {
        let raw = self
            .run(&["-m", "pip", "list", "--outdated", "--format", "json"])
            .await?;
        if !raw.success() {
            return Err(DepfixError::execution(format!(
                "pip list --outdated exited with status {}: {}",
                raw.code,
                raw.stderr.trim()
            )));
        }
        Ok(serde_json::from_str(&raw.stdout)?)
    }
}

#[async_trait]
impl PackageManager for PipClient {
    async fn uninstall(&self, name: &str) -> DepfixResult<CommandOutput> {
        Ok(self
            .run(&["-m", "pip", "uninstall", "-y", name])
            .await?
            .combined())
    }

    async fn install(&self, name: &str, version: &Version) -> DepfixResult<CommandOutput> {
        let requirement = format!("{}=={}", name, version);
        Ok(self
            .run(&["-m", "pip", "install", &requirement])
            .await?
            .combined())
    }

    async fn list_installed(&self) -> DepfixResult<Vec<(String, String)>> {
        let raw = self.run(&["-m", "pip", "list", "--format", "json"]).await?;
        if !raw.success() {
            return Err(DepfixError::execution(format!(
                "pip list exited with status {}: {}",
                raw.code,
                raw.stderr.trim()
            )));
        }
        let listed: Vec<ListedPackage> = serde_json::from_str(&raw.stdout)?;
        Ok(listed
            .into_iter()
            .map(|package| (normalize_name(&package.name), package.version))
            .collect())
    }
}

/// Parse `pip check` output into conflict records. Lines that do not
/// match the known shape are skipped.
pub fn parse_check_output(output: &str) -> Vec<Conflict> {
    output
        .lines()
        .filter_map(|line| parse_check_line(line.trim()))
        .collect()
}

// Example line:
// requests 2.26.0 requires urllib3<1.27,>=1.21.1, but you have urllib3 2.2.0.
fn parse_check_line(line: &str) -> Option<Conflict> {
    let (left, have) = line.split_once(", but you have ")?;
    let (package_part, requirement_part) = left.split_once(" requires ")?;
    let (parent, parent_version) = package_part.trim().split_once(' ')?;
    let (dependency_raw, installed_raw) = have.trim().trim_end_matches('.').split_once(' ')?;

    // the requirement text glues the name to the specifiers; sometimes it
    // also carries extras or markers after a space, which we drop
    let requirement_part = requirement_part.trim();
    let constraint = match requirement_part.split_once(' ') {
        Some((head, _)) => head,
        None => requirement_part,
    };
    let constraint = constraint.strip_prefix(dependency_raw).unwrap_or(constraint);

    Some(Conflict {
        parent: normalize_name(parent),
        parent_version: InstalledVersion::parse(parent_version),
        dependency: normalize_name(dependency_raw),
        installed: Some(InstalledVersion::parse(installed_raw)),
        required: SpecifierSet::parse(constraint),
        kind: ConflictKind::VersionMismatch,
    })
}
