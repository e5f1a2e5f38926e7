//! Toolchain version probing and API shape selection.
//!
//! The variant API of the Android Gradle plugin (AGP) changed incompatibly in
//! AGP 8. Before naming anything the resolver probes the plugin version and
//! picks exactly one [`ApiShape`] for the run.
//!
//! ## Failure policy
//!
//! Probing is best effort. A probe that fails for any reason (missing
//! variable, unreadable file, no declaration, malformed version) is replaced
//! by [`MODERN_FALLBACK_VERSION`], so a failed probe always selects
//! [`ApiShape::Modern`]. Shape resolution never returns an error.
//!
//! ## Probes
//!
//! | Probe | Source |
//! |-------|--------|
//! | [`FixedProbe`] | A pinned version (config or `--agp-version`) |
//! | [`EnvProbe`] | An environment variable, `ANDROID_GRADLE_PLUGIN_VERSION` by default |
//! | [`GradleFileProbe`] | Plugin declaration in the Android project's Gradle scripts |
//! | [`ChainProbe`] | First successful probe out of several |

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::ApiShape;

/// Version substituted when the probe fails.
pub const MODERN_FALLBACK_VERSION: &str = "8.0.0";

/// First AGP major version exposing the component variant API.
pub const MODERN_MAJOR: u32 = 8;

/// Environment variable read by [`EnvProbe::default`].
pub const DEFAULT_VERSION_ENV: &str = "ANDROID_GRADLE_PLUGIN_VERSION";

/// Gradle scripts searched by [`GradleFileProbe`], in order.
const GRADLE_SCRIPTS: [&str; 4] = [
    "settings.gradle.kts",
    "settings.gradle",
    "build.gradle.kts",
    "build.gradle",
];

const PLUGIN_ID: &str = "com.android.application";
const PLUGIN_CLASSPATH: &str = "com.android.tools.build:gradle:";

/// Reasons a toolchain probe can fail.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The version is not exposed by this source.
    #[error("toolchain version not available: {0}")]
    Unavailable(String),

    /// The source returned a value without a leading version number.
    #[error("malformed toolchain version '{0}'")]
    Malformed(String),

    /// Reading a Gradle script failed.
    #[error("I/O error while probing toolchain: {0}")]
    Io(#[from] std::io::Error),
}

/// A best-effort source of the Android Gradle plugin version.
pub trait ToolchainProbe {
    /// Short description of where the version comes from.
    fn source(&self) -> String;

    /// Reads the raw version string.
    fn toolchain_version(&self) -> Result<String, ProbeError>;
}

/// Outcome of running a probe once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionProbe {
    Detected(String),
    Unavailable,
}

impl VersionProbe {
    /// Runs `probe`, folding every failure into [`VersionProbe::Unavailable`].
    ///
    /// A value without a parseable leading number is a failure too.
    pub fn run(probe: &dyn ToolchainProbe) -> Self {
        match probe.toolchain_version() {
            Ok(version) if leading_major(&version).is_some() => {
                VersionProbe::Detected(version.trim().to_string())
            }
            _ => VersionProbe::Unavailable,
        }
    }

    /// The version the shape test runs against.
    pub fn effective_version(&self) -> &str {
        match self {
            VersionProbe::Detected(version) => version,
            VersionProbe::Unavailable => MODERN_FALLBACK_VERSION,
        }
    }

    /// Selects the API shape from the leading numeral of the effective version.
    pub fn shape(&self) -> ApiShape {
        match leading_major(self.effective_version()) {
            Some(major) if major < MODERN_MAJOR => ApiShape::Legacy,
            _ => ApiShape::Modern,
        }
    }
}

impl fmt::Display for VersionProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionProbe::Detected(version) => write!(f, "{}", version),
            VersionProbe::Unavailable => write!(
                f,
                "unavailable (assuming {})",
                MODERN_FALLBACK_VERSION
            ),
        }
    }
}

/// Parses the leading run of ASCII digits of a version string.
///
/// ```
/// use apkname_sdk::probe::leading_major;
///
/// assert_eq!(leading_major("8.1.0"), Some(8));
/// assert_eq!(leading_major("10.0.0-alpha01"), Some(10));
/// assert_eq!(leading_major("beta"), None);
/// ```
pub fn leading_major(version: &str) -> Option<u32> {
    let trimmed = version.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// Probes the toolchain and picks the API shape for this run.
///
/// Never fails: any probe failure resolves to [`ApiShape::Modern`].
pub fn resolve_environment_api_shape(probe: &dyn ToolchainProbe) -> ApiShape {
    VersionProbe::run(probe).shape()
}

/// A probe with a known answer.
#[derive(Debug, Clone)]
pub struct FixedProbe {
    version: Option<String>,
}

impl FixedProbe {
    pub fn detected(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
        }
    }

    /// A probe that always fails.
    pub fn unavailable() -> Self {
        Self { version: None }
    }
}

impl ToolchainProbe for FixedProbe {
    fn source(&self) -> String {
        "pinned version".to_string()
    }

    fn toolchain_version(&self) -> Result<String, ProbeError> {
        let version = self
            .version
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("no version pinned".to_string()))?;
        if leading_major(&version).is_none() {
            return Err(ProbeError::Malformed(version));
        }
        Ok(version)
    }
}

/// Looks up the value of an environment variable.
pub type EnvLookup = fn(&str) -> Result<String, std::env::VarError>;

/// Reads the version from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvProbe {
    var: String,
    lookup: EnvLookup,
}

impl EnvProbe {
    pub fn new(var: impl Into<String>) -> Self {
        Self::with_lookup(var, |name| std::env::var(name))
    }

    /// Reads the variable through `lookup` instead of the process environment.
    pub fn with_lookup(var: impl Into<String>, lookup: EnvLookup) -> Self {
        Self {
            var: var.into(),
            lookup,
        }
    }
}

impl Default for EnvProbe {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_ENV)
    }
}

impl ToolchainProbe for EnvProbe {
    fn source(&self) -> String {
        format!("${}", self.var)
    }

    fn toolchain_version(&self) -> Result<String, ProbeError> {
        match (self.lookup)(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(ProbeError::Unavailable(format!("{} is empty", self.var))),
            Err(e) => Err(ProbeError::Unavailable(format!("{}: {}", self.var, e))),
        }
    }
}

/// Reads the plugin version declared in an Android project's Gradle scripts.
///
/// Recognises the plugins block form
/// `id("com.android.application") version "8.1.0"` (Kotlin or Groovy
/// quoting) and the buildscript classpath form
/// `classpath("com.android.tools.build:gradle:7.4.2")`.
#[derive(Debug, Clone)]
pub struct GradleFileProbe {
    android_dir: PathBuf,
}

impl GradleFileProbe {
    pub fn new(android_dir: impl Into<PathBuf>) -> Self {
        Self {
            android_dir: android_dir.into(),
        }
    }

    fn scan_script(path: &Path) -> Result<Option<String>, ProbeError> {
        let contents = std::fs::read_to_string(path)?;
        // Interpolated declarations such as `gradle:$agp` are skipped.
        Ok(contents
            .lines()
            .filter_map(declared_version)
            .find(|version| leading_major(version).is_some()))
    }
}

impl ToolchainProbe for GradleFileProbe {
    fn source(&self) -> String {
        format!("Gradle scripts in {}", self.android_dir.display())
    }

    fn toolchain_version(&self) -> Result<String, ProbeError> {
        let mut searched = Vec::new();
        for script in GRADLE_SCRIPTS {
            let path = self.android_dir.join(script);
            if !path.is_file() {
                continue;
            }
            if let Some(version) = Self::scan_script(&path)? {
                return Ok(version);
            }
            searched.push(path.display().to_string());
        }

        if searched.is_empty() {
            return Err(ProbeError::Unavailable(format!(
                "no Gradle scripts found in {}",
                self.android_dir.display()
            )));
        }
        Err(ProbeError::Unavailable(format!(
            "no {} declaration in {}",
            PLUGIN_ID,
            searched.join(", ")
        )))
    }
}

/// Extracts the plugin version from one line of a Gradle script.
fn declared_version(line: &str) -> Option<String> {
    let line = line.trim();
    if line.starts_with("//") {
        return None;
    }

    if let Some(start) = line.find(PLUGIN_CLASSPATH) {
        let rest = &line[start + PLUGIN_CLASSPATH.len()..];
        let end = rest.find(['"', '\'']).unwrap_or(rest.len());
        let version = rest[..end].trim();
        return (!version.is_empty()).then(|| version.to_string());
    }

    if line.contains(PLUGIN_ID) {
        let (_, after) = line.split_once(" version ")?;
        return first_quoted(after).map(str::to_string);
    }

    None
}

fn first_quoted(text: &str) -> Option<&str> {
    let start = text.find(['"', '\''])?;
    let quote = text[start..].chars().next()?;
    let rest = &text[start + 1..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

/// Tries several probes in order; the first success wins.
#[derive(Default)]
pub struct ChainProbe {
    probes: Vec<Box<dyn ToolchainProbe>>,
}

impl ChainProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, probe: impl ToolchainProbe + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Runs the probes in order and reports which one answered.
    pub fn detect(&self) -> Option<(String, String)> {
        self.probes.iter().find_map(|probe| {
            probe
                .toolchain_version()
                .ok()
                .filter(|version| leading_major(version).is_some())
                .map(|version| (probe.source(), version))
        })
    }
}

impl ToolchainProbe for ChainProbe {
    fn source(&self) -> String {
        self.probes
            .iter()
            .map(|probe| probe.source())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn toolchain_version(&self) -> Result<String, ProbeError> {
        let mut last_error = ProbeError::Unavailable("no probes configured".to_string());
        for probe in &self.probes {
            match probe.toolchain_version() {
                Ok(version) if leading_major(&version).is_some() => return Ok(version),
                Ok(version) => last_error = ProbeError::Malformed(version),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}
