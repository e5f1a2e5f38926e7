//! Core types for apkname-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`NamingError`] - Error types for configuration and report rendering
//! - [`ApiShape`] - Which variant API surface of the Android Gradle plugin to drive
//! - [`VariantSpec`] - A configured build type (name plus optional version name)
//! - [`BuildVariant`] / [`VariantOutput`] - The build description the resolver names
//! - [`NamedArtifact`] - One computed file name, as reported back to callers
//! - [`ResolveReport`] - Everything one resolution run decided

use serde::{Deserialize, Serialize};

/// Error types for apkname-sdk operations.
///
/// The naming operations themselves are total and never fail. Errors only
/// come from validating the build description and from rendering reports.
#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    /// A configuration error occurred.
    ///
    /// This indicates an invalid build description, such as an empty or
    /// duplicated build type name, or an unknown ABI in the split settings.
    #[error("configuration error: {0}. Check apkname.toml or CLI flags")]
    Config(String),

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Variant API surface exposed by the Android Gradle plugin.
///
/// The two surfaces are mutually incompatible, so exactly one is chosen per
/// run (see [`crate::probe::resolve_environment_api_shape`]). The computed
/// file names are identical for both.
///
/// # Example
///
/// ```
/// use apkname_sdk::ApiShape;
///
/// assert_eq!(ApiShape::Modern.as_str(), "modern");
/// assert_eq!(ApiShape::Legacy.as_str(), "legacy");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiShape {
    /// AGP 8 and newer: `androidComponents { onVariants { .. } }`.
    Modern,
    /// AGP 7.x and older: `android.applicationVariants.all { .. }`.
    Legacy,
}

impl ApiShape {
    /// Returns the string representation of the shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiShape::Modern => "modern",
            ApiShape::Legacy => "legacy",
        }
    }
}

/// A build type as declared in configuration.
///
/// # Example
///
/// ```
/// use apkname_sdk::VariantSpec;
///
/// let release = VariantSpec::new("release").with_version_name("2.3.0");
/// assert_eq!(release.version_name.as_deref(), Some("2.3.0"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// Build type name, e.g. `debug` or `release`.
    pub name: String,
    /// Version name specific to this build type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_name: None,
        }
    }

    pub fn with_version_name(mut self, version_name: impl Into<String>) -> Self {
        self.version_name = Some(version_name.into());
        self
    }

    /// The `debug` and `release` build types every Android project declares.
    pub fn defaults() -> Vec<Self> {
        vec![Self::new("debug"), Self::new("release")]
    }
}

/// Kind of artifact a variant output produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// An installable package. Only these outputs are renamed.
    Apk,
    /// An app bundle. Left untouched by the resolver.
    Bundle,
}

/// Which slice of the native libraries an output carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFilter {
    /// The single output of a variant built without ABI splits.
    Main,
    /// One ABI split, e.g. `arm64-v8a`.
    Abi(String),
    /// The universal APK produced next to the ABI splits.
    Universal,
}

impl OutputFilter {
    /// Human-readable label used in reports.
    pub fn label(&self) -> &str {
        match self {
            OutputFilter::Main => "main",
            OutputFilter::Abi(abi) => abi,
            OutputFilter::Universal => "universal",
        }
    }
}

/// One declared output of a build variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantOutput {
    pub kind: OutputKind,
    pub filter: OutputFilter,
    /// Version name carried by the output itself. The component API exposes
    /// this per output, defaulting to the variant's version name.
    pub version_name: Option<String>,
    /// The slot the resolver writes into.
    pub file_name: Option<String>,
}

impl VariantOutput {
    pub fn apk(filter: OutputFilter) -> Self {
        Self {
            kind: OutputKind::Apk,
            filter,
            version_name: None,
            file_name: None,
        }
    }

    pub fn bundle() -> Self {
        Self {
            kind: OutputKind::Bundle,
            filter: OutputFilter::Main,
            version_name: None,
            file_name: None,
        }
    }

    pub fn is_apk(&self) -> bool {
        self.kind == OutputKind::Apk
    }
}

/// A build variant with its declared outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildVariant {
    /// Build type name, e.g. `debug` or `release`.
    pub name: String,
    pub version_name: Option<String>,
    /// Target ABIs. Used by packaging only, never by naming.
    pub architectures: Vec<String>,
    pub outputs: Vec<VariantOutput>,
}

impl BuildVariant {
    /// Creates a variant with a single main APK output.
    pub fn new(name: impl Into<String>, version_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            version_name,
            architectures: Vec::new(),
            outputs: vec![VariantOutput::apk(OutputFilter::Main)],
        }
    }
}

/// A file name assigned to one variant output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedArtifact {
    pub variant: String,
    pub output: String,
    pub file_name: String,
}

/// A file name shared by several outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub file_name: String,
    pub outputs: usize,
}

/// Outcome of one resolution run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub shape: ApiShape,
    /// Version the shape was chosen from; the fallback when the probe failed.
    pub toolchain_version: String,
    pub probe_succeeded: bool,
    pub artifacts: Vec<NamedArtifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<NameCollision>,
}

impl ResolveReport {
    /// Renders the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, NamingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
