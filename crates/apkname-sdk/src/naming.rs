//! APK file name computation.
//!
//! Every produced package is named `<prefix>-<versionName>-<buildType>.apk`.
//! The name depends only on the resolved version name and the build type
//! name: never on time, filesystem state, or the ABI list.
//!
//! Inputs are not sanitised. A version name containing `/` or other
//! path-hostile characters ends up in the file name verbatim; callers that
//! accept untrusted version names must clean them first.

use std::collections::BTreeMap;

use crate::types::{NameCollision, NamedArtifact};

/// Product prefix used when none is configured.
pub const PRODUCT_PREFIX: &str = "Uchet_finansov";

/// Terminal default of the version name chain.
pub const FALLBACK_VERSION_NAME: &str = "0.0.0";

/// Computes APK file names for a fixed product prefix.
///
/// # Example
///
/// ```
/// use apkname_sdk::ApkNamer;
///
/// let namer = ApkNamer::new("Ledger");
/// assert_eq!(namer.file_name("1.0.0", "release"), "Ledger-1.0.0-release.apk");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkNamer {
    prefix: String,
}

impl ApkNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns `<prefix>-<version_name>-<build_type>.apk`.
    ///
    /// Total over all inputs: empty strings yield a degenerate but
    /// well-formed name such as `Prefix--debug.apk`.
    pub fn file_name(&self, version_name: &str, build_type: &str) -> String {
        format!("{}-{}-{}.apk", self.prefix, version_name, build_type)
    }
}

impl Default for ApkNamer {
    fn default() -> Self {
        Self::new(PRODUCT_PREFIX)
    }
}

/// Computes the file name with the default [`PRODUCT_PREFIX`].
pub fn compute_file_name(version_name: &str, build_type: &str) -> String {
    ApkNamer::default().file_name(version_name, build_type)
}

/// Resolves a version name through the chain: per-variant value, then the
/// project default, then [`FALLBACK_VERSION_NAME`].
///
/// Empty strings count as absent, so the result is never empty.
///
/// # Example
///
/// ```
/// use apkname_sdk::resolve_version_name;
///
/// assert_eq!(resolve_version_name(Some("1.2.3"), Some("9.9.9")), "1.2.3");
/// assert_eq!(resolve_version_name(None, Some("9.9.9")), "9.9.9");
/// assert_eq!(resolve_version_name(None, None), "0.0.0");
/// ```
pub fn resolve_version_name(per_variant: Option<&str>, fallback: Option<&str>) -> String {
    per_variant
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.filter(|v| !v.is_empty()))
        .unwrap_or(FALLBACK_VERSION_NAME)
        .to_string()
}

/// Returns every file name assigned to more than one output, with its count.
///
/// The name ignores the ABI, so enabling ABI splits makes all outputs of a
/// variant collide.
pub fn find_name_collisions(artifacts: &[NamedArtifact]) -> Vec<NameCollision> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for artifact in artifacts {
        *counts.entry(artifact.file_name.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(file_name, outputs)| NameCollision {
            file_name: file_name.to_string(),
            outputs,
        })
        .collect()
}
