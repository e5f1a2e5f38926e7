//! APK output naming for Android builds.
//!
//! `apkname-sdk` computes deterministic file names for the installable
//! packages an Android build produces, one per variant output:
//!
//! ```text
//! <prefix>-<versionName>-<buildType>.apk
//! ```
//!
//! # Architecture
//!
//! - **Naming**: [`ApkNamer`], [`compute_file_name`] and [`resolve_version_name`],
//!   pure functions shared by every code path
//! - **Probe**: detects the Android Gradle plugin version and selects an [`ApiShape`],
//!   treating any failure as "modern"
//! - **Adapters**: one per variant API surface, both delegating to the naming functions
//! - **Packaging**: plans variants and their (optionally per-ABI) outputs from settings
//!
//! # Example
//!
//! ```
//! use apkname_sdk::probe::{FixedProbe, resolve_environment_api_shape};
//! use apkname_sdk::{ApkNamer, BuildVariant, apply_naming_to_variants};
//!
//! let shape = resolve_environment_api_shape(&FixedProbe::detected("8.1.0"));
//! let mut variants = vec![
//!     BuildVariant::new("debug", None),
//!     BuildVariant::new("release", Some("2.3.0".to_string())),
//! ];
//! let named = apply_naming_to_variants(shape, &mut variants, Some("0.0.0"), &ApkNamer::default());
//!
//! assert_eq!(named[0].file_name, "Uchet_finansov-0.0.0-debug.apk");
//! assert_eq!(named[1].file_name, "Uchet_finansov-2.3.0-release.apk");
//! ```

pub mod adapters;
pub mod naming;
pub mod packaging;
pub mod probe;
pub mod types;

pub use adapters::{VariantAdapter, adapter_for, apply_naming_to_variants};
pub use naming::{
    ApkNamer, FALLBACK_VERSION_NAME, PRODUCT_PREFIX, compute_file_name, find_name_collisions,
    resolve_version_name,
};
pub use probe::{ToolchainProbe, VersionProbe, resolve_environment_api_shape};
pub use types::{
    ApiShape, BuildVariant, NameCollision, NamedArtifact, NamingError, OutputFilter, OutputKind,
    ResolveReport, VariantOutput, VariantSpec,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs a full resolution: probes once, picks the adapter for the detected
/// shape, names every APK output and collects duplicate names.
pub fn resolve(
    probe: &dyn ToolchainProbe,
    variants: &mut [BuildVariant],
    default_version: Option<&str>,
    namer: &ApkNamer,
    verbose: bool,
) -> ResolveReport {
    let outcome = VersionProbe::run(probe);
    let shape = outcome.shape();
    let artifacts = adapter_for(shape, verbose).apply(variants, default_version, namer);
    let collisions = find_name_collisions(&artifacts);

    ResolveReport {
        shape,
        toolchain_version: outcome.effective_version().to_string(),
        probe_succeeded: matches!(outcome, VersionProbe::Detected(_)),
        artifacts,
        collisions,
    }
}
