//! Variant API adapters.
//!
//! The Android Gradle plugin exposes build variants through two incompatible
//! surfaces. Each adapter drives one of them: it reads the inputs the naming
//! functions need and writes the computed name back onto every APK output.
//!
//! ## Adapters
//!
//! | Adapter | Shape | Surface |
//! |---------|-------|---------|
//! | [`ModernAdapter`] | [`ApiShape::Modern`] | `androidComponents.onVariants`, version read from the variant's outputs |
//! | [`LegacyAdapter`] | [`ApiShape::Legacy`] | `applicationVariants.all`, version read from the variant itself |
//!
//! Both delegate to [`resolve_version_name`](crate::naming::resolve_version_name)
//! and [`ApkNamer::file_name`], so for the same inputs they assign identical
//! names. Non-APK outputs (app bundles) are left untouched.
//!
//! ## Example
//!
//! ```
//! use apkname_sdk::adapters::apply_naming_to_variants;
//! use apkname_sdk::{ApiShape, ApkNamer, BuildVariant};
//!
//! let mut variants = vec![BuildVariant::new("release", Some("2.3.0".to_string()))];
//! let named = apply_naming_to_variants(
//!     ApiShape::Modern,
//!     &mut variants,
//!     Some("0.0.0"),
//!     &ApkNamer::default(),
//! );
//! assert_eq!(named[0].file_name, "Uchet_finansov-2.3.0-release.apk");
//! ```

pub mod legacy;
pub mod modern;

pub use legacy::LegacyAdapter;
pub use modern::ModernAdapter;

use crate::naming::ApkNamer;
use crate::types::{ApiShape, BuildVariant, NamedArtifact, VariantOutput};

/// Names the outputs of build variants through one variant API surface.
pub trait VariantAdapter {
    /// The API shape this adapter drives.
    fn shape(&self) -> ApiShape;

    /// Assigns a file name to every APK output and reports each assignment,
    /// in variant order then output order.
    ///
    /// `default_version` is the project-wide version name.
    fn apply(
        &self,
        variants: &mut [BuildVariant],
        default_version: Option<&str>,
        namer: &ApkNamer,
    ) -> Vec<NamedArtifact>;
}

/// Returns the adapter for `shape`.
pub fn adapter_for(shape: ApiShape, verbose: bool) -> Box<dyn VariantAdapter> {
    match shape {
        ApiShape::Modern => Box::new(ModernAdapter::new().verbose(verbose)),
        ApiShape::Legacy => Box::new(LegacyAdapter::new().verbose(verbose)),
    }
}

/// Names every APK output of `variants` through the adapter for `shape`.
pub fn apply_naming_to_variants(
    shape: ApiShape,
    variants: &mut [BuildVariant],
    default_version: Option<&str>,
    namer: &ApkNamer,
) -> Vec<NamedArtifact> {
    adapter_for(shape, false).apply(variants, default_version, namer)
}

/// Writes `file_name` into the output's naming slot.
fn assign(variant: &str, output: &mut VariantOutput, file_name: String) -> NamedArtifact {
    output.file_name = Some(file_name.clone());
    NamedArtifact {
        variant: variant.to_string(),
        output: output.filter.label().to_string(),
        file_name,
    }
}
