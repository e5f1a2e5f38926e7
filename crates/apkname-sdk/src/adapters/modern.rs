//! Adapter for the component variant API (AGP 8 and newer).

use super::{VariantAdapter, assign};
use crate::naming::{ApkNamer, resolve_version_name};
use crate::types::{ApiShape, BuildVariant, NamedArtifact};

/// Drives the `androidComponents { onVariants { .. } }` surface.
///
/// On this surface the version name lives on each output. The adapter reads
/// it from the first output; an output without its own value carries the
/// variant's version name.
#[derive(Debug, Clone, Default)]
pub struct ModernAdapter {
    verbose: bool,
}

impl ModernAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl VariantAdapter for ModernAdapter {
    fn shape(&self) -> ApiShape {
        ApiShape::Modern
    }

    fn apply(
        &self,
        variants: &mut [BuildVariant],
        default_version: Option<&str>,
        namer: &ApkNamer,
    ) -> Vec<NamedArtifact> {
        let mut named = Vec::new();

        for variant in variants.iter_mut() {
            let output_version = variant
                .outputs
                .first()
                .and_then(|output| output.version_name.as_deref())
                .filter(|version| !version.is_empty())
                .or(variant.version_name.as_deref());
            let version_name = resolve_version_name(output_version, default_version);
            let file_name = namer.file_name(&version_name, &variant.name);

            if self.verbose {
                println!(
                    "  onVariants({}): versionName={}, {} output(s)",
                    variant.name,
                    version_name,
                    variant.outputs.len()
                );
            }

            for output in variant.outputs.iter_mut().filter(|output| output.is_apk()) {
                named.push(assign(&variant.name, output, file_name.clone()));
            }
        }

        named
    }
}
