//! Adapter for the application variant API (AGP 7.x and older).

use super::{VariantAdapter, assign};
use crate::naming::{ApkNamer, resolve_version_name};
use crate::types::{ApiShape, BuildVariant, NamedArtifact};

/// Drives the `android.applicationVariants.all { .. }` surface.
///
/// Here the version name is a property of the variant, and every output
/// visited through `outputs.all` that is an APK output gets renamed.
#[derive(Debug, Clone, Default)]
pub struct LegacyAdapter {
    verbose: bool,
}

impl LegacyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl VariantAdapter for LegacyAdapter {
    fn shape(&self) -> ApiShape {
        ApiShape::Legacy
    }

    fn apply(
        &self,
        variants: &mut [BuildVariant],
        default_version: Option<&str>,
        namer: &ApkNamer,
    ) -> Vec<NamedArtifact> {
        let mut named = Vec::new();

        for variant in variants.iter_mut() {
            let version_name =
                resolve_version_name(variant.version_name.as_deref(), default_version);
            let build_type = variant.name.clone();

            if self.verbose {
                println!(
                    "  applicationVariants({}): versionName={}",
                    build_type, version_name
                );
            }

            for output in variant.outputs.iter_mut() {
                if !output.is_apk() {
                    if self.verbose {
                        println!("    skipping non-APK output {}", output.filter.label());
                    }
                    continue;
                }
                let file_name = namer.file_name(&version_name, &build_type);
                named.push(assign(&build_type, output, file_name));
            }
        }

        named
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_adapter_verbose() {
        assert!(!LegacyAdapter::new().verbose);
        assert!(LegacyAdapter::new().verbose(true).verbose);
    }

    #[test]
    fn reads_version_from_variant() {
        // Output-level version names are not visible on this surface.
        let mut variant = BuildVariant::new("release", Some("1.0.0".to_string()));
        variant.outputs[0].version_name = Some("1.0.1".to_string());

        let named = LegacyAdapter::new().apply(&mut [variant], None, &ApkNamer::new("App"));
        assert_eq!(named[0].file_name, "App-1.0.0-release.apk");
    }

    #[test]
    fn falls_back_to_terminal_default() {
        let named = LegacyAdapter::new().apply(
            &mut [BuildVariant::new("debug", None)],
            None,
            &ApkNamer::new("App"),
        );
        assert_eq!(named[0].file_name, "App-0.0.0-debug.apk");
    }
}
