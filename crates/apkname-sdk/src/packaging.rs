//! Variant and output planning.
//!
//! Stands in for the packaging side of the Android build: it turns the
//! configured build types, ABI filters and split settings into the
//! [`BuildVariant`] list the resolver names.

use serde::{Deserialize, Serialize};

use crate::types::{BuildVariant, NamingError, OutputFilter, VariantOutput, VariantSpec};

/// ABI filters applied when none are configured.
pub const DEFAULT_ABIS: [&str; 2] = ["armeabi-v7a", "arm64-v8a"];

/// ABIs the Android NDK can target.
pub const KNOWN_ABIS: [&str; 4] = ["armeabi-v7a", "arm64-v8a", "x86", "x86_64"];

/// Per-ABI APK split settings.
///
/// # Example
///
/// ```
/// use apkname_sdk::packaging::{declare_outputs, SplitConfig};
///
/// let splits = SplitConfig { enabled: true, ..SplitConfig::default() };
/// // One APK per ABI plus the universal APK.
/// assert_eq!(declare_outputs(&splits).len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Produce one APK per ABI.
    pub enabled: bool,
    /// ABIs that get their own APK when splitting.
    pub include: Vec<String>,
    /// Also produce an APK containing every ABI.
    pub universal_apk: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            include: DEFAULT_ABIS.iter().map(|abi| abi.to_string()).collect(),
            universal_apk: true,
        }
    }
}

impl SplitConfig {
    /// Checks that enabled splits produce at least one APK from known ABIs.
    pub fn validate(&self) -> Result<(), NamingError> {
        if !self.enabled {
            return Ok(());
        }
        validate_abis(&self.include, "splits.include")?;
        if self.include.is_empty() && !self.universal_apk {
            return Err(NamingError::Config(
                "ABI splits are enabled but neither splits.include nor universal_apk \
                 produce an APK"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_abis(abis: &[String], field: &str) -> Result<(), NamingError> {
    for abi in abis {
        if !KNOWN_ABIS.contains(&abi.as_str()) {
            return Err(NamingError::Config(format!(
                "unknown ABI '{}' in {}. Supported ABIs: {}",
                abi,
                field,
                KNOWN_ABIS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Declares the APK outputs of one variant.
///
/// Without splits a variant has a single main output. With splits it has one
/// output per included ABI, in the declared order, followed by the universal
/// APK when requested.
pub fn declare_outputs(splits: &SplitConfig) -> Vec<VariantOutput> {
    if !splits.enabled {
        return vec![VariantOutput::apk(OutputFilter::Main)];
    }

    let mut outputs: Vec<VariantOutput> = splits
        .include
        .iter()
        .map(|abi| VariantOutput::apk(OutputFilter::Abi(abi.clone())))
        .collect();
    if splits.universal_apk {
        outputs.push(VariantOutput::apk(OutputFilter::Universal));
    }
    outputs
}

/// Builds the variant list from configured build types.
///
/// # Errors
///
/// Returns [`NamingError::Config`] for an empty or duplicated build type name,
/// an unknown ABI, or split settings that produce no APK.
pub fn plan_variants(
    specs: &[VariantSpec],
    abis: &[String],
    splits: &SplitConfig,
) -> Result<Vec<BuildVariant>, NamingError> {
    validate_abis(abis, "android.abis")?;
    splits.validate()?;

    let mut variants: Vec<BuildVariant> = Vec::with_capacity(specs.len());
    for spec in specs {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(NamingError::Config(
                "build type names must not be empty".to_string(),
            ));
        }
        if variants.iter().any(|v| v.name == name) {
            return Err(NamingError::Config(format!(
                "build type '{}' is declared more than once",
                name
            )));
        }

        variants.push(BuildVariant {
            name: name.to_string(),
            version_name: spec.version_name.clone(),
            architectures: abis.to_vec(),
            outputs: declare_outputs(splits),
        });
    }
    Ok(variants)
}
