//! Configuration file support for apkname.
//!
//! Project settings live in `apkname.toml` so the build pipeline can invoke
//! `apkname resolve` without repeating flags.
//!
//! ## Configuration File Location
//!
//! The configuration file is searched for in the following order:
//! 1. Current working directory (`./apkname.toml`)
//! 2. Parent directories (up to the repository root or filesystem root)
//!
//! ## Example Configuration
//!
//! ```toml
//! [project]
//! product_prefix = "Uchet_finansov"
//! version_name = "2.3.0"
//! version_code = 23
//!
//! [android]
//! application_id = "com.example.finance_app"
//! min_sdk = 21
//! target_sdk = 35
//! abis = ["armeabi-v7a", "arm64-v8a"]
//!
//! [android.splits]
//! enabled = false
//! universal_apk = true
//!
//! [toolchain]
//! agp_version = "8.7.0"
//!
//! [[variants]]
//! name = "debug"
//!
//! [[variants]]
//! name = "release"
//! ```

use anyhow::{Context, Result, bail};
use apkname_sdk::packaging::{DEFAULT_ABIS, SplitConfig};
use apkname_sdk::probe::DEFAULT_VERSION_ENV;
use apkname_sdk::{PRODUCT_PREFIX, VariantSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "apkname.toml";

/// Root configuration structure for `apkname.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApknameConfig {
    /// Project-level configuration.
    pub project: ProjectConfig,

    /// Android application settings.
    pub android: AndroidConfig,

    /// Toolchain probing settings.
    pub toolchain: ToolchainConfig,

    /// Build types to name. Defaults to `debug` and `release`.
    pub variants: Vec<VariantSpec>,
}

impl Default for ApknameConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            android: AndroidConfig::default(),
            toolchain: ToolchainConfig::default(),
            variants: VariantSpec::defaults(),
        }
    }
}

/// Project-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Literal prefix of every APK file name.
    pub product_prefix: String,

    /// Project-wide version name, used by variants without their own.
    pub version_name: Option<String>,

    /// Project-wide version code.
    pub version_code: Option<u32>,

    /// Directory of the Android Gradle project, relative to the config file.
    pub android_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            product_prefix: PRODUCT_PREFIX.to_string(),
            version_name: None,
            version_code: None,
            android_dir: PathBuf::from("android"),
        }
    }
}

/// Android application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    /// Kotlin/Java namespace of the app module.
    pub namespace: String,

    /// Application ID. Defaults to the namespace.
    pub application_id: Option<String>,

    /// Defaults to 35.
    pub compile_sdk: u32,

    /// Defaults to 21 (Android 5.0).
    pub min_sdk: u32,

    /// Defaults to 35.
    pub target_sdk: u32,

    /// Java source and target compatibility. Defaults to "11".
    pub java_target: String,

    /// ABI filters for native libraries.
    pub abis: Vec<String>,

    /// Per-ABI APK splits.
    pub splits: SplitConfig,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            namespace: "com.example.finance_app".to_string(),
            application_id: None,
            compile_sdk: 35,
            min_sdk: 21,
            target_sdk: 35,
            java_target: "11".to_string(),
            abis: DEFAULT_ABIS.iter().map(|abi| abi.to_string()).collect(),
            splits: SplitConfig::default(),
        }
    }
}

impl AndroidConfig {
    pub fn application_id(&self) -> &str {
        self.application_id.as_deref().unwrap_or(&self.namespace)
    }

    /// Checks `min_sdk <= target_sdk <= compile_sdk`.
    pub fn validate(&self) -> Result<()> {
        if self.min_sdk > self.target_sdk {
            bail!(
                "android.min_sdk ({}) is greater than android.target_sdk ({})",
                self.min_sdk,
                self.target_sdk
            );
        }
        if self.target_sdk > self.compile_sdk {
            bail!(
                "android.target_sdk ({}) is greater than android.compile_sdk ({})",
                self.target_sdk,
                self.compile_sdk
            );
        }
        Ok(())
    }
}

/// Toolchain probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Pinned Android Gradle plugin version. Skips probing when set.
    pub agp_version: Option<String>,

    /// Environment variable holding the plugin version.
    pub version_env: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            agp_version: None,
            version_env: DEFAULT_VERSION_ENV.to_string(),
        }
    }
}

impl ApknameConfig {
    /// Loads configuration from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ApknameConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config
            .android
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        Ok(config)
    }

    /// Attempts to find and load configuration from the current directory
    /// or any parent directory.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded configuration with its path
    /// * `Ok(None)` - No configuration file found
    /// * `Err` - If a config file was found but couldn't be parsed
    pub fn discover() -> Result<Option<(Self, PathBuf)>> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&cwd)
    }

    /// Attempts to find and load configuration starting from the specified directory.
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }

            // Stop at repository root or filesystem root
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Saves the configuration to the specified file path.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Generates a starter configuration for the given product prefix.
    pub fn starter(product_prefix: &str) -> Self {
        Self {
            project: ProjectConfig {
                product_prefix: product_prefix.to_string(),
                version_name: Some("1.0.0".to_string()),
                version_code: Some(1),
                ..ProjectConfig::default()
            },
            ..Self::default()
        }
    }

    /// Generates a starter configuration file as a formatted TOML string.
    ///
    /// This includes comments explaining each configuration option.
    pub fn generate_starter_toml(product_prefix: &str) -> String {
        format!(
            r#"# apkname configuration file
# APK outputs are named <product_prefix>-<versionName>-<buildType>.apk
# CLI flags override these settings when provided.

[project]
# Literal prefix of every APK file name
product_prefix = "{product_prefix}"

# Version name used by build types without their own
version_name = "1.0.0"
version_code = 1

# Android Gradle project, relative to this file (default: android)
# android_dir = "android"

[android]
namespace = "com.example.finance_app"
# application_id = "com.example.finance_app"
compile_sdk = 35
min_sdk = 21
target_sdk = 35
java_target = "11"
abis = ["armeabi-v7a", "arm64-v8a"]

[android.splits]
# One APK per ABI. Every split of a variant gets the same file name.
enabled = false
include = ["armeabi-v7a", "arm64-v8a"]
universal_apk = true

[toolchain]
# Pin the Android Gradle plugin version instead of probing for it
# agp_version = "8.7.0"

# Environment variable consulted when no version is pinned
version_env = "{version_env}"

[[variants]]
name = "debug"

[[variants]]
name = "release"
# version_name = "1.0.0"
"#,
            product_prefix = product_prefix,
            version_env = DEFAULT_VERSION_ENV,
        )
    }
}

/// Configuration resolver that merges config file values with CLI arguments.
///
/// CLI arguments always take precedence over config file values.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    /// Loaded configuration, if any.
    pub config: Option<ApknameConfig>,

    /// Path to the loaded config file, if any.
    pub config_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Loads the given config file, or discovers one when `explicit` is `None`.
    pub fn new(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let config = ApknameConfig::load_from_file(path)?;
            return Ok(Self {
                config: Some(config),
                config_path: Some(path.to_path_buf()),
            });
        }

        match ApknameConfig::discover()? {
            Some((config, path)) => Ok(Self {
                config: Some(config),
                config_path: Some(path),
            }),
            None => Ok(Self::default()),
        }
    }

    /// Returns the loaded configuration, or the defaults.
    pub fn settings(&self) -> ApknameConfig {
        self.config.clone().unwrap_or_default()
    }

    /// Directory relative paths in the config are resolved against.
    pub fn base_dir(&self) -> Result<PathBuf> {
        match self
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
        {
            Some(dir) => Ok(dir.to_path_buf()),
            None => std::env::current_dir().context("Failed to get current directory"),
        }
    }

    /// Returns the Android project directory.
    pub fn android_dir(&self) -> Result<PathBuf> {
        Ok(self.base_dir()?.join(self.settings().project.android_dir))
    }

    /// Resolves a CLI value, using config as fallback.
    ///
    /// # Returns
    ///
    /// The resolved value, preferring CLI over config over default.
    pub fn resolve<T, F>(&self, cli_value: Option<T>, config_getter: F, default: T) -> T
    where
        F: FnOnce(&ApknameConfig) -> Option<T>,
    {
        cli_value
            .or_else(|| self.config.as_ref().and_then(config_getter))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ApknameConfig::default();
        assert_eq!(config.project.product_prefix, "Uchet_finansov");
        assert_eq!(config.project.version_name, None);
        assert_eq!(config.android.application_id(), "com.example.finance_app");
        assert_eq!(config.android.min_sdk, 21);
        assert_eq!(config.android.abis, vec!["armeabi-v7a", "arm64-v8a"]);
        assert!(!config.android.splits.enabled);
        assert_eq!(config.toolchain.version_env, "ANDROID_GRADLE_PLUGIN_VERSION");
        assert_eq!(
            config
                .variants
                .iter()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>(),
            vec!["debug", "release"]
        );
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let toml_content = r#"
[project]
product_prefix = "Ledger"
version_name = "3.0.0"

[android]
application_id = "com.test.ledger"
min_sdk = 24
abis = ["arm64-v8a"]

[android.splits]
enabled = true
include = ["arm64-v8a"]
universal_apk = false

[toolchain]
agp_version = "7.4.2"

[[variants]]
name = "release"
version_name = "3.0.1"
"#;
        std::fs::write(&config_path, toml_content).unwrap();

        let config = ApknameConfig::load_from_file(&config_path).unwrap();

        assert_eq!(config.project.product_prefix, "Ledger");
        assert_eq!(config.project.version_name.as_deref(), Some("3.0.0"));
        assert_eq!(config.android.application_id(), "com.test.ledger");
        assert_eq!(config.android.min_sdk, 24);
        assert_eq!(config.android.target_sdk, 35);
        assert!(config.android.splits.enabled);
        assert!(!config.android.splits.universal_apk);
        assert_eq!(config.toolchain.agp_version.as_deref(), Some("7.4.2"));
        assert_eq!(
            config.variants,
            vec![VariantSpec::new("release").with_version_name("3.0.1")]
        );
    }

    #[test]
    fn test_invalid_sdk_levels_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[android]\nmin_sdk = 36\n").unwrap();

        let err = ApknameConfig::load_from_file(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("min_sdk (36)"));
    }

    #[test]
    fn test_discover_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[project]\nproduct_prefix = \"Found\"\n").unwrap();

        let nested = temp_dir.path().join("android").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = ApknameConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.project.product_prefix, "Found");
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_no_config() {
        let temp_dir = TempDir::new().unwrap();
        // Create a .git directory to stop the search
        std::fs::create_dir(temp_dir.path().join(".git")).unwrap();

        let result = ApknameConfig::discover_from(temp_dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        ApknameConfig::starter("Roundtrip")
            .save_to_file(&config_path)
            .unwrap();
        let config = ApknameConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config.project.product_prefix, "Roundtrip");
        assert_eq!(config.project.version_name.as_deref(), Some("1.0.0"));
        assert_eq!(config.variants.len(), 2);
    }

    #[test]
    fn test_config_resolver() {
        let resolver = ConfigResolver {
            config: Some(ApknameConfig::starter("Starter")),
            config_path: None,
        };

        // CLI value takes precedence
        let prefix = resolver.resolve(
            Some("Cli".to_string()),
            |c| Some(c.project.product_prefix.clone()),
            PRODUCT_PREFIX.to_string(),
        );
        assert_eq!(prefix, "Cli");

        // Config value used when CLI is None
        let prefix = resolver.resolve(
            None,
            |c| Some(c.project.product_prefix.clone()),
            PRODUCT_PREFIX.to_string(),
        );
        assert_eq!(prefix, "Starter");

        // Default used without config
        let empty = ConfigResolver::default();
        let version: Option<String> =
            empty.resolve(None, |c| Some(c.project.version_name.clone()), None);
        assert_eq!(version, None);
    }

    #[test]
    fn test_android_dir_is_relative_to_config() {
        let resolver = ConfigResolver {
            config: Some(ApknameConfig::default()),
            config_path: Some(PathBuf::from("/work/app/apkname.toml")),
        };
        assert_eq!(
            resolver.android_dir().unwrap(),
            PathBuf::from("/work/app/android")
        );
    }

    #[test]
    fn test_generate_starter_toml() {
        let toml = ApknameConfig::generate_starter_toml("Uchet_finansov");
        assert!(toml.contains("product_prefix = \"Uchet_finansov\""));
        assert!(toml.contains("version_env = \"ANDROID_GRADLE_PLUGIN_VERSION\""));

        let config: ApknameConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config.project.product_prefix, "Uchet_finansov");
        assert_eq!(config.variants.len(), 2);
        assert!(config.android.validate().is_ok());
    }
}
