use anyhow::{Context, Result, bail};
use apkname_sdk::packaging::plan_variants;
use apkname_sdk::probe::{ChainProbe, EnvProbe, FixedProbe, GradleFileProbe, VersionProbe};
use apkname_sdk::{ApkNamer, ResolveReport, ToolchainProbe};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use config::{ApknameConfig, CONFIG_FILE_NAME, ConfigResolver};

mod config;

/// Resolves the file names of the APKs an Android build produces.
#[derive(Parser, Debug)]
#[command(name = "apkname", author, version, about = "APK output naming resolver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the toolchain and name every APK output of every build type.
    Resolve {
        #[arg(long, help = "Path to apkname.toml (discovered when omitted)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Android Gradle plugin version; skips probing")]
        agp_version: Option<String>,
        #[arg(long, help = "Project-wide version name")]
        version_name: Option<String>,
        #[arg(long, help = "Product prefix of the file names")]
        prefix: Option<String>,
        #[arg(long, help = "Enable per-ABI APK splits")]
        splits: bool,
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
        #[arg(long, short)]
        verbose: bool,
    },
    /// Report the detected Android Gradle plugin version and API shape.
    Probe {
        #[arg(long, help = "Path to apkname.toml (discovered when omitted)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Android Gradle plugin version; skips probing")]
        agp_version: Option<String>,
    },
    /// Print the file name for one version name and build type.
    Name {
        version_name: String,
        build_type: String,
        #[arg(long, help = "Product prefix of the file name")]
        prefix: Option<String>,
    },
    /// Scaffold a starter apkname.toml.
    Init {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,
        #[arg(long, default_value = apkname_sdk::PRODUCT_PREFIX)]
        prefix: String,
        #[arg(long, help = "Write only the settings, without explanatory comments")]
        minimal: bool,
    },
}

fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    match cli.command {
        Command::Resolve {
            config,
            agp_version,
            version_name,
            prefix,
            splits,
            json,
            verbose,
        } => {
            let resolver = ConfigResolver::new(config.as_deref())?;
            let report = cmd_resolve(
                &resolver,
                ResolveOverrides {
                    agp_version,
                    version_name,
                    prefix,
                    splits,
                },
                verbose && !json,
            )?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report);
            }
        }
        Command::Probe {
            config,
            agp_version,
        } => {
            let resolver = ConfigResolver::new(config.as_deref())?;
            for line in cmd_probe(&resolver, agp_version)?.lines() {
                println!("{}", line);
            }
        }
        Command::Name {
            version_name,
            build_type,
            prefix,
        } => {
            let namer = prefix.map(ApkNamer::new).unwrap_or_default();
            println!("{}", namer.file_name(&version_name, &build_type));
        }
        Command::Init {
            output,
            prefix,
            minimal,
        } => {
            cmd_init(&output, &prefix, minimal)?;
            println!("Wrote starter config to {:?}", output);
        }
    }

    Ok(())
}

/// CLI values that take precedence over `apkname.toml`.
#[derive(Debug, Default)]
struct ResolveOverrides {
    agp_version: Option<String>,
    version_name: Option<String>,
    prefix: Option<String>,
    splits: bool,
}

fn cmd_resolve(
    resolver: &ConfigResolver,
    overrides: ResolveOverrides,
    verbose: bool,
) -> Result<ResolveReport> {
    let settings = resolver.settings();
    let prefix = resolver.resolve(
        overrides.prefix,
        |c| Some(c.project.product_prefix.clone()),
        apkname_sdk::PRODUCT_PREFIX.to_string(),
    );
    let default_version = overrides
        .version_name
        .or_else(|| settings.project.version_name.clone());

    let mut splits = settings.android.splits.clone();
    if overrides.splits {
        splits.enabled = true;
    }

    if verbose {
        if let Some(path) = &resolver.config_path {
            println!("Using config {:?}", path);
        }
        println!(
            "Application {} (compileSdk {}, minSdk {}, targetSdk {}, Java {})",
            settings.android.application_id(),
            settings.android.compile_sdk,
            settings.android.min_sdk,
            settings.android.target_sdk,
            settings.android.java_target
        );
        println!(
            "  versionName={}, versionCode={}",
            default_version.as_deref().unwrap_or("<unset>"),
            settings
                .project
                .version_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );
        println!("  ABIs: {}", settings.android.abis.join(", "));
    }

    let mut variants = plan_variants(&settings.variants, &settings.android.abis, &splits)
        .context("Failed to plan build variants")?;

    let probe = build_probe(resolver, overrides.agp_version)?;
    if verbose {
        println!("Probing toolchain via {}", probe.source());
    }

    let report = apkname_sdk::resolve(
        &probe,
        &mut variants,
        default_version.as_deref(),
        &ApkNamer::new(prefix),
        verbose,
    );

    if !report.probe_succeeded {
        eprintln!(
            "Warning: Android Gradle plugin version could not be determined, assuming {} ({} variant API).",
            report.toolchain_version,
            report.shape.as_str()
        );
    }
    for collision in &report.collisions {
        eprintln!(
            "Warning: {} outputs share the file name {}; the name ignores the ABI.",
            collision.outputs, collision.file_name
        );
    }

    Ok(report)
}

/// What `apkname probe` found: the answering source, if any, and the outcome.
#[derive(Debug)]
struct ToolchainSummary {
    detected: Option<(String, String)>,
    outcome: VersionProbe,
}

impl ToolchainSummary {
    fn lines(&self) -> Vec<String> {
        let first = match &self.detected {
            Some((source, version)) => format!("Detected AGP {} from {}", version.trim(), source),
            None => format!("AGP version: {}", self.outcome),
        };
        vec![first, format!("API shape: {}", self.outcome.shape().as_str())]
    }
}

fn cmd_probe(resolver: &ConfigResolver, agp_version: Option<String>) -> Result<ToolchainSummary> {
    let probe = build_probe(resolver, agp_version)?;
    Ok(ToolchainSummary {
        detected: probe.detect(),
        outcome: VersionProbe::run(&probe),
    })
}

/// Builds the probe chain: pinned version, then environment, then Gradle scripts.
fn build_probe(resolver: &ConfigResolver, agp_version: Option<String>) -> Result<ChainProbe> {
    let settings = resolver.settings();
    let mut chain = ChainProbe::new();

    if let Some(version) = agp_version.or_else(|| settings.toolchain.agp_version.clone()) {
        chain = chain.with(FixedProbe::detected(version));
    }

    chain = chain
        .with(EnvProbe::new(settings.toolchain.version_env))
        .with(GradleFileProbe::new(resolver.android_dir()?));
    Ok(chain)
}

fn cmd_init(output: &Path, prefix: &str, minimal: bool) -> Result<()> {
    ensure_can_write(output)?;
    if minimal {
        return ApknameConfig::starter(prefix).save_to_file(output);
    }
    fs::write(output, ApknameConfig::generate_starter_toml(prefix))
        .with_context(|| format!("writing file {:?}", output))
}

fn print_report(report: &ResolveReport) {
    println!(
        "AGP {} -> {} variant API",
        report.toolchain_version,
        report.shape.as_str()
    );
    if report.artifacts.is_empty() {
        println!("No APK outputs to name.");
        return;
    }
    for artifact in &report.artifacts {
        println!(
            "  {} [{}] -> {}",
            artifact.variant, artifact.output, artifact.file_name
        );
    }
}

fn load_dotenv() {
    if let Ok(cwd) = std::env::current_dir() {
        let _ = dotenvy::from_path(cwd.join(".env.local"));
    }
}

fn ensure_can_write(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file: {:?}", path);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {:?}", parent))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apkname_sdk::ApiShape;
    use apkname_sdk::packaging::SplitConfig;
    use tempfile::TempDir;

    fn resolver_with(config: ApknameConfig, dir: &Path) -> ConfigResolver {
        ConfigResolver {
            config: Some(config),
            config_path: Some(dir.join(CONFIG_FILE_NAME)),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn resolves_release_and_debug_names() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ApknameConfig::default();
        config.variants[1].version_name = Some("2.3.0".to_string());
        config.project.version_name = Some("0.0.0".to_string());

        let report = cmd_resolve(
            &resolver_with(config, temp_dir.path()),
            ResolveOverrides {
                agp_version: Some("8.1.0".to_string()),
                ..ResolveOverrides::default()
            },
            false,
        )
        .unwrap();

        assert_eq!(report.shape, ApiShape::Modern);
        let names: Vec<_> = report
            .artifacts
            .iter()
            .map(|a| a.file_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Uchet_finansov-0.0.0-debug.apk",
                "Uchet_finansov-2.3.0-release.apk"
            ]
        );
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ApknameConfig::starter("FromConfig");
        config.toolchain.agp_version = Some("8.2.0".to_string());

        let report = cmd_resolve(
            &resolver_with(config, temp_dir.path()),
            ResolveOverrides {
                agp_version: Some("7.4.2".to_string()),
                version_name: Some("5.0.0".to_string()),
                prefix: Some("FromCli".to_string()),
                splits: false,
            },
            false,
        )
        .unwrap();

        assert_eq!(report.shape, ApiShape::Legacy);
        assert_eq!(report.toolchain_version, "7.4.2");
        assert_eq!(report.artifacts[0].file_name, "FromCli-5.0.0-debug.apk");
    }

    #[test]
    fn probes_gradle_scripts_next_to_config() {
        let temp_dir = TempDir::new().unwrap();
        let android_dir = temp_dir.path().join("android");
        fs::create_dir_all(&android_dir).unwrap();
        fs::write(
            android_dir.join("settings.gradle.kts"),
            "plugins {\n    id(\"com.android.application\") version \"7.3.1\" apply false\n}\n",
        )
        .unwrap();

        let mut config = ApknameConfig::default();
        // Point the environment probe at a variable that is never set.
        config.toolchain.version_env = "APKNAME_TEST_UNSET_AGP_VERSION".to_string();

        let report = cmd_resolve(
            &resolver_with(config, temp_dir.path()),
            ResolveOverrides::default(),
            false,
        )
        .unwrap();
        assert_eq!(report.shape, ApiShape::Legacy);
        assert_eq!(report.toolchain_version, "7.3.1");
        assert!(report.probe_succeeded);
    }

    #[test]
    fn reports_pinned_toolchain_version() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ApknameConfig::default();
        config.toolchain.version_env = "APKNAME_TEST_UNSET_AGP_VERSION".to_string();

        let summary = cmd_probe(
            &resolver_with(config, temp_dir.path()),
            Some("7.4.2".to_string()),
        )
        .unwrap();

        assert_eq!(
            summary.detected,
            Some(("pinned version".to_string(), "7.4.2".to_string()))
        );
        assert_eq!(summary.outcome.shape(), ApiShape::Legacy);
        assert_eq!(
            summary.lines(),
            vec![
                "Detected AGP 7.4.2 from pinned version".to_string(),
                "API shape: legacy".to_string()
            ]
        );
    }

    #[test]
    fn reports_unknown_toolchain_as_modern() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ApknameConfig::default();
        config.toolchain.version_env = "APKNAME_TEST_UNSET_AGP_VERSION".to_string();

        let summary = cmd_probe(&resolver_with(config, temp_dir.path()), None).unwrap();

        assert_eq!(summary.detected, None);
        assert_eq!(summary.outcome, VersionProbe::Unavailable);
        let lines = summary.lines();
        assert!(lines[0].starts_with("AGP version: unavailable"));
        assert_eq!(lines[1], "API shape: modern");
    }

    #[test]
    fn missing_toolchain_information_assumes_modern() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ApknameConfig::default();
        config.toolchain.version_env = "APKNAME_TEST_UNSET_AGP_VERSION".to_string();

        let report = cmd_resolve(
            &resolver_with(config, temp_dir.path()),
            ResolveOverrides::default(),
            false,
        )
        .unwrap();
        assert_eq!(report.shape, ApiShape::Modern);
        assert!(!report.probe_succeeded);
        assert_eq!(report.artifacts[0].file_name, "Uchet_finansov-0.0.0-debug.apk");
    }

    #[test]
    fn split_flag_reports_collisions() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ApknameConfig::default();
        config.android.splits = SplitConfig::default();

        let report = cmd_resolve(
            &resolver_with(config, temp_dir.path()),
            ResolveOverrides {
                agp_version: Some("8.7.0".to_string()),
                splits: true,
                ..ResolveOverrides::default()
            },
            false,
        )
        .unwrap();

        // Two ABI splits plus the universal APK for each build type.
        assert_eq!(report.artifacts.len(), 6);
        assert_eq!(report.collisions.len(), 2);
        assert!(report.collisions.iter().all(|c| c.outputs == 3));
    }

    #[test]
    fn invalid_variants_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ApknameConfig::default();
        config.android.abis = vec!["mips".to_string()];

        let err = cmd_resolve(
            &resolver_with(config, temp_dir.path()),
            ResolveOverrides::default(),
            false,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("unknown ABI 'mips'"));
    }

    #[test]
    fn init_writes_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        for (file, minimal) in [("commented.toml", false), ("minimal.toml", true)] {
            let path = temp_dir.path().join(file);
            cmd_init(&path, "Ledger", minimal).unwrap();
            let config = ApknameConfig::load_from_file(&path).unwrap();
            assert_eq!(config.project.product_prefix, "Ledger");
            assert!(cmd_init(&path, "Ledger", minimal).is_err());
        }
    }

    #[test]
    fn ensure_can_write_refuses_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "").unwrap();
        assert!(ensure_can_write(&path).is_err());
        assert!(ensure_can_write(&temp_dir.path().join("nested/apkname.toml")).is_ok());
    }
}
