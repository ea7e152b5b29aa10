#![warn(missing_docs)]
//! keccak-bench CLI Library
//!
//! Command-line entry point of the harness. Parses the selection flags,
//! measures every selected candidate in a fixed order, and prints one report.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     keccak_bench_cli::run()
//! }
//! ```
//!
//! Any failure aborts the run before a report is printed: a report silently
//! missing a candidate would be misleading.

mod config;
mod external;
mod planner;
mod toolchain;

#[cfg(all(test, unix))]
mod test_support;

pub use config::*;
pub use external::{ExternalRunner, RunError, reported_parameters, verify_parameters};
pub use planner::{ExecutionPlan, ExternalMode, PlannedCandidate, Selection, build_plan};
pub use toolchain::{
    CapabilityProbe, HelpTextProbe, Toolchain, ToolchainError, find_executable, flag_name,
};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use keccak_bench_core::{InProcessTimer, WorkloadParameters};
use keccak_bench_report::{CandidateResult, OutputFormat, render};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// keccak-bench CLI arguments
#[derive(Parser, Debug, Default)]
#[command(name = "keccak-bench")]
#[command(
    author,
    version,
    about = "Compare Keccak-256 throughput of library baselines and an external toolchain"
)]
pub struct Cli {
    /// Skip both external toolchain benchmarks
    #[arg(long)]
    pub skip_mojo: bool,

    /// Skip the external direct-run (JIT/interpreted) benchmark
    #[arg(long)]
    pub skip_jit: bool,

    /// Skip the external build-then-run benchmark
    #[arg(long)]
    pub skip_compiled: bool,

    /// Skip the sha3 crate baseline
    #[arg(long, visible_alias = "skip-eth-hash")]
    pub skip_sha3: bool,

    /// Skip the tiny-keccak crate baseline
    #[arg(long, visible_alias = "skip-pycryptodome")]
    pub skip_tiny_keccak: bool,

    /// Emit benchmark results as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Directory for compiled artifacts (default: .bench-build, relative to the root)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Harness root: include path for the toolchain and base for relative paths
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Configuration file (default: discover keccak-bench.toml upwards)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the execution plan without measuring anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write a default keccak-bench.toml into the root and exit
    #[arg(long)]
    pub init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Candidate selection encoded by the skip flags
    pub fn selection(&self) -> Selection {
        Selection {
            skip_sha3: self.skip_sha3,
            skip_tiny_keccak: self.skip_tiny_keccak,
            skip_external: self.skip_mojo,
            skip_direct: self.skip_jit,
            skip_compiled: self.skip_compiled,
        }
    }
}

/// Everything a run needs after flags and configuration are merged
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Harness root
    pub root: PathBuf,
    /// Build directory for compiled artifacts
    pub build_dir: PathBuf,
    /// Report format
    pub format: OutputFormat,
    /// External toolchain configuration
    pub toolchain: ToolchainConfig,
    /// Core to pin in-process measurement to
    pub pin_cpu: Option<usize>,
    /// Measured workload
    pub params: WorkloadParameters,
}

impl RunSettings {
    /// Merge CLI flags over configuration (CLI > config file > defaults).
    ///
    /// An unknown `output.format` is rejected even when `--json` overrides it.
    pub fn resolve(
        cli: &Cli,
        config: &BenchConfig,
        config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let root = cli
            .root
            .clone()
            .or_else(|| {
                config_path
                    .and_then(|p| p.parent())
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let build_dir = root.join(
            cli.build_dir
                .clone()
                .unwrap_or_else(|| config.output.build_dir.clone()),
        );

        let configured: OutputFormat = config
            .output
            .format
            .parse()
            .map_err(|reason| ConfigError::InvalidFormat { reason })?;
        let format = if cli.json {
            OutputFormat::Json
        } else {
            configured
        };

        Ok(Self {
            root,
            build_dir,
            format,
            toolchain: config.toolchain.clone(),
            pin_cpu: config.runner.pin_cpu,
            params: WorkloadParameters::DEFAULT,
        })
    }
}

/// Run the keccak-bench CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` once the report is printed, or the first fatal error.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the keccak-bench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    if cli.init_config {
        let dir = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let path = BenchConfig::write_default(&dir)?;
        tracing::info!(config = %path.display(), "wrote default configuration");
        return Ok(());
    }

    let (config, config_path) = match &cli.config {
        Some(path) => (BenchConfig::load(path)?, Some(path.clone())),
        None => BenchConfig::discover()?,
    };
    if let Some(path) = &config_path {
        tracing::debug!(config = %path.display(), "loaded configuration");
    }

    let settings = RunSettings::resolve(&cli, &config, config_path.as_deref())?;
    let plan = build_plan(&cli.selection());

    if cli.dry_run {
        print_plan(&plan, &settings);
        return Ok(());
    }

    let results = execute_plan(&plan, &settings)?;
    let output = render(&results, settings.format)?;
    println!("{}", output);
    Ok(())
}

/// Initialize logging on stderr; stdout is reserved for the report.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "keccak_bench=debug"
    } else {
        "keccak_bench=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialization (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_plan(plan: &ExecutionPlan, settings: &RunSettings) {
    println!("keccak-bench plan:");
    for candidate in &plan.candidates {
        match candidate {
            PlannedCandidate::Library(lib) if !lib.is_available() => println!(
                "├── {}  [unavailable: rebuild with --features {}]",
                candidate,
                lib.feature()
            ),
            _ => println!("├── {}", candidate),
        }
    }
    println!("{} candidate(s) selected.", plan.candidates.len());
    if plan.needs_toolchain() {
        println!(
            "toolchain: {}  source: {}  build dir: {}",
            settings.toolchain.program,
            settings.root.join(&settings.toolchain.source).display(),
            settings.build_dir.display()
        );
    }
}

/// Measure every planned candidate in order.
///
/// Library candidates and the toolchain are checked before anything is
/// measured, so a missing dependency fails fast.
pub fn execute_plan(
    plan: &ExecutionPlan,
    settings: &RunSettings,
) -> anyhow::Result<Vec<CandidateResult>> {
    for candidate in &plan.candidates {
        if let PlannedCandidate::Library(lib) = candidate {
            lib.resolve()?;
        }
    }

    let toolchain = Toolchain::new(settings.toolchain.program.clone());
    if plan.needs_toolchain() {
        toolchain.program()?;
    }
    let external = ExternalRunner::new(
        &toolchain,
        &settings.toolchain,
        settings.root.clone(),
        settings.params,
    );
    let timer = InProcessTimer::new(settings.params).with_pinned_cpu(settings.pin_cpu);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let mut results = Vec::with_capacity(plan.candidates.len());
    for candidate in &plan.candidates {
        spinner.set_message(format!("measuring {}", candidate));
        let result = match candidate {
            PlannedCandidate::Library(lib) => {
                let m = timer.run(lib.resolve()?);
                CandidateResult::new(lib.name(), m.elapsed, m.hashes, Some(m.checksum))
            }
            PlannedCandidate::External(ExternalMode::Direct) => external
                .run_direct()
                .with_context(|| format!("{} benchmark failed", external.direct_name()))?,
            PlannedCandidate::External(ExternalMode::Compiled) => external
                .run_compiled(&settings.build_dir)
                .with_context(|| format!("{} benchmark failed", external.compiled_name()))?,
        };
        tracing::info!(
            implementation = %result.implementation,
            seconds = result.seconds,
            hashes_per_second = result.hashes_per_second,
            "candidate measured"
        );
        results.push(result);
    }
    spinner.finish_and_clear();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(root: PathBuf) -> RunSettings {
        RunSettings::resolve(
            &Cli {
                root: Some(root),
                ..Default::default()
            },
            &BenchConfig::default(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_cli_accepts_legacy_flag_aliases() {
        let cli = Cli::try_parse_from([
            "keccak-bench",
            "--skip-eth-hash",
            "--skip-pycryptodome",
            "--skip-mojo",
            "--json",
        ])
        .unwrap();
        assert_eq!(
            cli.selection(),
            Selection {
                skip_sha3: true,
                skip_tiny_keccak: true,
                skip_external: true,
                ..Default::default()
            }
        );
        assert!(cli.json);
    }

    #[test]
    fn test_settings_precedence() {
        let mut config = BenchConfig::default();
        config.output.build_dir = PathBuf::from("from-config");
        config.output.format = "json".to_string();

        let cli = Cli::try_parse_from(["keccak-bench", "--root", "/work"]).unwrap();
        let s = RunSettings::resolve(&cli, &config, None).unwrap();
        assert_eq!(s.build_dir, PathBuf::from("/work/from-config"));
        assert_eq!(s.format, OutputFormat::Json);

        let cli = Cli::try_parse_from([
            "keccak-bench",
            "--root",
            "/work",
            "--build-dir",
            "/abs/out",
        ])
        .unwrap();
        let s = RunSettings::resolve(&cli, &config, None).unwrap();
        assert_eq!(s.build_dir, PathBuf::from("/abs/out"));
    }

    #[test]
    fn test_root_defaults_to_config_dir() {
        let cli = Cli::default();
        let path = PathBuf::from("/repo/keccak-bench.toml");
        let s = RunSettings::resolve(&cli, &BenchConfig::default(), Some(&path)).unwrap();
        assert_eq!(s.root, PathBuf::from("/repo"));
        assert_eq!(s.build_dir, PathBuf::from("/repo/.bench-build"));

        let s = RunSettings::resolve(&cli, &BenchConfig::default(), None).unwrap();
        assert_eq!(s.root, PathBuf::from("."));
        assert_eq!(s.format, OutputFormat::Table);
    }

    #[test]
    fn test_unknown_configured_format_is_fatal() {
        let mut config = BenchConfig::default();
        config.output.format = "yaml".to_string();

        for args in [&["keccak-bench"][..], &["keccak-bench", "--json"][..]] {
            let cli = Cli::try_parse_from(args).unwrap();
            let err = RunSettings::resolve(&cli, &config, None).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidFormat { .. }));
            assert!(err.to_string().contains("yaml"), "{}", err);
        }
    }

    #[test]
    fn test_init_config_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "keccak-bench",
            "--init-config",
            "--root",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        run_with_cli(cli).unwrap();

        let config = BenchConfig::load(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.toolchain.binary_name, "mojo_keccak_bench");
    }

    #[test]
    fn test_empty_plan_yields_no_results() {
        let plan = build_plan(&Selection {
            skip_sha3: true,
            skip_tiny_keccak: true,
            skip_external: true,
            ..Default::default()
        });
        let results = execute_plan(&plan, &settings(PathBuf::from("."))).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_toolchain_aborts_before_measuring() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path().to_path_buf());
        s.toolchain.program = dir.path().join("no-such-toolchain").display().to_string();

        let plan = build_plan(&Selection {
            skip_sha3: true,
            skip_tiny_keccak: true,
            ..Default::default()
        });
        let err = execute_plan(&plan, &s).unwrap_err();
        assert!(err.downcast_ref::<ToolchainError>().is_some(), "{:#}", err);
    }
}
