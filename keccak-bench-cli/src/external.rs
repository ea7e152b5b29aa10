//! External Candidates
//!
//! Runs the companion benchmark program through the external toolchain and
//! times the whole child process.
//!
//! ## Modes
//!
//! - **Direct-run** (`<program> (jit)`): `<program> -I <root> <source>`, one
//!   untimed warm-up invocation followed by one timed invocation.
//! - **Build-then-run** (`<program> (compiled)`): `<program> build -I <root>
//!   <source> -o <build_dir>/<binary> [opt_flag]`, then one timed run of the
//!   binary.
//!
//! The companion runs its own N x R loop. Its digests never reach the harness,
//! so external results carry no checksum.

use crate::config::ToolchainConfig;
use crate::toolchain::{Toolchain, ToolchainError, render_command};
use keccak_bench_core::{Stopwatch, WorkloadParameters};
use keccak_bench_report::CandidateResult;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::LazyLock;
use thiserror::Error;

/// Matches `workload key=value ...` lines printed by the companion.
static WORKLOAD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^workload((?:[ \t]+[a-z_]+=\d+)+)[ \t]*\r?$").expect("valid workload regex")
});

static WORKLOAD_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z_]+)=(\d+)").expect("valid field regex"));

/// External candidate failure
#[derive(Debug, Error)]
pub enum RunError {
    /// Toolchain lookup, validation or probing failed
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// The companion source file is missing
    #[error(
        "companion benchmark source not found at {}; pass --root or set `toolchain.source`",
        .path.display()
    )]
    MissingSource {
        /// Expected location
        path: PathBuf,
    },

    /// The build directory could not be created
    #[error("failed to create build directory {}: {source}", .path.display())]
    BuildDir {
        /// Directory that was requested
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A child process could not be started
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Command line that failed to start
        command: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The build subcommand exited unsuccessfully
    #[error("build failed ({status}): {command}")]
    BuildFailed {
        /// Build command line
        command: String,
        /// Exit status of the build
        status: ExitStatus,
    },

    /// The companion program exited unsuccessfully
    #[error("benchmark program failed ({status}): {command}")]
    ExecutionFailed {
        /// Command line that was run
        command: String,
        /// Exit status of the program
        status: ExitStatus,
    },

    /// The companion reported a workload different from the harness workload
    #[error(
        "companion reports {field}={reported} but the harness workload uses {expected}; \
         update the companion's constants"
    )]
    ParameterMismatch {
        /// Parameter name
        field: String,
        /// Value printed by the companion, verbatim
        reported: String,
        /// Value in the harness workload
        expected: u64,
    },

    /// The companion did not print its workload parameters
    #[error(
        "companion did not print a `workload ...` line; it is required by \
         `toolchain.require_parameter_echo`"
    )]
    ParametersNotReported,
}

/// Runs the companion program in both external modes.
#[derive(Debug)]
pub struct ExternalRunner<'a> {
    toolchain: &'a Toolchain,
    config: &'a ToolchainConfig,
    root: PathBuf,
    params: WorkloadParameters,
}

impl<'a> ExternalRunner<'a> {
    /// Runner for the companion at `config.source`, resolved against `root`.
    pub fn new(
        toolchain: &'a Toolchain,
        config: &'a ToolchainConfig,
        root: impl Into<PathBuf>,
        params: WorkloadParameters,
    ) -> Self {
        Self {
            toolchain,
            config,
            root: root.into(),
            params,
        }
    }

    /// Absolute (or root-relative) path of the companion source
    pub fn source(&self) -> PathBuf {
        self.root.join(&self.config.source)
    }

    /// Report name for direct-run results
    pub fn direct_name(&self) -> String {
        format!("{} (jit)", self.toolchain.name())
    }

    /// Report name for build-then-run results
    pub fn compiled_name(&self) -> String {
        format!("{} (compiled)", self.toolchain.name())
    }

    /// Direct-run mode: one warm-up invocation, then one timed invocation.
    pub fn run_direct(&self) -> Result<CandidateResult, RunError> {
        let program = self.toolchain.program()?;
        let source = self.existing_source()?;

        let command = || {
            let mut cmd = Command::new(program);
            cmd.arg("-I").arg(&self.root).arg(&source);
            cmd
        };

        tracing::debug!(command = %render_command(&command()), "warm-up invocation");
        run_checked(command())?;

        let (output, elapsed) = timed(command())?;
        self.check_reported_parameters(&output.stdout)?;

        Ok(CandidateResult::new(
            self.direct_name(),
            elapsed,
            self.params.total_hashes(),
            None,
        ))
    }

    /// Build-then-run mode: compile into `build_dir`, then time one run.
    pub fn run_compiled(&self, build_dir: &Path) -> Result<CandidateResult, RunError> {
        let binary = self.build(build_dir)?;

        let (output, elapsed) = timed(Command::new(&binary))?;
        self.check_reported_parameters(&output.stdout)?;

        Ok(CandidateResult::new(
            self.compiled_name(),
            elapsed,
            self.params.total_hashes(),
            None,
        ))
    }

    /// Compile the companion and return the artifact path.
    pub fn build(&self, build_dir: &Path) -> Result<PathBuf, RunError> {
        let program = self.toolchain.program()?;
        let source = self.existing_source()?;

        std::fs::create_dir_all(build_dir).map_err(|source| RunError::BuildDir {
            path: build_dir.to_path_buf(),
            source,
        })?;
        let binary = build_dir.join(&self.config.binary_name);

        let mut command = Command::new(program);
        command
            .arg("build")
            .arg("-I")
            .arg(&self.root)
            .arg(&source)
            .arg("-o")
            .arg(&binary);
        if self.toolchain.supports_opt_flag(&self.config.opt_flag)? {
            command.arg(&self.config.opt_flag);
        }

        let rendered = render_command(&command);
        tracing::info!(command = %rendered, "building companion");
        match run_checked(command) {
            Err(RunError::ExecutionFailed { command, status }) => {
                Err(RunError::BuildFailed { command, status })
            }
            other => other.map(|_| binary),
        }
    }

    fn existing_source(&self) -> Result<PathBuf, RunError> {
        let source = self.source();
        if source.is_file() {
            Ok(source)
        } else {
            Err(RunError::MissingSource { path: source })
        }
    }

    fn check_reported_parameters(&self, stdout: &[u8]) -> Result<(), RunError> {
        let text = String::from_utf8_lossy(stdout);
        match reported_parameters(&text) {
            Some(reported) => verify_parameters(&reported, &self.params),
            None if self.config.require_parameter_echo => Err(RunError::ParametersNotReported),
            None => {
                tracing::warn!(
                    "companion did not report its workload; \
                     its constants are assumed to match the harness"
                );
                Ok(())
            }
        }
    }
}

/// Run to completion with captured stdout and inherited stderr.
fn run_checked(mut command: Command) -> Result<Output, RunError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    let rendered = render_command(&command);
    let output = command.output().map_err(|source| RunError::Spawn {
        command: rendered.clone(),
        source,
    })?;

    if !output.stdout.is_empty() {
        tracing::debug!(
            command = %rendered,
            stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
            "child output"
        );
    }
    if !output.status.success() {
        return Err(RunError::ExecutionFailed {
            command: rendered,
            status: output.status,
        });
    }
    Ok(output)
}

/// Time one end-to-end invocation: spawn, execution and exit.
fn timed(command: Command) -> Result<(Output, std::time::Duration), RunError> {
    let watch = Stopwatch::start();
    let output = run_checked(command)?;
    Ok((output, watch.stop().elapsed))
}

/// Extract `(name, digits)` pairs from the last `workload ...` line.
///
/// Values stay textual; [`verify_parameters`] decides what they mean.
pub fn reported_parameters(stdout: &str) -> Option<Vec<(String, String)>> {
    let line = WORKLOAD_LINE.captures_iter(stdout).last()?;
    let fields = line.get(1)?.as_str();
    Some(
        WORKLOAD_FIELD
            .captures_iter(fields)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect(),
    )
}

/// Compare reported values against the harness workload.
///
/// Unknown names are ignored; every known name must match exactly. A value
/// too large to parse cannot match and is reported as a mismatch.
pub fn verify_parameters(
    reported: &[(String, String)],
    params: &WorkloadParameters,
) -> Result<(), RunError> {
    for (field, value) in reported {
        let expected = match field.as_str() {
            "messages" => params.messages(),
            "rounds" => params.rounds(),
            "base_length" => params.base_length(),
            "max_length" => params.max_length(),
            "stride" | "length_stride" => params.length_stride(),
            _ => continue,
        } as u64;
        if value.parse::<u64>().ok() != Some(expected) {
            return Err(RunError::ParameterMismatch {
                field: field.clone(),
                reported: value.clone(),
                expected,
            });
        }
    }
    Ok(())
}
