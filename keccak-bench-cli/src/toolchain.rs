//! External Toolchain Resolution
//!
//! Locates the toolchain executable on the search path, checks that it runs,
//! and answers whether its build subcommand accepts an optimization flag.
//! Both answers are computed at most once per [`Toolchain`] and reused for
//! every external candidate in the run.

use std::cell::OnceCell;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Toolchain lookup or validation failure
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The executable is not on the search path
    #[error(
        "Unable to locate the `{program}` CLI. Activate your toolchain environment or \
         install `{program}` before benchmarking."
    )]
    NotFound {
        /// Program name that was searched for
        program: String,
    },

    /// The executable exists but the version query failed
    #[error("`{} --version` failed ({status}); the toolchain is not usable", .program.display())]
    Unusable {
        /// Resolved executable
        program: PathBuf,
        /// Exit status of the version query
        status: ExitStatus,
    },

    /// A toolchain process could not be started
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Command line that failed to start
        command: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Detects whether the toolchain accepts an optional command-line flag.
pub trait CapabilityProbe {
    /// Return whether `program` accepts `flag` on its build subcommand.
    fn supports_flag(&self, program: &Path, flag: &str) -> Result<bool, ToolchainError>;
}

/// Probes flag support by searching the build subcommand's help text.
///
/// Runs `<program> build --help`, joins stdout and stderr, and looks for the
/// flag name (the part before any `=`). The exit status of the help command
/// is ignored; some toolchains exit non-zero after printing help.
#[derive(Debug, Clone, Default)]
pub struct HelpTextProbe;

impl CapabilityProbe for HelpTextProbe {
    fn supports_flag(&self, program: &Path, flag: &str) -> Result<bool, ToolchainError> {
        let mut command = Command::new(program);
        command.args(["build", "--help"]).stdin(Stdio::null());
        let output = command.output().map_err(|source| ToolchainError::Spawn {
            command: render_command(&command),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text.contains(flag_name(flag)))
    }
}

/// The name part of a flag: `--opt=3` becomes `--opt`.
pub fn flag_name(flag: &str) -> &str {
    flag.split('=').next().unwrap_or(flag)
}

/// Run-scoped handle to one external toolchain.
pub struct Toolchain {
    name: String,
    search_path: Option<OsString>,
    probe: Box<dyn CapabilityProbe>,
    program: OnceCell<PathBuf>,
    opt_flag_supported: OnceCell<bool>,
}

impl fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolchain")
            .field("name", &self.name)
            .field("program", &self.program.get())
            .field("opt_flag_supported", &self.opt_flag_supported.get())
            .finish_non_exhaustive()
    }
}

impl Toolchain {
    /// Toolchain looked up on the process `PATH`, probed via help text.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search_path: None,
            probe: Box::new(HelpTextProbe),
            program: OnceCell::new(),
            opt_flag_supported: OnceCell::new(),
        }
    }

    /// Search `path` instead of the process `PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Replace the flag-support probe.
    pub fn with_probe(mut self, probe: impl CapabilityProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Toolchain name as configured
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved, validated executable path.
    ///
    /// The first call searches the path and runs `--version`; later calls
    /// return the cached path.
    pub fn program(&self) -> Result<&Path, ToolchainError> {
        if let Some(program) = self.program.get() {
            return Ok(program);
        }
        let resolved = self.locate()?;
        validate(&resolved)?;
        Ok(self.program.get_or_init(|| resolved))
    }

    /// Whether the build subcommand accepts `flag`. Probed once per run.
    pub fn supports_opt_flag(&self, flag: &str) -> Result<bool, ToolchainError> {
        if let Some(&supported) = self.opt_flag_supported.get() {
            return Ok(supported);
        }
        let program = self.program()?;
        let supported = self.probe.supports_flag(program, flag)?;
        tracing::debug!(flag, supported, "probed build flag support");
        Ok(*self.opt_flag_supported.get_or_init(|| supported))
    }

    fn locate(&self) -> Result<PathBuf, ToolchainError> {
        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
            .unwrap_or_default();
        find_executable(&self.name, &search_path).ok_or_else(|| ToolchainError::NotFound {
            program: self.name.clone(),
        })
    }
}

fn validate(program: &Path) -> Result<(), ToolchainError> {
    let mut command = Command::new(program);
    command.arg("--version").stdin(Stdio::null());
    let output = command.output().map_err(|source| ToolchainError::Spawn {
        command: render_command(&command),
        source,
    })?;
    if !output.status.success() {
        return Err(ToolchainError::Unusable {
            program: program.to_path_buf(),
            status: output.status,
        });
    }

    let version = String::from_utf8_lossy(&output.stdout);
    tracing::info!(
        program = %program.display(),
        version = version.lines().next().unwrap_or("").trim(),
        "using external toolchain"
    );
    Ok(())
}

/// Find `name` in the directories of `search_path`.
///
/// A name containing a path separator is checked as-is.
pub fn find_executable(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_names(name).map(move |file| dir.join(file)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn executable_names(name: &str) -> impl Iterator<Item = String> + '_ {
    [String::new(), ".exe".to_string(), ".cmd".to_string()]
        .into_iter()
        .map(move |ext| format!("{name}{ext}"))
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(name.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Space-joined command line, for messages and logs.
pub fn render_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{lock, write_script};
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingProbe(Rc<Cell<usize>>);

    impl CapabilityProbe for CountingProbe {
        fn supports_flag(&self, _program: &Path, _flag: &str) -> Result<bool, ToolchainError> {
            self.0.set(self.0.get() + 1);
            Ok(true)
        }
    }

    #[test]
    fn test_flag_name() {
        assert_eq!(flag_name("--opt=3"), "--opt");
        assert_eq!(flag_name("-O3"), "-O3");
    }

    #[test]
    fn test_find_executable_skips_plain_files() {
        let _guard = lock();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tool"), "not executable").unwrap();
        assert!(find_executable("tool", dir.path().as_os_str()).is_none());

        let script = write_script(dir.path(), "tool", "exit 0");
        assert_eq!(
            find_executable("tool", dir.path().as_os_str()),
            Some(script)
        );
    }

    #[test]
    fn test_missing_toolchain() {
        let _guard = lock();
        let dir = tempfile::tempdir().unwrap();
        let toolchain = Toolchain::new("mojo").with_search_path(dir.path());
        let err = toolchain.program().unwrap_err();
        assert!(matches!(err, ToolchainError::NotFound { .. }));
        assert!(err.to_string().contains("Unable to locate the `mojo` CLI"));
    }

    #[test]
    fn test_failing_version_query() {
        let _guard = lock();
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "mojo", "exit 3");
        let toolchain = Toolchain::new("mojo").with_search_path(dir.path());
        assert!(matches!(
            toolchain.program(),
            Err(ToolchainError::Unusable { .. })
        ));
    }

    #[test]
    fn test_resolution_is_cached() {
        let _guard = lock();
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls");
        write_script(
            dir.path(),
            "mojo",
            &format!("echo \"$@\" >> {}\necho 'mojo 25.1'", log.display()),
        );
        let toolchain = Toolchain::new("mojo").with_search_path(dir.path());

        let first = toolchain.program().unwrap().to_path_buf();
        let second = toolchain.program().unwrap().to_path_buf();
        assert_eq!(first, second);

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls.lines().count(), 1);
    }

    #[test]
    fn test_help_text_probe() {
        let _guard = lock();
        let dir = tempfile::tempdir().unwrap();
        let with_flag = write_script(dir.path(), "with", "echo '  --opt <LEVEL>' >&2");
        let without = write_script(dir.path(), "without", "echo '  -o <PATH>'");

        assert!(HelpTextProbe.supports_flag(&with_flag, "--opt=3").unwrap());
        assert!(!HelpTextProbe.supports_flag(&without, "--opt=3").unwrap());
    }

    #[test]
    fn test_probe_runs_once() {
        let _guard = lock();
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "mojo", "exit 0");
        let count = Rc::new(Cell::new(0));
        let toolchain = Toolchain::new("mojo")
            .with_search_path(dir.path())
            .with_probe(CountingProbe(count.clone()));

        assert!(toolchain.supports_opt_flag("--opt=3").unwrap());
        assert!(toolchain.supports_opt_flag("--opt=3").unwrap());
        assert_eq!(count.get(), 1);
    }
}
