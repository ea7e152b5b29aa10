//! Configuration loading from keccak-bench.toml
//!
//! The file is discovered by walking up from the current directory. Every
//! field has a default, so an absent file and an empty file behave the same.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up during discovery
pub const CONFIG_FILE_NAME: &str = "keccak-bench.toml";

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML
    #[error("invalid configuration in {}: {source}", .path.display())]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },

    /// `output.format` names no known format
    #[error("invalid `output.format` in configuration: {reason}")]
    InvalidFormat {
        /// Parser message naming the rejected value
        reason: String,
    },

    /// The default file could not be written
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// File that was written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    /// External toolchain configuration
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// In-process runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// External toolchain and companion program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Toolchain executable name, looked up on PATH
    #[serde(default = "default_program")]
    pub program: String,
    /// Companion source, relative to the harness root
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// File name of the compiled artifact inside the build directory
    #[serde(default = "default_binary_name")]
    pub binary_name: String,
    /// Optimization flag appended to the build when the toolchain accepts it
    #[serde(default = "default_opt_flag")]
    pub opt_flag: String,
    /// Fail when the companion does not print its workload parameters
    #[serde(default)]
    pub require_parameter_echo: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            source: default_source(),
            binary_name: default_binary_name(),
            opt_flag: default_opt_flag(),
            require_parameter_echo: false,
        }
    }
}

fn default_program() -> String {
    "mojo".to_string()
}
fn default_source() -> PathBuf {
    PathBuf::from("benchmarks/mojo_benchmark.mojo")
}
fn default_binary_name() -> String {
    "mojo_keccak_bench".to_string()
}
fn default_opt_flag() -> String {
    "--opt=3".to_string()
}

/// In-process runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Core to pin the measuring thread to (Linux only)
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "table" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Directory for compiled artifacts, relative to the harness root
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            build_dir: default_build_dir(),
        }
    }
}

fn default_format() -> String {
    "table".to_string()
}
fn default_build_dir() -> PathBuf {
    PathBuf::from(".bench-build")
}

impl BenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find keccak-bench.toml in `start` or any ancestor.
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Discover and load configuration starting from the current directory.
    ///
    /// Returns the config together with the file it came from, if any. A
    /// discovered file that fails to parse is an error, not a silent default.
    pub fn discover() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match Self::find(&cwd) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Write the default configuration into `dir`. Never overwrites.
    pub fn write_default(dir: &Path) -> Result<PathBuf, ConfigError> {
        use std::io::Write;

        let path = dir.join(CONFIG_FILE_NAME);
        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(write_err)?;
        file.write_all(Self::default_toml().as_bytes())
            .map_err(write_err)?;
        Ok(path)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# keccak-bench configuration

[toolchain]
# External toolchain executable, looked up on PATH
program = "mojo"
# Companion benchmark source, relative to the harness root
source = "benchmarks/mojo_benchmark.mojo"
# Name of the compiled artifact inside the build directory
binary_name = "mojo_keccak_bench"
# Optimization flag, appended only when `<program> build --help` mentions it
opt_flag = "--opt=3"
# Fail if the companion does not print a `workload ...` parameter line
require_parameter_echo = false

[runner]
# Pin the in-process measuring thread to a core (uncomment to enable)
# pin_cpu = 0

[output]
# Default output format: table or json
format = "table"
# Directory for compiled artifacts, relative to the harness root
build_dir = ".bench-build"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchConfig::default();
        assert_eq!(config.toolchain.program, "mojo");
        assert_eq!(config.toolchain.opt_flag, "--opt=3");
        assert_eq!(config.output.build_dir, PathBuf::from(".bench-build"));
        assert!(config.runner.pin_cpu.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: BenchConfig = toml::from_str(
            r#"
            [toolchain]
            program = "mojo-nightly"

            [runner]
            pin_cpu = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.toolchain.program, "mojo-nightly");
        assert_eq!(config.toolchain.binary_name, "mojo_keccak_bench");
        assert_eq!(config.runner.pin_cpu, Some(2));
        assert_eq!(config.output.format, "table");
    }

    #[test]
    fn test_default_toml_parses() {
        let config: BenchConfig = toml::from_str(&BenchConfig::default_toml()).unwrap();
        assert_eq!(
            config.toolchain.source,
            PathBuf::from("benchmarks/mojo_benchmark.mojo")
        );
        assert!(!config.toolchain.require_parameter_echo);
    }

    #[test]
    fn test_write_default_round_trips_and_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = BenchConfig::write_default(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));

        let config = BenchConfig::load(&path).unwrap();
        assert_eq!(config.toolchain.program, "mojo");
        assert_eq!(config.output.build_dir, PathBuf::from(".bench-build"));

        std::fs::write(&path, "[runner]\npin_cpu = 3\n").unwrap();
        assert!(matches!(
            BenchConfig::write_default(dir.path()),
            Err(ConfigError::Write { .. })
        ));
        assert_eq!(BenchConfig::load(&path).unwrap().runner.pin_cpu, Some(3));
    }

    #[test]
    fn test_find_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = BenchConfig::find(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[toolchain\nprogram = 1").unwrap();
        assert!(matches!(
            BenchConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
