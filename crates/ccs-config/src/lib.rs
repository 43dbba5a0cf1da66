//! Shared configuration for the compile service daemon.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults first, then a
//! TOML file (selected with `--config-path` or `CCS_CONFIG_PATH`), then `CCS_*`
//! environment variables, and finally command-line flags. The daemon only
//! reads the resolved value through [`Config::load`] or
//! [`Config::load_from_iter`]; nothing here touches sockets or the filesystem.

mod defaults;
mod endpoint;
mod modes;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_COMPILER_COMMAND, DEFAULT_COMPILER_TIMEOUT_SECS, DEFAULT_LISTEN_HOST,
    DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER, default_compiler_command,
    default_compiler_timeout_secs, default_dispatch_mode, default_listen_endpoint,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use endpoint::{EndpointParseError, TcpEndpoint};
pub use modes::{DispatchMode, LogFormat, ModeParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CCS")]
pub struct Config {
    /// Endpoint the service accepts connections on.
    #[serde(default = "default_listen_endpoint")]
    #[ortho_config(default = default_listen_endpoint())]
    pub listen: TcpEndpoint,
    /// `tracing_subscriber::EnvFilter` expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the log stream.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Scheduling of accepted connections.
    #[serde(default = "default_dispatch_mode")]
    #[ortho_config(default = default_dispatch_mode())]
    pub dispatch_mode: DispatchMode,
    /// Library tree preloaded into the caches at startup. Sources are read
    /// from its `closure/` and `third_party/` directories and externs from
    /// its `externs/` directory.
    #[serde(default)]
    pub preload_root: Option<Utf8PathBuf>,
    /// Program and arguments of the compiler adapter, separated by
    /// whitespace.
    #[serde(default = "default_compiler_command")]
    #[ortho_config(default = default_compiler_command())]
    pub compiler_command: String,
    /// Seconds a single compile may run before it is abandoned.
    #[serde(default = "default_compiler_timeout_secs")]
    #[ortho_config(default = default_compiler_timeout_secs())]
    pub compiler_timeout_secs: u64,
    /// Directory holding the default extern declarations passed to every
    /// compile.
    #[serde(default)]
    pub default_externs_dir: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            dispatch_mode: default_dispatch_mode(),
            preload_root: None,
            compiler_command: default_compiler_command(),
            compiler_timeout_secs: default_compiler_timeout_secs(),
            default_externs_dir: None,
        }
    }
}

impl Config {
    /// Endpoint the service listens on.
    #[must_use]
    pub fn listen(&self) -> &TcpEndpoint {
        &self.listen
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Connection scheduling mode.
    #[must_use]
    pub const fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch_mode
    }

    /// Library tree to preload, when configured.
    #[must_use]
    pub fn preload_root(&self) -> Option<&Utf8Path> {
        self.preload_root.as_deref()
    }

    /// Compiler adapter program followed by its arguments.
    #[must_use]
    pub fn compiler_argv(&self) -> Vec<String> {
        self.compiler_command
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }

    /// Maximum duration of a single compile.
    #[must_use]
    pub const fn compiler_timeout(&self) -> Duration {
        Duration::from_secs(self.compiler_timeout_secs)
    }

    /// Directory of default extern declarations, when configured.
    #[must_use]
    pub fn default_externs_dir(&self) -> Option<&Utf8Path> {
        self.default_externs_dir.as_deref()
    }
}
