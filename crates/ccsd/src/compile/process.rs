//! Compiler backed by an external adapter process.
//!
//! [`ProcessCompiler`] spawns the configured command for every compilation,
//! writes the [`CompileRequest`] to its stdin as a single JSON line, and
//! reads a single JSON line back from stdout:
//!
//! ```json
//! {"status":"success","output":"var a=1;"}
//! {"status":"failure","message":"JSC_PARSE_ERROR ..."}
//! ```
//!
//! Stderr is drained into debug logs. The whole exchange is bounded by the
//! configured timeout; a child that overruns it is killed.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use ccs_config::Config;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::{Entry, read_normalised, scan_scripts};

use super::COMPILE_TARGET;
use super::compiler::{CompileRequest, OptimizingCompiler};
use super::errors::CompilerError;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AdapterResponse {
    Success { output: String },
    Failure { message: String },
}

/// Runs compilations through an adapter executable.
#[derive(Debug)]
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    externs_dir: Option<Utf8PathBuf>,
    default_externs: OnceCell<Vec<Entry>>,
}

impl ProcessCompiler {
    /// Creates a compiler that runs `argv` with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::NoCommand`] when `argv` is empty.
    pub fn new(
        argv: Vec<String>,
        timeout: Duration,
        externs_dir: Option<Utf8PathBuf>,
    ) -> Result<Self, CompilerError> {
        let mut parts = argv.into_iter();
        let program = parts.next().ok_or(CompilerError::NoCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
            externs_dir,
            default_externs: OnceCell::new(),
        })
    }

    /// Builds a compiler from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::NoCommand`] when `compiler_command` is blank.
    pub fn from_config(config: &Config) -> Result<Self, CompilerError> {
        Self::new(
            config.compiler_argv(),
            config.compiler_timeout(),
            config.default_externs_dir().map(Utf8Path::to_path_buf),
        )
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    fn spawn(&self) -> Result<Child, CompilerError> {
        debug!(
            target: COMPILE_TARGET,
            program = %self.program,
            "spawning compiler process"
        );
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CompilerError::SpawnFailed {
                program: self.program.clone(),
                source,
            })
    }

    fn run(&self, request: &CompileRequest) -> Result<String, CompilerError> {
        let mut payload = serde_json::to_vec(request).map_err(CompilerError::SerializeRequest)?;
        payload.push(b'\n');

        // A timeout past the clock's range means no deadline at all.
        let deadline = Instant::now().checked_add(self.timeout);
        let mut child = self.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or(CompilerError::MissingPipe { stream: "stdin" })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(CompilerError::MissingPipe { stream: "stdout" })?;
        let stderr = child.stderr.take();

        // The child may start writing before it has read all of stdin, so
        // every pipe gets its own thread.
        let writer = thread::spawn(move || write_request(stdin, &payload));
        let drain = stderr.map(|stderr| thread::spawn(move || drain_stderr(stderr)));
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            drop(sender.send(read_response_line(stdout)));
        });

        let line = match receiver.recv_timeout(self.timeout) {
            Ok(Ok(line)) => line,
            Ok(Err(source)) => {
                terminate(&mut child);
                return Err(CompilerError::Io { source });
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    target: COMPILE_TARGET,
                    timeout_secs = self.timeout_secs(),
                    "compiler timed out, killing process"
                );
                terminate(&mut child);
                return Err(CompilerError::Timeout {
                    timeout_secs: self.timeout_secs(),
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                terminate(&mut child);
                return Err(CompilerError::invalid_output("stdout reader stopped"));
            }
        };

        if let Ok(Err(error)) = writer.join() {
            debug!(target: COMPILE_TARGET, %error, "compiler closed stdin early");
        }
        self.wait_for_exit(&mut child, deadline)?;
        if let Some(drain) = drain {
            drop(drain.join());
        }
        parse_response(&line)
    }

    fn wait_for_exit(
        &self,
        child: &mut Child,
        deadline: Option<Instant>,
    ) -> Result<(), CompilerError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(target: COMPILE_TARGET, ?status, "compiler process exited");
                    if status.success() {
                        return Ok(());
                    }
                    return Err(CompilerError::NonZeroExit {
                        status: status.code().unwrap_or(-1),
                    });
                }
                Ok(None) => {
                    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        warn!(
                            target: COMPILE_TARGET,
                            timeout_secs = self.timeout_secs(),
                            "compiler did not exit, killing process"
                        );
                        terminate(child);
                        return Err(CompilerError::Timeout {
                            timeout_secs: self.timeout_secs(),
                        });
                    }
                    thread::sleep(EXIT_POLL_INTERVAL);
                }
                Err(source) => return Err(CompilerError::Io { source }),
            }
        }
    }
}

impl OptimizingCompiler for ProcessCompiler {
    fn default_externs(&self) -> Result<Vec<Entry>, CompilerError> {
        let Some(dir) = self.externs_dir.as_deref() else {
            return Ok(Vec::new());
        };
        self.default_externs
            .get_or_try_init(|| load_extern_dir(dir))
            .cloned()
    }

    fn compile(&self, request: &CompileRequest) -> Result<String, CompilerError> {
        self.run(request)
    }
}

fn load_extern_dir(dir: &Utf8Path) -> Result<Vec<Entry>, CompilerError> {
    if !dir.is_dir() {
        return Err(CompilerError::DefaultExterns {
            path: dir.to_path_buf(),
            message: String::from("not a directory"),
        });
    }
    let scan = scan_scripts(dir, dir);
    if scan.failures > 0 {
        return Err(CompilerError::DefaultExterns {
            path: dir.to_path_buf(),
            message: format!("{} entries could not be visited", scan.failures),
        });
    }
    let mut externs = Vec::with_capacity(scan.files.len());
    for (key, path) in scan.files {
        let contents = read_normalised(&path).map_err(|error| CompilerError::DefaultExterns {
            path: path.clone(),
            message: error.to_string(),
        })?;
        externs.push(Entry::new(key, contents));
    }
    debug!(
        target: COMPILE_TARGET,
        dir = %dir,
        count = externs.len(),
        "loaded default externs"
    );
    Ok(externs)
}

fn write_request(mut stdin: ChildStdin, payload: &[u8]) -> io::Result<()> {
    stdin.write_all(payload)?;
    stdin.flush()
    // Dropping stdin closes the pipe.
}

fn read_response_line(stdout: impl Read) -> io::Result<String> {
    let mut line = String::new();
    BufReader::new(stdout).read_line(&mut line)?;
    Ok(line)
}

fn drain_stderr(stderr: impl Read) {
    let mut buffer = String::new();
    if BufReader::new(stderr).read_to_string(&mut buffer).is_ok() && !buffer.is_empty() {
        debug!(
            target: COMPILE_TARGET,
            stderr = %buffer.trim(),
            "compiler stderr output"
        );
    }
}

fn terminate(child: &mut Child) {
    drop(child.kill());
    drop(child.wait());
}

fn parse_response(line: &str) -> Result<String, CompilerError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CompilerError::invalid_output("compiler produced no output"));
    }
    match serde_json::from_str::<AdapterResponse>(trimmed) {
        Ok(AdapterResponse::Success { output }) => Ok(output),
        Ok(AdapterResponse::Failure { message }) => Err(CompilerError::Failure { message }),
        Err(error) => Err(CompilerError::invalid_output(error.to_string())),
    }
}
