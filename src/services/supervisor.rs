use crate::metrics::Metrics;
use crate::picker::PickerError;
use crate::protocol::{Command, ProtocolError};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command as ProcessCommand, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Interval between exit checks while waiting out the quit grace period
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Lifecycle of the helper process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Starting,
    Running,
    Terminating,
    Exited,
}

/// Locate the helper executable.
///
/// An explicit path wins. Otherwise the directory of the running executable
/// is searched first, then every `PATH` entry.
pub fn discover_helper(
    name: &str,
    explicit: Option<&Utf8Path>,
) -> Result<Utf8PathBuf, PickerError> {
    if let Some(path) = explicit {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        return Err(PickerError::HelperNotFound(path.to_string()));
    }

    let mut search_dirs = Vec::new();
    if let Some(app_dir) = application_dir() {
        search_dirs.push(app_dir);
    }
    if let Some(path_var) = std::env::var_os("PATH") {
        search_dirs.extend(
            std::env::split_paths(&path_var).filter_map(|p| Utf8PathBuf::try_from(p).ok()),
        );
    }

    if let Some(path) = find_in_dirs(name, &search_dirs) {
        tracing::debug!("Found helper executable at {}", path);
        return Ok(path);
    }

    tracing::error!(
        "Helper executable {} not found in {} search directories",
        name,
        search_dirs.len()
    );
    Err(PickerError::HelperNotFound(name.to_string()))
}

/// First executable named `name` in `dirs`, in order
fn find_in_dirs(name: &str, dirs: &[Utf8PathBuf]) -> Option<Utf8PathBuf> {
    dirs.iter()
        .flat_map(|dir| executable_names(name).into_iter().map(move |n| dir.join(n)))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Utf8Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match path.metadata() {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Utf8Path) -> bool {
    path.is_file()
}

fn application_dir() -> Option<Utf8PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let exe = Utf8PathBuf::try_from(exe).ok()?;
    exe.parent().map(Utf8Path::to_path_buf)
}

fn executable_names(name: &str) -> Vec<String> {
    if cfg!(windows) && !name.ends_with(".exe") {
        vec![format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    }
}

/// The helper child and the two pipes connected to it.
///
/// The host writes commands to the child's stdin and reads replies from its
/// stdout; the child's stderr is inherited so its logs reach the host console.
/// Any pipe failure marks the session broken and every later exchange fails
/// fast with `SessionClosed`.
pub struct HelperProcess {
    child: Option<Child>,
    pid: u32,
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: Option<BufReader<ChildStdout>>,
    state: ProcessState,
    broken: bool,
    quit_grace: Duration,
    metrics: Arc<Metrics>,
}

impl HelperProcess {
    /// Launch `program` with piped stdin/stdout
    pub fn spawn(
        program: &Utf8Path,
        args: &[String],
        quit_grace: Duration,
        metrics: Arc<Metrics>,
    ) -> Result<Self, PickerError> {
        tracing::debug!("Helper state: {:?}", ProcessState::Starting);
        tracing::info!("Launching picker helper: {} {:?}", program, args);

        let mut child = ProcessCommand::new(program.as_std_path())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| PickerError::Startup {
                program: program.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().map(BufWriter::new);
        let stdout = child.stdout.take().map(BufReader::new);

        let pid = child.id();
        tracing::info!("Picker helper running with pid {}", pid);

        Ok(Self {
            child: Some(child),
            pid,
            stdin,
            stdout,
            state: ProcessState::Running,
            broken: false,
            quit_grace,
            metrics,
        })
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn id(&self) -> u32 {
        self.pid
    }

    /// True while commands can still be exchanged
    pub fn is_usable(&self) -> bool {
        self.state == ProcessState::Running && !self.broken
    }

    /// Encode and flush one command on the calling thread
    pub fn send(&mut self, command: &Command) -> Result<(), PickerError> {
        if !self.is_usable() {
            return Err(PickerError::SessionClosed);
        }
        let stdin = self.stdin.as_mut().ok_or(PickerError::SessionClosed)?;

        tracing::trace!("-> {}", command);
        let written = command.encode(stdin).and_then(|_| stdin.flush());
        match written {
            Ok(()) => {
                self.metrics.record_command_sent();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to send {} to helper: {}", command, e);
                let err = ProtocolError::Transport(e);
                self.fail(&err);
                Err(err.into())
            }
        }
    }

    /// Lend the reply reader to a worker; exactly one read is in flight at a time
    pub fn take_reader(&mut self) -> Result<BufReader<ChildStdout>, PickerError> {
        if !self.is_usable() {
            return Err(PickerError::SessionClosed);
        }
        self.stdout.take().ok_or(PickerError::SessionClosed)
    }

    /// Give the reply reader back after a complete read
    pub fn restore_reader(&mut self, reader: BufReader<ChildStdout>) {
        self.stdout = Some(reader);
    }

    /// Record a failed exchange.
    ///
    /// A transport failure leaves the session broken. A desync additionally
    /// kills the helper, since nothing it sends can be framed again.
    pub fn fail(&mut self, err: &ProtocolError) {
        self.broken = true;
        if err.is_desync() {
            self.metrics.record_desync();
            tracing::error!("Protocol desync with helper, terminating it: {}", err);
            self.terminate();
        } else {
            self.metrics.record_transport_error();
            tracing::warn!("Helper channel failed: {}", err);
        }
    }

    /// Kill the helper immediately
    pub fn terminate(&mut self) {
        if self.state == ProcessState::Exited {
            return;
        }
        self.state = ProcessState::Terminating;
        self.stdin = None;
        self.stdout = None;
        self.kill_and_reap();
    }

    /// Send Quit, wait up to the grace period, then kill.
    ///
    /// Never blocks much longer than the grace period whatever the helper does.
    pub fn shutdown(&mut self) {
        if self.state == ProcessState::Exited {
            return;
        }
        self.state = ProcessState::Terminating;

        if let Some(mut stdin) = self.stdin.take() {
            // Fire-and-forget: the helper may already be gone
            let _ = Command::Quit
                .encode(&mut stdin)
                .and_then(|_| stdin.flush());
        }
        self.stdout = None;

        let Some(child) = self.child.as_mut() else {
            self.state = ProcessState::Exited;
            return;
        };

        let deadline = Instant::now() + self.quit_grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::info!("Picker helper exited with {}", status);
                    self.state = ProcessState::Exited;
                    return;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to poll helper status: {}", e);
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(EXIT_POLL_INTERVAL);
        }

        tracing::warn!(
            "Picker helper still running after {:?}, killing it",
            self.quit_grace
        );
        self.kill_and_reap();
    }

    fn kill_and_reap(&mut self) {
        let Some(mut child) = self.child.take() else {
            self.state = ProcessState::Exited;
            return;
        };

        if let Err(e) = child.kill() {
            tracing::debug!("Kill of helper failed (likely already exited): {}", e);
        }

        if !matches!(child.try_wait(), Ok(Some(_))) {
            // Reap off-thread so teardown does not wait on the kernel
            let pid = self.pid;
            let reaper = std::thread::Builder::new()
                .name("fpicker-reaper".to_string())
                .spawn(move || {
                    let _ = child.wait();
                });
            if let Err(e) = reaper {
                tracing::warn!("Failed to start reaper for helper {}: {}", pid, e);
            }
        }
        self.state = ProcessState::Exited;
    }
}

impl Drop for HelperProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}
