//! Running the server as a background daemon.
//!
//! `start` detaches from the terminal with the usual double fork and records
//! the daemon's pid in a pid file; `stop` signals the recorded pid with
//! SIGTERM until it is gone.

use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::server::Error;

/// Controls the daemon whose pid is recorded in `pid_file`.
#[derive(Debug, Clone)]
pub struct Daemon {
    pid_file: PathBuf,
}

impl Daemon {
    /// Create a controller for the daemon tracked by `pid_file`.
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
        }
    }

    /// The pid recorded in the pid file, if the file exists and holds one.
    pub fn read_pid(&self) -> Option<libc::pid_t> {
        let contents = fs::read_to_string(&self.pid_file).ok()?;
        contents.trim().parse().ok().filter(|pid| *pid > 0)
    }

    /// Detach from the terminal and call `run` in the detached process.
    ///
    /// Fails without forking when the pid file names a live process. The
    /// calling process exits inside this function; only the daemon returns,
    /// once `run` has returned.
    pub fn start<F>(&self, run: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        if let Some(pid) = self.read_pid() {
            if is_alive(pid) {
                return Err(Error::Daemon(format!(
                    "daemon seems to be running already (pid {pid})"
                )));
            }
            warn!("Removing stale pid file {}", self.pid_file.display());
            fs::remove_file(&self.pid_file)?;
        }

        daemonize()?;
        let _pid_file = PidFile::create(&self.pid_file)?;
        run()
    }

    /// Send SIGTERM to the recorded pid every 100ms until it has exited,
    /// then remove the pid file. Succeeds when nothing is running.
    pub fn stop(&self) -> Result<(), Error> {
        let Some(pid) = self.read_pid() else {
            warn!("Daemon does not seem to be running");
            return Ok(());
        };

        loop {
            // SAFETY: `pid` is positive, so only that one process is signalled.
            if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
                let err = io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ESRCH) {
                    return Err(Error::Daemon(format!("could not stop pid {pid}: {err}")));
                }
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }

        info!("Stopped daemon (pid {pid})");
        match fs::remove_file(&self.pid_file) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// `stop` followed by `start`.
    pub fn restart<F>(&self, run: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        self.stop()?;
        self.start(run)
    }
}

/// Whether a process with `pid` exists.
fn is_alive(pid: libc::pid_t) -> bool {
    // SAFETY: signal 0 only checks for existence and permission.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

/// Fork; the parent exits and the child returns.
fn fork_and_exit_parent(stage: &str) -> Result<(), Error> {
    // SAFETY: called before any runtime threads exist.
    match unsafe { libc::fork() } {
        -1 => Err(Error::Daemon(format!(
            "{stage} failed: {}",
            io::Error::last_os_error()
        ))),
        0 => Ok(()),
        _ => std::process::exit(0),
    }
}

fn daemonize() -> Result<(), Error> {
    fork_and_exit_parent("fork #1")?;

    // Decouple from the parent environment
    std::env::set_current_dir("/")?;
    // SAFETY: plain syscalls without pointer arguments.
    unsafe {
        if libc::setsid() < 0 {
            return Err(Error::Daemon(format!(
                "setsid failed: {}",
                io::Error::last_os_error()
            )));
        }
        libc::umask(0);
    }

    fork_and_exit_parent("fork #2")?;
    redirect_stdio()
}

/// Point stdin, stdout and stderr at `/dev/null`.
fn redirect_stdio() -> Result<(), Error> {
    let devnull = OpenOptions::new().read(true).write(true).open("/dev/null")?;
    let fd = devnull.as_raw_fd();
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: both descriptors are open for the duration of the call.
        if unsafe { libc::dup2(fd, target) } < 0 {
            return Err(io::Error::last_os_error().into());
        }
    }
    Ok(())
}

/// The pid file of the running daemon, removed on drop.
struct PidFile {
    path: PathBuf,
}

impl PidFile {
    fn create(path: &Path) -> Result<Self, Error> {
        fs::write(path, format!("{}\n", std::process::id()))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
