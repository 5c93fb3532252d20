use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{ObjectStore, ObjectStoreError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// stderr fragments `git show` emits when the path is absent at that commit.
/// Git prints the second one for unknown commits too, so `file_at` only
/// trusts them after the commit has resolved.
const NOT_FOUND_MARKERS: [&str; 2] = ["does not exist", "exists on disk, but not in"];

/// Thin client around the `git` CLI, rooted at a repository.
#[derive(Debug, Clone)]
pub struct GitObjectStore {
    repo_root: PathBuf,
    timeout: Duration,
}

impl GitObjectStore {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if `git` is available in PATH.
    pub fn is_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Discover the repository containing `path` via `git rev-parse --show-toplevel`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, ObjectStoreError> {
        let stdout = run_git(
            path.as_ref(),
            &["rev-parse", "--show-toplevel"],
            Self::DEFAULT_TIMEOUT,
        )?;
        let root = first_nonempty_line(&stdout).ok_or_else(|| {
            ObjectStoreError::Parse("git rev-parse returned empty output".to_string())
        })?;
        Ok(Self::new(root))
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full hash of `HEAD`.
    pub fn head_commit(&self) -> Result<String, ObjectStoreError> {
        let stdout = run_git(&self.repo_root, &["rev-parse", "HEAD"], self.timeout)?;
        first_nonempty_line(&stdout)
            .map(ToOwned::to_owned)
            .ok_or_else(|| ObjectStoreError::Parse("failed to parse HEAD commit".to_string()))
    }

    /// Whether `commit` names a commit object in this repository.
    pub fn has_commit(&self, commit: &str) -> Result<bool, ObjectStoreError> {
        let object = format!("{commit}^{{commit}}");
        match run_git(&self.repo_root, &["cat-file", "-e", &object], self.timeout) {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::CommandFailed { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl ObjectStore for GitObjectStore {
    fn file_at(&self, commit: &str, path: &str) -> Result<Option<String>, ObjectStoreError> {
        let commit = commit.trim();
        if commit.is_empty() || commit.starts_with('-') {
            return Err(ObjectStoreError::Parse(format!("invalid commit id `{commit}`")));
        }
        if !self.has_commit(commit)? {
            tracing::warn!(commit, "cited commit is not in the repository");
            return Err(ObjectStoreError::CommandFailed {
                args: format!("cat-file -e {commit}^{{commit}}"),
                message: format!("unknown commit {commit}"),
            });
        }
        let path = normalize_path(path);
        let object = format!("{commit}:{path}");
        match run_git(&self.repo_root, &["show", &object], self.timeout) {
            Ok(content) => Ok(Some(content)),
            Err(ObjectStoreError::CommandFailed { message, .. })
                if NOT_FOUND_MARKERS.iter().any(|marker| message.contains(marker)) =>
            {
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(commit, path = %path, error = %err, "git object lookup failed");
                Err(err)
            }
        }
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

fn spawn_error(err: std::io::Error, args: &[&str]) -> ObjectStoreError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ObjectStoreError::NotInstalled
    } else {
        ObjectStoreError::CommandFailed {
            args: args.join(" "),
            message: err.to_string(),
        }
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Run `git` in `cwd`, killing it if it outlives `timeout`.
fn run_git(cwd: &Path, args: &[&str], timeout: Duration) -> Result<String, ObjectStoreError> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| spawn_error(err, args))?;

    // Pipes drain on their own threads so a large blob cannot stall the child.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ObjectStoreError::Timeout {
                    args: args.join(" "),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                let _ = child.kill();
                return Err(ObjectStoreError::CommandFailed {
                    args: args.join(" "),
                    message: err.to_string(),
                });
            }
        }
    };

    let stdout = collect(stdout);
    let stderr = collect(stderr);
    if status.success() {
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        let message = if stderr.is_empty() {
            "unknown error".to_string()
        } else {
            stderr
        };
        Err(ObjectStoreError::CommandFailed {
            args: args.join(" "),
            message,
        })
    }
}

fn first_nonempty_line(input: &str) -> Option<&str> {
    input.lines().map(str::trim).find(|line| !line.is_empty())
}
