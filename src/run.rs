use async_std::io::{Read, ReadExt};
use async_std::process::{Child, Command, ExitStatus, Stdio};
use async_std::sync::{Arc, Mutex};
use async_std::task;
use byte_unit::Byte;
use log::{debug, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Exit code reported when the child was killed for exceeding its timeout.
/// A real exit status is never negative.
pub const TIMEOUT_EXIT_CODE: i32 = -1;

/// Exit code reported when the child could not be launched at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 1;

// How long to keep draining the pipes after the child is gone.  A killed
// child may leave grandchildren holding the write ends open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

type Buffer = Arc<Mutex<Vec<u8>>>;

/// The outcome of a [Run].
///
/// Every way a command can go wrong is encoded here; [Run::run] itself
/// never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl ProcessResult {
    pub(crate) fn launch_failure<E: ToString>(e: E) -> Self {
        Self {
            stdout: String::new(),
            stderr: e.to_string(),
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
            timed_out: false,
        }
    }

    /// Check if the command ran to completion with exit code 0.
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Information of a command to run in a child process.
pub struct Run {
    path: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    output_max: Byte,
}

impl Run {
    /// Create a new [Run] from a path to executable.
    pub fn new<T: AsRef<str>>(path: T) -> Self {
        Self {
            path: path.as_ref().to_string(),
            args: vec![],
            envs: vec![],
            current_dir: None,
            timeout: None,
            output_max: Byte::from_u64(4 * 1024 * 1024),
        }
    }

    /// Append an argument to the command line.
    pub fn arg<T: AsRef<str>>(mut self, arg: T) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Append multiple arguments to the command line.
    pub fn args<T: AsRef<str>>(mut self, args: &[T]) -> Self {
        self.args.extend(args.iter().map(|x| x.as_ref().to_string()));
        self
    }

    /// Set an environment variable for the child.  The rest of the
    /// environment is inherited.
    pub fn env<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.envs
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Set the working directory of the child.
    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Configure a maximum time for the child to run.  If the child is
    /// still running when it expires, it is killed and the result is
    /// marked as timed out with [TIMEOUT_EXIT_CODE].
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = Some(d);
        self
    }

    /// Limit how much of stdout and of stderr is kept.  The pipes are
    /// still drained past the limit so the child never blocks on a full
    /// pipe.  The default is 4 MiB per stream.
    pub fn output_max(mut self, b: Byte) -> Self {
        self.output_max = b;
        self
    }

    fn command_line(&self) -> String {
        let mut argv = vec![self.path.as_str()];
        argv.extend(self.args.iter().map(String::as_str));
        argv.join(" ")
    }

    /// Run the command and wait for it to finish or time out.
    pub async fn run(self) -> ProcessResult {
        let cmdline = self.command_line();
        let mut std_cmd = std::process::Command::new(&self.path);
        // A group of its own, so a timeout also reaches its descendants.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }
        let mut cmd = Command::from(std_cmd);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(d) = &self.current_dir {
            cmd.current_dir(d);
        }

        debug!("spawning {}", cmdline);
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!("cannot spawn {}: {}", cmdline, e);
                return ProcessResult::launch_failure(e);
            }
        };

        let limit = usize::try_from(self.output_max.as_u64()).unwrap_or(usize::MAX);
        let (out_buf, out_task) = capture(child.stdout.take(), limit);
        let (err_buf, err_task) = capture(child.stderr.take(), limit);

        let waited = match self.timeout {
            Some(d) => async_std::future::timeout(d, child.status()).await,
            None => Ok(child.status().await),
        };

        let (exit_code, timed_out, wait_error) = match waited {
            Ok(Ok(status)) => (exit_code(status), false, None),
            Ok(Err(e)) => (LAUNCH_FAILURE_EXIT_CODE, false, Some(e.to_string())),
            Err(_) => {
                if let Err(e) = kill_group(&mut child) {
                    warn!("cannot kill {}: {}", cmdline, e);
                }
                // Reap it so no zombie is left behind.
                let _ = child.status().await;
                (TIMEOUT_EXIT_CODE, true, None)
            }
        };

        let drain = futures::future::join(out_task, err_task);
        if async_std::future::timeout(DRAIN_GRACE, drain).await.is_err() {
            debug!("output of {} is still open, keeping what was read", cmdline);
        }

        let stdout = lossy(&out_buf).await;
        let partial_stderr = lossy(&err_buf).await;
        let stderr = match (timed_out, wait_error) {
            (true, _) => {
                let secs = self.timeout.unwrap_or_default().as_secs_f64();
                let mut msg = format!(
                    "timed out: command '{}' ran for more than {} seconds",
                    cmdline, secs
                );
                if !partial_stderr.is_empty() {
                    msg.push('\n');
                    msg.push_str(&partial_stderr);
                }
                msg
            }
            (false, Some(e)) => partial_stderr + &e,
            (false, None) => partial_stderr,
        };

        debug!(
            "{} finished: exit code {}, timed out {}",
            cmdline, exit_code, timed_out
        );
        ProcessResult {
            stdout,
            stderr,
            exit_code,
            timed_out,
        }
    }
}

#[cfg(unix)]
fn kill_group(child: &mut Child) -> std::io::Result<()> {
    // The child leads its own group, so the group id is its pid.
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}

fn capture<R>(reader: Option<R>, limit: usize) -> (Buffer, task::JoinHandle<()>)
where
    R: Read + Unpin + Send + 'static,
{
    let buf: Buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = buf.clone();
    let handle = task::spawn(async move {
        let mut reader = match reader {
            Some(r) => r,
            None => return,
        };
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let mut buf = sink.lock().await;
                    let room = limit.saturating_sub(buf.len());
                    buf.extend_from_slice(&chunk[..n.min(room)]);
                }
            }
        }
    });
    (buf, handle)
}

async fn lossy(buf: &Buffer) -> String {
    String::from_utf8_lossy(&buf.lock().await).into_owned()
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    LAUNCH_FAILURE_EXIT_CODE
}
