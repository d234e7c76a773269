use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::{JobOutcome, SymbolicEngine};
use crate::ode::job::AnalysisJob;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output is still collected once the deadline has passed.
const READ_GRACE: Duration = Duration::from_millis(100);

/// Runs the job script with an interpreter in a child process.
#[derive(Debug, Clone)]
pub struct SubprocessEngine {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

/// Output of one pipe, readable while the pipe is still being drained.
#[derive(Debug, Default, Clone)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> (Captured, JoinHandle<()>) {
    let captured = Captured::default();
    let sink = captured.clone();
    let reader = thread::spawn(move || {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = [0u8; 4096];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => match sink.0.lock() {
                    Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                    Err(_) => break,
                },
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // a broken pipe only truncates the captured text
                Err(_) => break,
            }
        }
    });
    (captured, reader)
}

/// Waits for the readers to reach end of file. A grandchild that inherited the
/// pipes can keep them open, so with a deadline the readers are abandoned.
fn settle(readers: Vec<JoinHandle<()>>, deadline: Option<Instant>) {
    let Some(deadline) = deadline else {
        for reader in readers {
            let _ = reader.join();
        }
        return;
    };
    let deadline = deadline.max(Instant::now() + READ_GRACE);
    while readers.iter().any(|reader| !reader.is_finished()) {
        if Instant::now() >= deadline {
            debug!("output pipes still open, no longer reading them");
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl SubprocessEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Extra arguments passed before the job path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        self.program.as_str()
    }

    fn wait(
        &self,
        child: &mut Child,
        deadline: Option<Instant>,
    ) -> std::io::Result<Option<ExitStatus>> {
        let Some(deadline) = deadline else {
            return child.wait().map(Some);
        };
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                warn!(
                    "killing {} after {:?}",
                    self.program,
                    self.timeout.unwrap_or_default()
                );
                child.kill()?;
                child.wait()?;
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Runs the job at `job_path` from inside its directory.
    pub fn run(&self, job_path: &Path) -> JobOutcome {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        match (job_path.parent(), job_path.file_name()) {
            (Some(dir), Some(file)) if !dir.as_os_str().is_empty() => {
                command.current_dir(dir).arg(file);
            }
            _ => {
                command.arg(job_path);
            }
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("running {:?}", command);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return JobOutcome::Failed {
                    diagnostic: format!("could not start {}: {}", self.program, err),
                }
            }
        };
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let (stdout, stdout_reader) = drain(child.stdout.take());
        let (stderr, stderr_reader) = drain(child.stderr.take());
        let status = self.wait(&mut child, deadline);
        settle(vec![stdout_reader, stderr_reader], deadline);
        let output = format!("{}{}", stdout.text(), stderr.text());

        match status {
            Ok(Some(status)) if status.success() => JobOutcome::Succeeded { output },
            Ok(Some(status)) => JobOutcome::Failed {
                diagnostic: format!("{} exited with {}\n{}", self.program, status, output),
            },
            Ok(None) => JobOutcome::TimedOut {
                // the timeout is always set when waiting gives up
                after: self.timeout.unwrap_or_default(),
                output,
            },
            Err(err) => JobOutcome::Failed {
                diagnostic: format!("lost track of {}: {}\n{}", self.program, err, output),
            },
        }
    }
}

impl SymbolicEngine for SubprocessEngine {
    fn name(&self) -> &str {
        self.program.as_str()
    }

    fn execute(&self, job: &AnalysisJob) -> JobOutcome {
        self.run(&job.path)
    }
}
