use std::path::Path;
use std::process::{ExitStatus, Stdio};

use futures::stream::{BoxStream, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::models::{ExtractorEvent, VideoInfo};
use super::progress::{parse_line, progress_template};

pub const DEFAULT_PROGRAM: &str = "yt-dlp";

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("`{0}` was not found, install yt-dlp or point SVD_YTDLP at it")]
    NotInstalled(String),

    #[error("Failed to run extractor: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid extractor output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Runs the external extraction tool as a child process
#[derive(Debug, Clone)]
pub struct ExtractorClient {
    program: String,
    prefix_args: Vec<String>,
}

impl Default for ExtractorClient {
    fn default() -> Self {
        Self::new(vec![DEFAULT_PROGRAM.to_string()])
    }
}

impl ExtractorClient {
    /// `command` is the program followed by any fixed leading arguments,
    /// e.g. `["python3", "-m", "yt_dlp"]`
    pub fn new(command: Vec<String>) -> Self {
        let mut parts = command.into_iter().filter(|part| !part.trim().is_empty());
        let program = parts
            .next()
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());

        Self {
            program,
            prefix_args: parts.collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> ExtractorError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractorError::NotInstalled(self.program.clone())
        } else {
            ExtractorError::Io(e)
        }
    }

    /// Fetch metadata without downloading anything
    pub async fn analyze(&self, url: &str) -> Result<VideoInfo> {
        let mut cmd = self.command();
        cmd.args(["--dump-single-json", "--no-warnings", "--no-playlist", "--"])
            .arg(url);
        tracing::debug!(program = %self.program, url, "running metadata extraction");

        let output = cmd.output().await.map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractorError::Failed(error_summary(&stderr, output.status)));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        tracing::info!(
            title = info.title.as_deref().unwrap_or_default(),
            formats = info.formats.len(),
            "metadata extracted"
        );
        Ok(info)
    }

    /// Download `url` into `output_template` using the format expression
    /// `format`. The stream always ends with exactly one `Exited` event.
    pub fn download(
        &self,
        url: &str,
        output_template: &Path,
        format: &str,
    ) -> BoxStream<'static, ExtractorEvent> {
        let mut cmd = self.command();
        cmd.args(["--newline", "--no-colors", "--no-playlist"])
            .arg("--progress-template")
            .arg(progress_template())
            .arg("-f")
            .arg(format)
            .arg("-o")
            .arg(output_template)
            .arg("--")
            .arg(url);
        tracing::debug!(program = %self.program, url, format, "starting download");

        futures::stream::unfold(
            DownloadRuntimeState::Start {
                cmd,
                program: self.program.clone(),
            },
            |state| async move {
                match state {
                    DownloadRuntimeState::Start { mut cmd, program } => {
                        let mut child = match cmd.spawn() {
                            Ok(child) => child,
                            Err(e) => {
                                let error = if e.kind() == std::io::ErrorKind::NotFound {
                                    ExtractorError::NotInstalled(program)
                                } else {
                                    ExtractorError::Io(e)
                                };
                                return Some((
                                    ExtractorEvent::Exited(Err(error.to_string())),
                                    DownloadRuntimeState::Finished,
                                ));
                            }
                        };

                        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
                            (Some(stdout), Some(stderr)) => (stdout, stderr),
                            _ => {
                                let _ = child.kill().await;
                                return Some((
                                    ExtractorEvent::Exited(Err(
                                        "Extractor output is not available".to_string(),
                                    )),
                                    DownloadRuntimeState::Finished,
                                ));
                            }
                        };

                        // Drain stderr concurrently so the child never blocks on a full pipe
                        let stderr = tokio::spawn(async move {
                            let mut buf = Vec::new();
                            let _ = BufReader::new(stderr).read_to_end(&mut buf).await;
                            String::from_utf8_lossy(&buf).into_owned()
                        });

                        let process = RunningProcess {
                            child,
                            stdout: BufReader::new(stdout),
                            stderr,
                        };
                        Some(process.next_event().await)
                    }
                    DownloadRuntimeState::Running(process) => Some(process.next_event().await),
                    DownloadRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

enum DownloadRuntimeState {
    Start { cmd: Command, program: String },
    Running(RunningProcess),
    Finished,
}

struct RunningProcess {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: JoinHandle<String>,
}

impl RunningProcess {
    async fn next_event(mut self) -> (ExtractorEvent, DownloadRuntimeState) {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match self.stdout.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if let Some(event) = parse_line(&line) {
                        return (event, DownloadRuntimeState::Running(self));
                    }
                    tracing::debug!("extractor: {}", line.trim_end());
                }
                Err(e) => {
                    tracing::warn!("failed to read extractor output: {}", e);
                    break;
                }
            }
        }

        (self.finish().await, DownloadRuntimeState::Finished)
    }

    async fn finish(mut self) -> ExtractorEvent {
        let status = self.child.wait().await;
        let stderr = self.stderr.await.unwrap_or_default();

        match status {
            Ok(status) if status.success() => ExtractorEvent::Exited(Ok(())),
            Ok(status) => ExtractorEvent::Exited(Err(error_summary(&stderr, status))),
            Err(e) => ExtractorEvent::Exited(Err(format!("Extractor process failed: {}", e))),
        }
    }
}

/// Pick the most useful line out of the extractor's stderr
fn error_summary(stderr: &str, status: ExitStatus) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if let Some(error) = lines.iter().rev().find(|line| line.starts_with("ERROR:")) {
        return error.trim_start_matches("ERROR:").trim().to_string();
    }

    match lines.last() {
        Some(line) => line.to_string(),
        None => format!("Extractor exited with {}", status),
    }
}
