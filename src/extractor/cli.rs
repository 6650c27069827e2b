//! yt-dlp based provider using the external binary

use super::parser::parse_resource_info;
use super::traits::MediaExtractor;
use crate::config::ExtractorConfig;
use crate::error::Error;
use crate::types::ResourceInfo;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Provider that shells out to `yt-dlp`
///
/// # Examples
///
/// ```no_run
/// use dvorfs_dl::config::ExtractorConfig;
/// use dvorfs_dl::extractor::{MediaExtractor, YtDlpExtractor};
/// use std::path::{Path, PathBuf};
///
/// // Explicit binary
/// let extractor = YtDlpExtractor::new(PathBuf::from("/usr/bin/yt-dlp"), &ExtractorConfig::default());
///
/// // Or auto-discover from PATH
/// let extractor = YtDlpExtractor::from_config(&ExtractorConfig::default())
///     .expect("yt-dlp not found in PATH");
///
/// extractor
///     .transfer_format(
///         "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
///         "18",
///         Path::new("/tmp/out.mp4"),
///     )
///     .unwrap();
/// ```
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    socket_timeout: Duration,
    transfer_timeout: Option<Duration>,
    extra_args: Vec<String>,
}

impl YtDlpExtractor {
    /// Create a provider with an explicit binary path
    pub fn new(binary_path: PathBuf, config: &ExtractorConfig) -> Self {
        Self {
            binary_path,
            socket_timeout: config.socket_timeout,
            transfer_timeout: config.transfer_timeout,
            extra_args: config.extra_args.clone(),
        }
    }

    /// Use the configured binary, or find `yt-dlp` in PATH
    ///
    /// Returns `None` when no binary is configured and none is found.
    pub fn from_config(config: &ExtractorConfig) -> Option<Self> {
        let binary_path = match &config.binary_path {
            Some(path) => path.clone(),
            None => which::which("yt-dlp").ok()?,
        };
        Some(Self::new(binary_path, config))
    }

    /// Path of the binary this provider runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout.as_secs().max(1).to_string(),
        ]
    }

    fn catalog_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string(), "--skip-download".to_string()];
        args.extend(self.common_args());
        args.extend(self.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn transfer_args(&self, url: &str, format_id: &str, destination: &Path) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            format_id.to_string(),
            "--output".to_string(),
            output_template(destination),
            "--force-overwrites".to_string(),
            "--no-continue".to_string(),
            "--no-progress".to_string(),
            "--quiet".to_string(),
        ];
        args.extend(self.common_args());
        args.extend(self.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn spawn(&self, args: &[String], capture_stdout: bool) -> crate::Result<Child> {
        Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(if capture_stdout {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ExternalTool(format!("failed to execute yt-dlp: {e}")))
    }
}

impl MediaExtractor for YtDlpExtractor {
    fn extract_catalog(&self, url: &str) -> crate::Result<ResourceInfo> {
        let child = self.spawn(&self.catalog_args(url), true)?;
        let output = child
            .wait_with_output()
            .map_err(|e| Error::ExternalTool(format!("failed to wait for yt-dlp: {e}")))?;

        if !output.status.success() {
            return Err(Error::Extractor(failure_reason(
                &String::from_utf8_lossy(&output.stderr),
                output.status.code(),
            )));
        }

        parse_resource_info(&output.stdout)
    }

    fn transfer_format(
        &self,
        url: &str,
        format_id: &str,
        destination: &Path,
    ) -> crate::Result<()> {
        let mut child = self.spawn(&self.transfer_args(url, format_id, destination), false)?;

        // Drain stderr on its own thread so a chatty child never blocks on a full pipe
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let status = wait_with_deadline(&mut child, self.transfer_timeout)?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        match status {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(Error::ExternalTool(failure_reason(&stderr, status.code()))),
            None => Err(Error::ExternalTool(format!(
                "transfer timed out after {}s",
                self.transfer_timeout.map(|t| t.as_secs()).unwrap_or_default()
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Wait for `child`, killing it once `timeout` elapses
///
/// Returns `Ok(None)` when the child was killed.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> crate::Result<Option<std::process::ExitStatus>> {
    let Some(timeout) = timeout else {
        return child
            .wait()
            .map(Some)
            .map_err(|e| Error::ExternalTool(format!("failed to wait for yt-dlp: {e}")));
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(Error::ExternalTool(format!(
                    "failed to wait for yt-dlp: {e}"
                )));
            }
        }
    }
}

/// yt-dlp treats `%` in the output path as a template marker
fn output_template(destination: &Path) -> String {
    destination.to_string_lossy().replace('%', "%%")
}

/// Last meaningful stderr line, which is where yt-dlp prints `ERROR: ...`
fn failure_reason(stderr: &str, code: Option<i32>) -> String {
    let line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string());

    match (line, code) {
        (Some(line), _) => line,
        (None, Some(code)) => format!("yt-dlp exited with status {code}"),
        (None, None) => "yt-dlp terminated by signal".to_string(),
    }
}
