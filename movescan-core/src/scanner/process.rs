use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::{ScanOutput, ScannerBackend};
use crate::error::{PipelineError, Result};

/// Scanner executable shipped next to the server for the current platform.
pub fn platform_default_binary() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("./MoveScanner_m1")
    } else {
        PathBuf::from("./MoveScanner")
    }
}

/// Runs the scanner as `<binary> -p <input> -n -o <output>`.
#[derive(Debug, Clone)]
pub struct ProcessScanner {
    binary: PathBuf,
    timeout: Duration,
}

impl ProcessScanner {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p")
            .arg(input)
            .arg("-n")
            .arg("-o")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must take the child down with it.
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ScannerBackend for ProcessScanner {
    async fn run(&self, input: &Path, output: &Path) -> Result<ScanOutput> {
        info!(
            binary = %self.binary.display(),
            input = %input.display(),
            output = %output.display(),
            "launching scanner"
        );

        let started = Instant::now();
        let child = self.command(input, output).spawn().map_err(|e| {
            error!(binary = %self.binary.display(), error = %e, "failed to start scanner");
            PipelineError::ScanExecution {
                reason: format!("failed to start {}: {e}", self.binary.display()),
                output: String::new(),
            }
        })?;

        let finished = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, input = %input.display(), "scanner timed out");
                return Err(PipelineError::ScanTimeout {
                    timeout: self.timeout,
                });
            }
        };

        let finished = finished.map_err(|e| PipelineError::ScanExecution {
            reason: format!("failed to wait for scanner: {e}"),
            output: String::new(),
        })?;

        let mut diagnostics = String::from_utf8_lossy(&finished.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&finished.stderr));
        let elapsed = started.elapsed();

        if !finished.status.success() {
            error!(
                status = %finished.status,
                elapsed_ms = elapsed.as_millis() as u64,
                "scanner exited with failure"
            );
            return Err(PipelineError::ScanExecution {
                reason: format!("scanner exited with {}", finished.status),
                output: diagnostics,
            });
        }

        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            diagnostics = %diagnostics,
            "scanner finished"
        );
        Ok(ScanOutput {
            diagnostics,
            elapsed,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn passes_contract_arguments_and_writes_report() {
        let temp = TempDir::new().unwrap();
        // $1=-p $2=input $3=-n $4=-o $5=output
        let binary = script(
            temp.path(),
            "scanner.sh",
            r#"[ "$1" = "-p" ] && [ "$3" = "-n" ] && [ "$4" = "-o" ] || exit 9
printf '{"input":"%s"}' "$2" > "$5"
echo scanned"#,
        );
        let input = temp.path().join("bytecode_modules");
        fs::create_dir_all(&input).unwrap();
        let output = temp.path().join("report.json");

        let scanner = ProcessScanner::new(binary, Duration::from_secs(10));
        let run = scanner.run(&input, &output).await.unwrap();

        assert!(run.diagnostics.contains("scanned"));
        let report = fs::read_to_string(&output).unwrap();
        assert_eq!(report, format!(r#"{{"input":"{}"}}"#, input.display()));
    }

    #[tokio::test]
    async fn non_zero_exit_is_execution_error_with_output() {
        let temp = TempDir::new().unwrap();
        let binary = script(temp.path(), "fail.sh", "echo 'bad bytecode' >&2\nexit 3");

        let scanner = ProcessScanner::new(binary, Duration::from_secs(10));
        let err = scanner
            .run(temp.path(), &temp.path().join("out.json"))
            .await
            .unwrap_err();

        match err {
            PipelineError::ScanExecution { output, .. } => {
                assert!(output.contains("bad bytecode"))
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_execution_error() {
        let temp = TempDir::new().unwrap();
        let scanner = ProcessScanner::new(temp.path().join("absent"), Duration::from_secs(1));

        let err = scanner
            .run(temp.path(), &temp.path().join("out.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ScanExecution { .. }));
    }

    #[tokio::test]
    async fn hung_scanner_times_out() {
        let temp = TempDir::new().unwrap();
        let binary = script(temp.path(), "hang.sh", "sleep 30");

        let scanner = ProcessScanner::new(binary, Duration::from_millis(200));
        let started = Instant::now();
        let err = scanner
            .run(temp.path(), &temp.path().join("out.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ScanTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
