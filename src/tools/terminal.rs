//! Terminal/shell command execution tool.
//!
//! Commands run with the full permissions of the host process. There is no
//! allow-list or sandbox; each command is bounded by a deadline and its output
//! is capped before it reaches the model.
//!
//! On Unix the shell leads its own process group. When the deadline expires or
//! the call is cancelled, the whole group is killed, so programs the shell
//! started do not outlive it.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{truncate_output, ParamKind, ParamSpec, Tool, ToolArgs, ToolContext, ToolError};


/// Run a shell command.
pub struct ShellTool;

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Run a shell command and return its output, useful for flexible system operations, using package managers, installing dependencies, creating projects..."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required(
                "command",
                ParamKind::String,
                "The exact shell command to be executed (e.g., 'ls -la', 'cat file.txt'). Be cautious with destructive commands.",
            ),
            ParamSpec::optional(
                "timeout_secs",
                ParamKind::Integer,
                "Timeout in seconds (defaults to the configured shell timeout)",
            ),
        ]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let command = args.require_str("command")?;
        let timeout = args
            .get_u64("timeout_secs")
            .map(Duration::from_secs)
            .unwrap_or(ctx.shell_timeout);

        tracing::info!(target: "tool", command, "Executing shell command");

        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(command)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| ToolError::Execution(format!("Failed to start {}: {}", shell, e)))?;

        // Armed until the command finishes; dropping it on timeout or
        // cancellation kills everything the shell started.
        let mut group = ProcessGroupGuard::new(child.id());

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => {
                group.disarm();
                result.map_err(|e| {
                    ToolError::Execution(format!("Failed to collect command output: {}", e))
                })?
            }
            Err(_) => {
                tracing::warn!(target: "tool", command, timeout_secs = timeout.as_secs(), "Shell command timed out");
                return Err(ToolError::Timeout(timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut result = String::new();

        if !stdout.is_empty() {
            result.push_str(&stdout);
        }

        if !stderr.is_empty() {
            if !result.is_empty() {
                result.push_str("\n--- stderr ---\n");
            }
            result.push_str(&stderr);
        }

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            result.push_str(&format!("\n[Exit code: {}]", exit_code));
        }

        Ok(truncate_output(result))
    }
}

/// Kills the shell's process group when dropped while armed.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal. The group id is the shell's pid,
    // which leads the group because it was spawned with process_group(0).
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(
            target: "tool",
            pgid,
            error = %std::io::Error::last_os_error(),
            "Process group already gone"
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir(), Duration::from_secs(30))
    }

    fn command(cmd: &str) -> ToolArgs {
        ToolArgs::from_pairs([("command", cmd)])
    }

    #[tokio::test]
    async fn echo() {
        let result = ShellTool.execute(&command("echo hello"), &ctx()).await;
        assert_eq!(result.unwrap().trim(), "hello");
    }

    #[tokio::test]
    async fn runs_in_working_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("test.txt"), "workspace file").unwrap();
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(30));

        let result = ShellTool.execute(&command("cat test.txt"), &ctx).await;
        assert_eq!(result.unwrap().trim(), "workspace file");
    }

    #[tokio::test]
    async fn stdout_then_stderr_section() {
        let output = ShellTool
            .execute(&command("echo stdout && echo stderr >&2"), &ctx())
            .await
            .unwrap();
        assert_eq!(output, "stdout\n\n--- stderr ---\nstderr\n");
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let output = ShellTool.execute(&command("exit 42"), &ctx()).await.unwrap();
        assert!(output.contains("[Exit code: 42]"));
    }

    #[tokio::test]
    async fn failed_command_reports_diagnostics() {
        let output = ShellTool
            .execute(&command("ls /nonexistent_termpilot_path"), &ctx())
            .await
            .unwrap();
        assert!(output.contains("Exit code:"));
    }

    #[tokio::test]
    async fn missing_command() {
        let err = ShellTool.execute(&ToolArgs::default(), &ctx()).await.unwrap_err();
        assert!(matches!(err, ToolError::Argument(_)));
    }

    #[tokio::test]
    async fn per_call_timeout() {
        let args = ToolArgs::parse(r#"{"command": "sleep 10", "timeout_secs": 1}"#).unwrap();
        let err = ShellTool.execute(&args, &ctx()).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout(d) if d == Duration::from_secs(1)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn context_timeout_applies() {
        let ctx = ToolContext::new(std::env::temp_dir(), Duration::from_secs(1));
        let err = ShellTool.execute(&command("sleep 10"), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
    }

    #[tokio::test]
    async fn long_output_is_capped() {
        let output = ShellTool
            .execute(&command("yes abcdefghij | head -n 5000"), &ctx())
            .await
            .unwrap();
        assert!(output.ends_with("[output truncated]"));
        assert!(output.chars().count() < 10_100);
    }

    /// Alive and not yet a zombie.
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    async fn read_pid(path: &std::path::Path) -> String {
        for _ in 0..50 {
            if let Ok(pid) = std::fs::read_to_string(path) {
                if !pid.trim().is_empty() {
                    return pid.trim().to_string();
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("pid file {} was never written", path.display());
    }

    #[cfg(target_os = "linux")]
    async fn assert_eventually_dead(pid: &str) {
        for _ in 0..50 {
            if !is_running(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("process {} still running", pid);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_processes_started_by_the_shell() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(1));

        let err = ShellTool
            .execute(&command("sleep 30 & echo $! > sleep.pid; wait; true"), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));

        let pid = read_pid(&dir.path().join("sleep.pid")).await;
        assert_eventually_dead(&pid).await;
    }

    /// Pids whose command line is exactly `argv`.
    #[cfg(target_os = "linux")]
    fn pids_running(argv: &[&str]) -> Vec<String> {
        let wanted: String = argv.iter().map(|a| format!("{}\0", a)).collect();
        std::fs::read_dir("/proc")
            .unwrap()
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|pid| pid.chars().all(|c| c.is_ascii_digit()))
            .filter(|pid| {
                std::fs::read(format!("/proc/{}/cmdline", pid))
                    .map(|raw| raw == wanted.as_bytes())
                    .unwrap_or(false)
            })
            .filter(|pid| is_running(pid))
            .collect()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_foreground_child() {
        let ctx = ToolContext::new(std::env::temp_dir(), Duration::from_secs(1));
        // unusual duration so no unrelated sleep matches
        let argv = ["sleep", "30.4173"];

        let err = ShellTool
            .execute(&command("sleep 30.4173; echo marker; true"), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));

        for pid in pids_running(&argv) {
            assert_eventually_dead(&pid).await;
        }
        assert!(pids_running(&argv).is_empty());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn cancelled_call_kills_its_processes() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(30));
        let args = command("sleep 30 & echo $! > sleep.pid; wait");

        let cancelled =
            tokio::time::timeout(Duration::from_secs(1), ShellTool.execute(&args, &ctx)).await;
        assert!(cancelled.is_err());

        let pid = read_pid(&dir.path().join("sleep.pid")).await;
        assert_eventually_dead(&pid).await;
    }
}
