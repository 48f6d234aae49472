//! Shell tool: run a command line with `sh -c` under a timeout

use conclave_domain::Observation;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub async fn run_shell(
    working_dir: &Path,
    command: &str,
    timeout: Duration,
    max_output: usize,
) -> Observation {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };
    cmd.current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return Observation::error(format!("failed to spawn command: {}", e)),
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Observation::error(format!("failed to wait for command: {}", e)),
        Err(_) => {
            return Observation::error(format!(
                "command timed out after {} seconds",
                timeout.as_secs_f64()
            ));
        }
    };

    // Combine stdout and stderr
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut combined = stdout.trim_end().to_string();
    if !stderr.trim().is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(stderr.trim_end());
    }
    let combined = super::truncate_output(combined, max_output);

    if output.status.success() {
        if combined.is_empty() {
            Observation::ok("(no output)")
        } else {
            Observation::ok(combined)
        }
    } else {
        let code = output.status.code().unwrap_or(-1);
        Observation::error(format!("command exited with code {}\n{}", code, combined))
    }
}
