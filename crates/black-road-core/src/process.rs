//! Child-process execution helpers
//!
//! Every helper takes the child environment as an explicit parameter;
//! nothing here mutates the parent process environment. Credentials reach
//! external tools only for the single invocation that needs them.

use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Environment entries passed to a single child invocation
pub type Env<'a> = &'a [(&'a str, &'a str)];

fn build(program: &str, args: &[&str], env: Env<'_>) -> Command {
    debug!("running: {} {}", program, args.join(" "));
    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd
}

/// Run to completion, capturing output. The exit status is returned to the
/// caller unchecked; some tools (notably `vault status` while sealed) exit
/// nonzero as part of normal operation.
pub async fn run(program: &str, args: &[&str], env: Env<'_>) -> Result<Output> {
    Ok(build(program, args, env).output().await?)
}

/// Run to completion, capturing output; a nonzero exit aborts with the
/// captured stderr.
pub async fn run_checked(program: &str, args: &[&str], env: Env<'_>) -> Result<Output> {
    let output = run(program, args, env).await?;
    ensure_success(program, &output)?;
    Ok(output)
}

/// Run with stdout/stderr inherited from the parent, so the tool's own
/// output (Terraform's plan/apply reporting) reaches the user directly.
pub async fn run_streaming(program: &str, args: &[&str], env: Env<'_>) -> Result<()> {
    let status = build(program, args, env).status().await?;
    if !status.success() {
        return Err(Error::CommandFailed {
            program: program.to_string(),
            status: status.to_string(),
            stderr: String::new(),
        });
    }
    Ok(())
}

/// Run with stdin fed from memory and stdout captured. The pipe handles
/// are owned by this call, so they are closed on every exit path.
pub async fn run_with_input(
    program: &str,
    args: &[&str],
    env: Env<'_>,
    input: &[u8],
) -> Result<Output> {
    let mut cmd = build(program, args, env);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).await?;
        // Dropping the handle closes the pipe and lets the child see EOF.
    }

    let output = child.wait_with_output().await?;
    ensure_success(program, &output)?;
    Ok(output)
}

/// Turn a nonzero exit status into a `CommandFailed` error
pub fn ensure_success(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::command_failed(program, &output.status, &output.stderr))
    }
}
