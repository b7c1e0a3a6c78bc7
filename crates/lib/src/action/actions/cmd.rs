//! Shell command action.
//!
//! Runs a command through the platform shell. Unlike a hermetic build the
//! command inherits the caller's environment, since target actions wrap
//! tools found on `PATH` (docker, dotnet, npm, ...).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::action::{Action, ActionFailure, ActionOutcome};
use crate::context::BuildContext;
use crate::placeholder;

/// Run a shell command, optionally capturing its stdout into a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdAction {
  pub cmd: String,
  pub env: Option<BTreeMap<String, String>>,
  pub cwd: Option<String>,
  /// Property that receives the trimmed stdout on success.
  pub capture: Option<String>,
}

impl CmdAction {
  pub fn new(cmd: impl Into<String>) -> Self {
    Self {
      cmd: cmd.into(),
      env: None,
      cwd: None,
      capture: None,
    }
  }

  pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
    self.env = Some(env);
    self
  }

  pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
    self.cwd = Some(cwd.into());
    self
  }

  pub fn capture_into(mut self, property: impl Into<String>) -> Self {
    self.capture = Some(property.into());
    self
  }
}

impl From<&str> for CmdAction {
  fn from(cmd: &str) -> Self {
    CmdAction::new(cmd)
  }
}

#[async_trait]
impl Action for CmdAction {
  async fn execute(&self, ctx: &BuildContext) -> ActionOutcome {
    let cmd = placeholder::substitute(&self.cmd, ctx)?;

    let env = match &self.env {
      Some(env) => {
        let mut resolved = BTreeMap::new();
        for (key, value) in env {
          resolved.insert(key.clone(), placeholder::substitute(value, ctx)?);
        }
        Some(resolved)
      }
      None => None,
    };

    let cwd = match &self.cwd {
      Some(cwd) => Some(placeholder::substitute(cwd, ctx)?),
      None => None,
    };

    let working_dir = resolve_working_dir(ctx.working_dir(), cwd.as_deref());
    let stdout = execute_cmd(&cmd, env.as_ref(), &working_dir, ctx.shell()).await?;

    if let Some(property) = &self.capture {
      ctx.set(property.clone(), stdout);
    }

    Ok(())
  }

  fn describe(&self) -> String {
    format!("cmd: {}", self.cmd)
  }
}

fn resolve_working_dir(root: &Path, cwd: Option<&str>) -> PathBuf {
  match cwd {
    Some(cwd) if Path::new(cwd).is_absolute() => PathBuf::from(cwd),
    Some(cwd) => root.join(cwd),
    None => root.to_path_buf(),
  }
}

/// Execute a command string and return its trimmed stdout.
///
/// A non-zero exit status becomes an [`ActionFailure`] carrying the
/// process exit code (or -1 when the process was killed by a signal).
pub async fn execute_cmd(
  cmd: &str,
  env: Option<&BTreeMap<String, String>>,
  working_dir: &Path,
  shell: Option<&str>,
) -> Result<String, ActionFailure> {
  info!(cmd = %cmd, "executing command");

  let (shell_cmd, shell_args) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command.args(&shell_args).arg(cmd).current_dir(working_dir);

  if let Some(user_env) = env {
    for (key, value) in user_env {
      command.env(key, value);
    }
  }

  debug!(shell = %shell_cmd, working_dir = ?working_dir, "spawning process");

  let output = command
    .output()
    .await
    .map_err(|e| ActionFailure::new(format!("failed to spawn '{shell_cmd}': {e}")))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }

    let code = output.status.code().unwrap_or(-1);
    return Err(ActionFailure::with_code(
      format!("command failed with exit code {code}: {cmd}"),
      code,
    ));
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// Shell binary and the arguments that precede the command string.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
