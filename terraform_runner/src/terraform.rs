use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use dbx_defs::{CommandKind, PLAN_FILE};
use log::info;

use crate::cmd::{run_generic_command, CommandOutput};
use crate::errors::CommandError;

pub const DEFAULT_MAX_OUTPUT_LINES: usize = 5000;

/// Runs one provisioning-tool command in a working directory. The executor
/// only talks to the tool through this seam.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: CommandKind,
        working_dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Arguments passed to terraform for each logical command. Apply always
/// consumes the plan file written by plan, never a fresh plan.
pub fn terraform_args(command: CommandKind) -> Vec<String> {
    let mut args = vec![command.as_str().to_string(), "-no-color".to_string()];

    let no_input_flag = command != CommandKind::ShowOutputs;
    let auto_approve_flag = matches!(command, CommandKind::Apply | CommandKind::Destroy);
    let json_flag = command == CommandKind::ShowOutputs;
    let plan_out = command == CommandKind::Plan;
    let plan_in = command == CommandKind::Apply;

    if no_input_flag {
        args.push("-input=false".to_string());
    }

    if auto_approve_flag {
        args.push("-auto-approve".to_string());
    }

    if json_flag {
        args.push("-json".to_string());
    }

    if plan_out {
        args.push(format!("-out={}", PLAN_FILE));
    }

    if plan_in {
        args.push(PLAN_FILE.to_string());
    }

    args
}

/// The real terraform CLI, invoked as a child process.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: String,
    global_args: Vec<String>,
    environment_variables: BTreeMap<String, String>,
    max_output_lines: usize,
}

impl TerraformCli {
    pub fn new(binary: impl Into<String>) -> Self {
        TerraformCli {
            binary: binary.into(),
            global_args: Vec::new(),
            environment_variables: BTreeMap::new(),
            max_output_lines: DEFAULT_MAX_OUTPUT_LINES,
        }
    }

    /// Arguments placed before the subcommand, e.g. `-chdir=...`.
    pub fn with_global_args(mut self, args: Vec<String>) -> Self {
        self.global_args = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    pub fn with_max_output_lines(mut self, max_output_lines: usize) -> Self {
        self.max_output_lines = max_output_lines;
        self
    }
}

impl Default for TerraformCli {
    fn default() -> Self {
        TerraformCli::new("terraform")
    }
}

#[async_trait]
impl CommandRunner for TerraformCli {
    async fn run(
        &self,
        command: CommandKind,
        working_dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let mut exec = tokio::process::Command::new(&self.binary);
        exec.args(&self.global_args)
            .args(terraform_args(command))
            .current_dir(working_dir)
            .env("TF_IN_AUTOMATION", "1");

        for (key, value) in &self.environment_variables {
            exec.env(key, value);
        }

        info!("Running terraform command:\n{:?}", exec.as_std());

        run_generic_command(&mut exec, self.max_output_lines, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_terraform_args() {
        assert_eq!(
            terraform_args(CommandKind::Init),
            vec!["init", "-no-color", "-input=false"]
        );
        assert_eq!(
            terraform_args(CommandKind::Plan),
            vec!["plan", "-no-color", "-input=false", "-out=tfplan"]
        );
        assert_eq!(
            terraform_args(CommandKind::Apply),
            vec!["apply", "-no-color", "-input=false", "-auto-approve", "tfplan"]
        );
        assert_eq!(
            terraform_args(CommandKind::Destroy),
            vec!["destroy", "-no-color", "-input=false", "-auto-approve"]
        );
        assert_eq!(
            terraform_args(CommandKind::ShowOutputs),
            vec!["output", "-no-color", "-json"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_working_dir_with_global_args() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("fake-terraform.sh");
        std::fs::write(
            &script,
            "echo \"$1 $FAKE_TOKEN\"\npwd\n[ \"$1\" = init ] || exit 1\n",
        )
        .unwrap();

        let cli = TerraformCli::new("sh")
            .with_global_args(vec![script.to_string_lossy().to_string()])
            .with_env("FAKE_TOKEN", "abc");

        let output = cli
            .run(CommandKind::Init, tmp.path(), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(output.success());
        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("init abc"));
        let cwd = std::fs::canonicalize(lines.next().unwrap()).unwrap();
        assert_eq!(cwd, std::fs::canonicalize(tmp.path()).unwrap());

        let output = cli
            .run(CommandKind::Plan, tmp.path(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(1));
    }
}
