use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dbx_common::{CapabilityOrchestrator, ConfigGenerator, ConfigTables, DecisionEngine};
use dbx_defs::{
    ArtifactKind, CommandKind, DeploymentErrorKind, Environment, InfrastructureRequest, Sku,
    CANCELLED_MESSAGE,
};
use dbx_utils::read_artifacts;
use mockall::{mock, Sequence};
use pretty_assertions::assert_eq;
use terraform_runner::{
    ApprovalGate, CommandError, CommandOutput, CommandRunner, DeploymentExecutor,
};

mock! {
    Terraform {}

    #[async_trait]
    impl CommandRunner for Terraform {
        async fn run(
            &self,
            command: CommandKind,
            working_dir: &Path,
            timeout: Duration,
        ) -> Result<CommandOutput, CommandError>;
    }
}

const PLAN_TEXT: &str = "Plan: 4 to add, 0 to change, 0 to destroy.";

fn ml_prod_request() -> InfrastructureRequest {
    InfrastructureRequest {
        workspace_name: "ml-prod".to_string(),
        team: "ml".to_string(),
        environment: Environment::Prod,
        region: "eastus".to_string(),
        enable_gpu: true,
        workload_type: "ml".to_string(),
        cost_limit: None,
        additional_requirements: None,
    }
}

fn orchestrator(runner: MockTerraform, approval: Arc<dyn ApprovalGate>) -> CapabilityOrchestrator {
    CapabilityOrchestrator::new(
        DecisionEngine::new(Arc::new(ConfigTables::default())),
        ConfigGenerator::builtin().unwrap(),
        DeploymentExecutor::new(Arc::new(runner), approval, Duration::from_secs(30)),
    )
}

fn never_asked() -> Arc<dyn ApprovalGate> {
    Arc::new(|_: &str| -> bool { panic!("approval must not be requested") })
}

fn expect_command(
    runner: &mut MockTerraform,
    command: CommandKind,
    times: usize,
    exit_code: i32,
    stdout: &str,
    stderr: &str,
) {
    let response = CommandOutput {
        exit_code: Some(exit_code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    };
    runner
        .expect_run()
        .withf(move |c, _, _| *c == command)
        .times(times)
        .returning(move |_, _, _| Ok(response.clone()));
}

fn expect_success(runner: &mut MockTerraform, command: CommandKind, stdout: &str) {
    expect_command(runner, command, 1, 0, stdout, "");
}

fn expect_no_call(runner: &mut MockTerraform, command: CommandKind) {
    runner
        .expect_run()
        .withf(move |c, _, _| *c == command)
        .times(0);
}

#[test]
fn test_gpu_prod_decision() {
    let mut runner = MockTerraform::new();
    runner.expect_run().times(0);
    let orchestrator = orchestrator(runner, never_asked());
    let request = ml_prod_request();

    let decision = orchestrator.decide(&request);

    assert_eq!(decision.sku, Sku::Premium);
    assert!(orchestrator
        .engine()
        .tables()
        .is_gpu_instance(&decision.worker_instance_type));
    assert_eq!(
        decision.resource_group_name,
        format!("rg-{}", request.workspace_name)
    );
}

#[tokio::test]
async fn test_init_failure_stops_the_workflow() {
    let mut runner = MockTerraform::new();
    expect_command(&mut runner, CommandKind::Init, 1, 1, "", "auth error");
    expect_no_call(&mut runner, CommandKind::Plan);
    expect_no_call(&mut runner, CommandKind::Apply);
    let orchestrator = orchestrator(runner, never_asked());
    let tmp = tempfile::tempdir().unwrap();

    let result = orchestrator
        .provision(&ml_prod_request(), tmp.path(), true, false)
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("auth error"));
    assert_eq!(
        result.error_kind,
        Some(DeploymentErrorKind::CommandFailed {
            command: CommandKind::Init
        })
    );
}

#[tokio::test]
async fn test_dry_run_never_applies() {
    let mut runner = MockTerraform::new();
    let mut seq = Sequence::new();
    for (command, stdout) in [(CommandKind::Init, ""), (CommandKind::Plan, PLAN_TEXT)] {
        let response = CommandOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        runner
            .expect_run()
            .withf(move |c, _, _| *c == command)
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _, _| Ok(response.clone()));
    }
    expect_no_call(&mut runner, CommandKind::Apply);
    expect_no_call(&mut runner, CommandKind::ShowOutputs);
    let orchestrator = orchestrator(runner, never_asked());
    let tmp = tempfile::tempdir().unwrap();

    let result = orchestrator
        .provision(&ml_prod_request(), tmp.path(), false, true)
        .await
        .unwrap();

    assert!(result.success);
    assert!(!result.plan_output.as_deref().unwrap_or_default().is_empty());
    assert_eq!(result.workspace_url, None);

    let written = read_artifacts(tmp.path()).unwrap();
    assert!(written
        .get(ArtifactKind::VariableValues)
        .contains("Standard_NC24s_v3"));
}

#[tokio::test]
async fn test_declined_approval_cancels() {
    let asked = Arc::new(AtomicUsize::new(0));
    let counter = asked.clone();
    let approval: Arc<dyn ApprovalGate> = Arc::new(move |plan: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        assert!(plan.contains("to add"));
        false
    });
    let mut runner = MockTerraform::new();
    expect_success(&mut runner, CommandKind::Init, "");
    expect_success(&mut runner, CommandKind::Plan, PLAN_TEXT);
    expect_no_call(&mut runner, CommandKind::Apply);
    let orchestrator = orchestrator(runner, approval);
    let tmp = tempfile::tempdir().unwrap();

    let result = orchestrator
        .provision(&ml_prod_request(), tmp.path(), false, false)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    assert_eq!(result.error_kind, Some(DeploymentErrorKind::Cancelled));
    assert_eq!(asked.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_outputs_still_succeed() {
    let mut runner = MockTerraform::new();
    expect_success(&mut runner, CommandKind::Init, "");
    expect_success(&mut runner, CommandKind::Plan, PLAN_TEXT);
    expect_success(&mut runner, CommandKind::Apply, "Apply complete!");
    expect_success(&mut runner, CommandKind::ShowOutputs, "{not json");
    let orchestrator = orchestrator(runner, never_asked());
    let tmp = tempfile::tempdir().unwrap();

    let result = orchestrator
        .provision(&ml_prod_request(), tmp.path(), true, false)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.outputs, Some(Default::default()));
    assert_eq!(result.workspace_url, None);
}

#[tokio::test]
async fn test_apply_timeout_is_reported() {
    let mut runner = MockTerraform::new();
    expect_success(&mut runner, CommandKind::Init, "");
    expect_success(&mut runner, CommandKind::Plan, PLAN_TEXT);
    runner
        .expect_run()
        .withf(|c, _, _| *c == CommandKind::Apply)
        .times(1)
        .returning(|command, _, timeout| {
            Err(CommandError::Timeout {
                program: format!("terraform {}", command),
                seconds: timeout.as_secs_f64(),
            })
        });
    expect_no_call(&mut runner, CommandKind::ShowOutputs);
    let orchestrator = orchestrator(runner, never_asked());
    let tmp = tempfile::tempdir().unwrap();

    let result = orchestrator
        .provision(&ml_prod_request(), tmp.path(), true, false)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(
        result.error_kind,
        Some(DeploymentErrorKind::Timeout {
            command: CommandKind::Apply
        })
    );
}

#[tokio::test]
async fn test_provision_then_teardown() {
    let tmp = tempfile::tempdir().unwrap();
    let working_dir: PathBuf = tmp.path().to_path_buf();
    let mut runner = MockTerraform::new();
    for (command, stdout) in [
        (CommandKind::Init, ""),
        (CommandKind::Plan, PLAN_TEXT),
        (CommandKind::Apply, "Apply complete!"),
        (
            CommandKind::ShowOutputs,
            r#"{"workspace_url": {"value": "https://adb-42.azuredatabricks.net", "type": "string", "sensitive": false},
                "resource_group_name": {"value": "rg-ml-prod"}}"#,
        ),
        (CommandKind::Destroy, "Destroy complete!"),
    ] {
        let expected_dir = working_dir.clone();
        let response = CommandOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        runner
            .expect_run()
            .withf(move |c, dir, _| *c == command && dir == expected_dir.as_path())
            .times(1)
            .returning(move |_, _, _| Ok(response.clone()));
    }
    let orchestrator = orchestrator(runner, never_asked());

    let result = orchestrator
        .provision(&ml_prod_request(), &working_dir, true, false)
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(
        result.workspace_url.as_deref(),
        Some("https://adb-42.azuredatabricks.net")
    );
    assert_eq!(result.resource_group_name.as_deref(), Some("rg-ml-prod"));

    let destroyed = orchestrator.teardown(&working_dir, true).await;
    assert!(destroyed.success);
}

#[test]
fn test_tables_override_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tables.yaml");
    let mut tables = ConfigTables::default();
    tables.skus.insert(Environment::Dev, Sku::Premium);
    std::fs::write(&path, serde_yaml::to_string(&tables).unwrap()).unwrap();

    let loaded = ConfigTables::from_yaml_file(&path).unwrap();
    let engine = DecisionEngine::new(Arc::new(loaded));
    let mut request = ml_prod_request();
    request.environment = Environment::Dev;

    assert_eq!(engine.make_decision(&request).sku, Sku::Premium);
}
