use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use log::info;

use crate::print::{print_decision, print_result};
use crate::utils::{load_settings, orchestrator, RequestArgs};

pub async fn handle_deploy(
    args: &RequestArgs,
    auto_approve: bool,
    dry_run: bool,
    working_dir: Option<&Path>,
) -> Result<bool> {
    let settings = load_settings()?;
    let request = args.to_request()?;
    let orchestrator = orchestrator(&settings)?;

    let working_dir = working_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| settings.workspace_dir(&request.workspace_name));
    let auto_approve = auto_approve && !settings.require_approval;
    let dry_run = dry_run || settings.dry_run;
    if settings.require_approval {
        info!("REQUIRE_APPROVAL is set, confirmation will be requested");
    }

    let decision = orchestrator.decide(&request);
    print_decision(&decision);
    println!(
        "{} {}",
        "Working directory:".bold(),
        working_dir.display()
    );

    let result = orchestrator
        .deploy(&request, &decision, &working_dir, auto_approve, dry_run)
        .await?;
    print_result(&result, if dry_run { "plan" } else { "deploy" });
    Ok(result.success)
}

pub async fn handle_destroy(working_dir: &Path, auto_approve: bool) -> Result<bool> {
    let settings = load_settings()?;
    let orchestrator = orchestrator(&settings)?;
    let auto_approve = auto_approve && !settings.require_approval;

    let result = orchestrator.teardown(working_dir, auto_approve).await;
    print_result(&result, "destroy");
    Ok(result.success)
}
