use colored::Colorize;
use dbx_defs::{DeploymentResult, InfrastructureDecision};
use prettytable::{row, Table};

pub fn print_decision(decision: &InfrastructureDecision) {
    let mut table = Table::new();
    table.add_row(row!["Setting".purple().bold(), "Value".blue().bold()]);
    table.add_row(row!["Workspace", decision.workspace_name]);
    table.add_row(row!["Resource group", decision.resource_group_name]);
    table.add_row(row!["Region", decision.region]);
    table.add_row(row!["SKU", decision.sku]);
    table.add_row(row!["Size", decision.tier]);
    table.add_row(row![
        "Workers",
        format!("{} - {}", decision.min_workers, decision.max_workers)
    ]);
    table.add_row(row!["Driver", decision.driver_instance_type]);
    table.add_row(row!["Worker", decision.worker_instance_type]);
    table.add_row(row!["Runtime", decision.runtime_version]);
    table.add_row(row![
        "Autotermination",
        format!("{} min", decision.autotermination_minutes)
    ]);
    table.printstd();

    let mut costs = Table::new();
    costs.add_row(row!["Cost".purple().bold(), "USD / month".blue().bold()]);
    for (name, amount) in decision.cost_breakdown.components() {
        costs.add_row(row![name, format!("{:.2}", amount)]);
    }
    costs.printstd();

    println!("{}", decision.justification);
    for fallback in &decision.defaults_applied {
        println!("{} {}", "Default applied:".yellow(), fallback);
    }
}

pub fn print_result(result: &DeploymentResult, operation: &str) {
    if let Some(plan) = &result.plan_output {
        println!("{}", plan.trim_end());
    }

    if result.success {
        println!(
            "{} {} finished in {:.1}s",
            "Success:".green().bold(),
            operation,
            result.deployment_time_seconds
        );
    } else {
        println!(
            "{} {} failed after {:.1}s: {}",
            "Failed:".red().bold(),
            operation,
            result.deployment_time_seconds,
            result.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    if let Some(outputs) = result.outputs.as_ref().filter(|o| !o.is_empty()) {
        let mut table = Table::new();
        table.add_row(row!["Output".purple().bold(), "Value".blue().bold()]);
        for (name, value) in outputs {
            table.add_row(row![name, value]);
        }
        table.printstd();
    }
}
