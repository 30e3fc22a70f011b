use std::path::Path;

use anyhow::{Context, Result};
use dbx_common::ConfigGenerator;

use crate::print::print_decision;
use crate::utils::{decision_engine, load_settings, RequestArgs};

pub fn handle_decide(args: &RequestArgs, json: bool) -> Result<bool> {
    let request = args.to_request()?;
    let decision = decision_engine(&load_settings()?)?.make_decision(&request);

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print_decision(&decision);
    }
    Ok(true)
}

pub fn handle_generate(args: &RequestArgs, out: &Path, templates: Option<&Path>) -> Result<bool> {
    let request = args.to_request()?;
    let decision = decision_engine(&load_settings()?)?.make_decision(&request);

    let generator = match templates {
        Some(dir) => ConfigGenerator::from_directory(dir)?,
        None => ConfigGenerator::builtin()?,
    };
    let written = generator
        .generate_to_directory(
            &decision,
            out,
            request.environment,
            &request.workload_type,
            &request.team,
        )
        .with_context(|| format!("Failed to generate files in {}", out.display()))?;

    print_decision(&decision);
    println!("Terraform files written to {}", written.display());
    Ok(true)
}
