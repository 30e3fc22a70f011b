mod commands;
mod print;
mod utils;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::Colorize;
use dbx_utils::setup_logging;
use log::error;

use crate::utils::RequestArgs;

#[derive(Parser)]
#[command(name = "dbxweave")]
#[command(about = "Provision Azure Databricks workspaces through terraform", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging (overrides LOG_LEVEL)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configuration that would be chosen for a request
    Decide {
        #[command(flatten)]
        request: RequestArgs,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the terraform files for a request without running terraform
    Generate {
        #[command(flatten)]
        request: RequestArgs,

        /// Directory to write the files to
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Directory of custom .tera templates
        #[arg(long, value_name = "DIR")]
        templates: Option<PathBuf>,
    },

    /// Generate and apply the terraform configuration
    Deploy {
        #[command(flatten)]
        request: RequestArgs,

        /// Apply without asking for confirmation
        #[arg(long)]
        auto_approve: bool,

        /// Stop after terraform plan
        #[arg(long)]
        dry_run: bool,

        /// Working directory (defaults to TERRAFORM_WORKING_DIR/<workspace>)
        #[arg(long, value_name = "DIR")]
        working_dir: Option<PathBuf>,
    },

    /// Destroy everything managed in a working directory
    Destroy {
        /// Working directory of a previous deploy
        #[arg(long, value_name = "DIR")]
        working_dir: PathBuf,

        /// Destroy without asking for confirmation
        #[arg(long)]
        auto_approve: bool,
    },

    /// List the available provisioning capabilities
    Capabilities,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let outcome = match cli.command {
        Commands::Decide { request, json } => commands::decision::handle_decide(&request, json),
        Commands::Generate {
            request,
            out,
            templates,
        } => commands::decision::handle_generate(&request, &out, templates.as_deref()),
        Commands::Deploy {
            request,
            auto_approve,
            dry_run,
            working_dir,
        } => {
            commands::deployment::handle_deploy(
                &request,
                auto_approve,
                dry_run,
                working_dir.as_deref(),
            )
            .await
        }
        Commands::Destroy {
            working_dir,
            auto_approve,
        } => commands::deployment::handle_destroy(&working_dir, auto_approve).await,
        Commands::Capabilities => {
            commands::capability::handle_list();
            Ok(true)
        }
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}
