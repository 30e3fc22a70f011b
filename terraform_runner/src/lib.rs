mod approval;
mod cmd;
mod errors;
mod executor;
mod outputs;
mod terraform;

pub use approval::{ApprovalGate, PromptApproval};
pub use cmd::{run_generic_command, CommandOutput};
pub use errors::CommandError;
pub use executor::DeploymentExecutor;
pub use outputs::{parse_outputs, OutputParseError};
pub use terraform::{terraform_args, CommandRunner, TerraformCli, DEFAULT_MAX_OUTPUT_LINES};
