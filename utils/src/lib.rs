mod config_path;
mod file;
mod logging;
mod settings;

pub use config_path::{get_config_dir, get_tables_path};
pub use file::{read_artifacts, write_artifacts};
pub use logging::setup_logging;
pub use settings::{
    RunnerSettings, DEFAULT_TERRAFORM_BINARY, DEFAULT_TIMEOUT_SECONDS, DEFAULT_WORKING_DIR,
};
