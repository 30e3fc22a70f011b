use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Environment '{0}' must be one of 'dev', 'staging', 'prod'")]
    InvalidEnvironment(String),

    #[error("Region '{0}' is not a supported Azure region")]
    UnknownRegion(String),

    #[error("Cost limit must be a positive amount, got {0}")]
    InvalidCostLimit(f64),

    #[error("Workspace name '{0}' must be 3-64 characters of lowercase letters, digits and '-'")]
    InvalidWorkspaceName(String),
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Required template not found: {0}")]
    TemplateMissing(String),

    #[error("Failed to generate configuration files: {0}")]
    GenerationFailed(String),

    #[error("Failed to write configuration files: {0}")]
    Io(#[from] std::io::Error),
}
