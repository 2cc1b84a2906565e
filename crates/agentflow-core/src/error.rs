use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(
        "Missing required configuration: {}\nSet these variables in the environment before running",
        .0.join(", ")
    )]
    MissingConfig(Vec<String>),

    #[error("Invalid configuration value for {name}: {message}")]
    InvalidConfig { name: String, message: String },

    #[error(
        "Invalid compute resource URI: {0}\nExpected: projects/{{project}}/locations/{{location}}/computeResources/{{id}}"
    )]
    InvalidUri(String),

    #[error("Invalid resource identifier: {0}")]
    InvalidId(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
