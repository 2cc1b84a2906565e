//! Orchestrator error types

use agentflow_core::ResourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport failure for {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Resource not found: {kind} '{key}'")]
    NotFound { kind: ResourceKind, key: String },

    #[error("Ambiguous display name '{name}': {count} bindings match, refusing to pick one")]
    AmbiguousKey { name: String, count: usize },

    #[error(
        "Cannot delete {kind} '{target}': still referenced by {}",
        .blockers.join(", ")
    )]
    ReferenceInUse {
        kind: ResourceKind,
        target: String,
        blockers: Vec<String>,
    },

    #[error("Remote system rejected the request ({status}): {message}")]
    RemoteValidation { status: u16, message: String },

    #[error("Unexpected API response ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Step '{step}' failed for {target}: {source}")]
    Step {
        step: &'static str,
        target: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("State file error: {0}")]
    State(String),

    #[error("Lock acquisition failed: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Attach the orchestration step and resource identity to an error, so
    /// every abort names exactly where it happened.
    pub fn in_step(step: &'static str, target: impl Into<String>) -> impl FnOnce(Self) -> Self {
        let target = target.into();
        move |source| CloudError::Step {
            step,
            target,
            source: Box::new(source),
        }
    }

    /// The underlying error, unwrapped from any step context.
    pub fn root(&self) -> &CloudError {
        match self {
            CloudError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error came from connectivity or token failure. Teardown
    /// aborts on these instead of attempting further steps.
    pub fn is_transport(&self) -> bool {
        matches!(self.root(), CloudError::Transport { .. })
    }
}

impl From<agentflow_core::CoreError> for CloudError {
    fn from(err: agentflow_core::CoreError) -> Self {
        CloudError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
