//! AgentFlow core domain model
//!
//! Shared types for the deployment orchestrator: the typed compute resource
//! identity, the resource model for the three managed kinds, and the
//! environment-based settings used by every command.

pub mod error;
pub mod identity;
pub mod model;
pub mod settings;

pub use error::{CoreError, Result};
pub use identity::ComputeUri;
pub use model::{
    AuthorizationResource, AuthorizationSpec, BindingResource, BindingSpec, ComputeResource,
    ComputeSpec, DeploySpec, ResourceKind,
};
pub use settings::Settings;
