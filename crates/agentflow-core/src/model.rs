//! Resource model shared between the orchestrator and the CLI

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of remote resources managed by the orchestrator.
///
/// Creation order is Compute → Authorization → Binding; deletion is the
/// exact reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Deployed reasoning engine that executes the agent.
    Compute,
    /// Stored OAuth client credential usable by the compute resource.
    Authorization,
    /// Registration that exposes a compute resource as a discoverable agent.
    Binding,
}

impl ResourceKind {
    /// Teardown order: every kind that may reference `self` comes first.
    pub fn teardown_order() -> [ResourceKind; 3] {
        [
            ResourceKind::Binding,
            ResourceKind::Authorization,
            ResourceKind::Compute,
        ]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Compute => write!(f, "compute"),
            ResourceKind::Authorization => write!(f, "authorization"),
            ResourceKind::Binding => write!(f, "binding"),
        }
    }
}

/// Remote view of a compute resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResource {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Remote view of an authorization resource.
///
/// `secret_handle` is an opaque reference into the secret store; the raw
/// secret never passes through this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResource {
    pub id: String,
    pub client_id: String,
    pub secret_handle: String,
    pub token_endpoint: String,
}

/// Remote view of a binding (agent registration).
///
/// The binding is the only resource whose natural key is a human-assigned
/// display name; the remote system does not enforce uniqueness for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingResource {
    #[serde(default)]
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tool_description: String,
    #[serde(default)]
    pub linked_compute_uri: Option<String>,
    #[serde(default)]
    pub linked_authorization_ids: Vec<String>,
}

impl BindingResource {
    /// Whether this binding points at the given compute URI.
    pub fn references_compute(&self, uri: &str) -> bool {
        self.linked_compute_uri.as_deref() == Some(uri)
    }

    /// Whether this binding points at the given authorization ID.
    pub fn references_authorization(&self, id: &str) -> bool {
        self.linked_authorization_ids.iter().any(|a| a == id)
    }
}

/// Desired state of the compute resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeSpec {
    pub display_name: String,
}

/// Desired state of the authorization resource (caller-assigned ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationSpec {
    pub id: String,
    pub client_id: String,
    pub secret_handle: String,
    pub token_endpoint: String,
}

/// Desired state of the binding. The linked compute URI and authorization
/// IDs are filled in by the orchestrator once the prior steps have run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingSpec {
    pub display_name: String,
    pub description: String,
    pub tool_description: String,
}

/// Full desired state for one deployment run.
#[derive(Debug, Clone)]
pub struct DeploySpec {
    pub compute: ComputeSpec,
    pub authorization: AuthorizationSpec,
    pub binding: BindingSpec,
}
