//! Reference guard
//!
//! Before deleting a compute or authorization resource, the orchestrator
//! asks which bindings still point at it. A non-empty answer blocks the
//! delete at the orchestrator level and names the blockers, which is far
//! more actionable than the remote error a doomed DELETE would produce.

use crate::error::Result;
use crate::resource::ResourceManager;
use agentflow_core::{BindingResource, ResourceKind};

pub struct ReferenceGuard {
    bindings: ResourceManager,
}

impl ReferenceGuard {
    pub fn new(bindings: ResourceManager) -> Self {
        Self { bindings }
    }

    /// Display names of bindings that reference the target resource.
    ///
    /// `target` is the compute URI for [`ResourceKind::Compute`] and the
    /// authorization ID for [`ResourceKind::Authorization`]. Bindings are
    /// never referenced by anything, so the answer for them is always empty.
    pub async fn referenced_by(&self, kind: ResourceKind, target: &str) -> Result<Vec<String>> {
        if kind == ResourceKind::Binding {
            return Ok(Vec::new());
        }

        let mut blockers = Vec::new();
        for resource in self.bindings.list().await? {
            let binding: BindingResource = match serde_json::from_value(resource.body.clone()) {
                Ok(binding) => binding,
                Err(e) => {
                    // A binding we cannot read might still hold a reference;
                    // report it rather than letting the delete proceed blind.
                    tracing::warn!(id = %resource.id, error = %e, "unreadable binding counts as a blocker");
                    blockers.push(resource.display_name.unwrap_or(resource.id));
                    continue;
                }
            };

            let references = match kind {
                ResourceKind::Compute => binding.references_compute(target),
                ResourceKind::Authorization => binding.references_authorization(target),
                ResourceKind::Binding => false,
            };
            if references {
                blockers.push(binding.display_name);
            }
        }

        blockers.sort();
        Ok(blockers)
    }
}
