//! Deployment orchestrator
//!
//! Sequences the resource managers in dependency order for `up` and in
//! strict reverse order for `down`. Every successful remote create is
//! persisted to the state store before the next step runs, so a crashed
//! run can be resumed by re-running `up` (idempotent) or unwound with
//! `down`. There is no automatic rollback of prior steps: for a three-step
//! remote-state workflow an idempotent re-run is simpler to reason about
//! than rollback logic that can itself fail.

use crate::client::ResourceClient;
use crate::confirm::ConfirmationGate;
use crate::error::{CloudError, Result};
use crate::guard::ReferenceGuard;
use crate::resource::{DeleteOutcome, KindSpec, Resource, ResourceManager};
use crate::services;
use crate::state::StateStore;
use agentflow_core::{BindingSpec, ComputeUri, DeploySpec, ResourceKind, Settings};
use serde_json::{Value, json};
use std::sync::Arc;

/// Identities produced by a successful deploy.
#[derive(Debug, Clone)]
pub struct UpReport {
    pub compute_uri: String,
    pub authorization_id: String,
    pub binding_id: String,
    /// Platform services whose enablement could not be verified.
    pub unverified_services: Vec<String>,
}

/// What happened to one teardown step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Deleted remotely and removed from the record.
    Removed { kind: ResourceKind, target: String },
    /// Already gone remotely; record entry cleared.
    AlreadyAbsent { kind: ResourceKind, target: String },
    /// Operator declined the confirmation gate; nothing was sent.
    Declined { kind: ResourceKind, target: String },
    /// Skipped: bindings still reference the resource.
    Blocked {
        kind: ResourceKind,
        target: String,
        blockers: Vec<String>,
    },
    /// Nothing recorded for this kind.
    NotRecorded { kind: ResourceKind },
}

/// Teardown result. Blocked and declined steps downgrade the run to
/// partial completion instead of failing it, so the operator can resolve
/// the blockers manually and re-run.
#[derive(Debug, Clone, Default)]
pub struct TeardownReport {
    pub steps: Vec<StepOutcome>,
}

impl TeardownReport {
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| {
            !matches!(
                s,
                StepOutcome::Blocked { .. } | StepOutcome::Declined { .. }
            )
        })
    }
}

/// Outcome of a single guarded delete command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Deleted,
    AlreadyAbsent,
    Declined,
}

/// Remote presence of one recorded identity.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub kind: ResourceKind,
    pub target: String,
    pub present: bool,
}

pub struct Deployer {
    client: Arc<dyn ResourceClient>,
    compute: ResourceManager,
    authorization: ResourceManager,
    binding: ResourceManager,
    guard: ReferenceGuard,
    store: StateStore,
    gate: Arc<dyn ConfirmationGate>,
    project: String,
    location: String,
    api_endpoint: String,
}

impl Deployer {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        settings: &Settings,
        store: StateStore,
        gate: Arc<dyn ConfirmationGate>,
    ) -> Self {
        let compute = ResourceManager::new(client.clone(), KindSpec::compute(&settings.api_endpoint));
        let authorization =
            ResourceManager::new(client.clone(), KindSpec::authorization(&settings.api_endpoint));
        let binding = ResourceManager::new(client.clone(), KindSpec::binding(&settings.api_endpoint));
        let guard = ReferenceGuard::new(binding.clone());
        Self {
            client,
            compute,
            authorization,
            binding,
            guard,
            store,
            gate,
            project: settings.project.clone(),
            location: settings.location.clone(),
            api_endpoint: settings.api_endpoint.clone(),
        }
    }

    /// Run the full deploy sequence. Idempotent: a re-run finds the
    /// resources created by a previous (possibly interrupted) run and
    /// updates instead of duplicating them.
    pub async fn up(&self, spec: &DeploySpec) -> Result<UpReport> {
        let lock = self.store.acquire_lock().await?;
        let result = self.run_up(spec).await;
        lock.release().await?;
        result
    }

    async fn run_up(&self, spec: &DeploySpec) -> Result<UpReport> {
        // Prerequisite capabilities are mutually independent; check them
        // concurrently and join before step 1.
        let unverified_services =
            services::ensure_enabled(self.client.clone(), &self.api_endpoint).await?;

        // Step 1: compute
        let record = self.store.load().await?;
        let stored_compute_id = match record.get(ResourceKind::Compute) {
            Some(uri) => Some(ComputeUri::parse(uri)?.id),
            None => None,
        };
        let compute_body = json!({ "displayName": spec.compute.display_name });
        let compute = self
            .compute
            .create_or_update(stored_compute_id.as_deref(), compute_body)
            .await
            .map_err(CloudError::in_step("compute", spec.compute.display_name.clone()))?;
        let compute_uri = ComputeUri::new(&self.project, &self.location, &compute.id);
        self.store
            .put(ResourceKind::Compute, compute_uri.to_string())
            .await?;
        tracing::info!(uri = %compute_uri, "compute resource ready");

        // Step 2: authorization
        let auth_body = json!({
            "clientId": spec.authorization.client_id,
            "secretHandle": spec.authorization.secret_handle,
            "tokenEndpoint": spec.authorization.token_endpoint,
        });
        let authorization = self
            .authorization
            .create_or_update(Some(&spec.authorization.id), auth_body)
            .await
            .map_err(CloudError::in_step(
                "authorization",
                spec.authorization.id.clone(),
            ))?;
        self.store
            .put(ResourceKind::Authorization, &authorization.id)
            .await?;
        tracing::info!(id = %authorization.id, "authorization resource ready");

        // Step 3: binding, linked to both prior identities
        let binding_body = binding_body(
            &spec.binding,
            Some(compute_uri.to_string()),
            vec![authorization.id.clone()],
        );
        let binding = self
            .binding
            .create_or_update(Some(&spec.binding.display_name), binding_body)
            .await
            .map_err(CloudError::in_step("binding", spec.binding.display_name.clone()))?;
        self.store.put(ResourceKind::Binding, &binding.id).await?;
        tracing::info!(id = %binding.id, "binding ready");

        Ok(UpReport {
            compute_uri: compute_uri.to_string(),
            authorization_id: authorization.id,
            binding_id: binding.id,
            unverified_services,
        })
    }

    /// Tear everything down in reverse order.
    ///
    /// The binding goes first, unconditionally (nothing references a
    /// binding). Authorization and compute are each checked against the
    /// reference guard; a blocked step is reported and skipped, not failed.
    /// Transport errors abort the remaining steps.
    pub async fn down(&self) -> Result<TeardownReport> {
        let lock = self.store.acquire_lock().await?;
        let result = self.run_down().await;
        lock.release().await?;
        result
    }

    async fn run_down(&self) -> Result<TeardownReport> {
        let record = self.store.load().await?;
        let mut report = TeardownReport::default();

        // Step 1: binding
        match record.get(ResourceKind::Binding) {
            Some(id) => {
                let id = id.to_string();
                let target = format!("binding '{id}'");
                if self.gate.confirm("delete", &target) {
                    let outcome = self
                        .binding
                        .delete_by_id(&id)
                        .await
                        .map_err(CloudError::in_step("binding", id.clone()))?;
                    self.store.remove(ResourceKind::Binding).await?;
                    report.steps.push(match outcome {
                        DeleteOutcome::Deleted => StepOutcome::Removed {
                            kind: ResourceKind::Binding,
                            target: id,
                        },
                        DeleteOutcome::AlreadyAbsent => StepOutcome::AlreadyAbsent {
                            kind: ResourceKind::Binding,
                            target: id,
                        },
                    });
                } else {
                    tracing::warn!(id, "binding delete declined, skipping");
                    report.steps.push(StepOutcome::Declined {
                        kind: ResourceKind::Binding,
                        target: id,
                    });
                }
            }
            None => report.steps.push(StepOutcome::NotRecorded {
                kind: ResourceKind::Binding,
            }),
        }

        // Step 2: authorization, guarded
        match record.get(ResourceKind::Authorization) {
            Some(id) => {
                let id = id.to_string();
                let step = self
                    .guarded_delete(ResourceKind::Authorization, &id, &id, &self.authorization)
                    .await?;
                report.steps.push(step);
            }
            None => report.steps.push(StepOutcome::NotRecorded {
                kind: ResourceKind::Authorization,
            }),
        }

        // Step 3: compute, guarded
        match record.get(ResourceKind::Compute) {
            Some(uri) => {
                let uri = uri.to_string();
                let id = ComputeUri::parse(&uri)?.id;
                let step = self
                    .guarded_delete(ResourceKind::Compute, &uri, &id, &self.compute)
                    .await?;
                report.steps.push(step);
            }
            None => report.steps.push(StepOutcome::NotRecorded {
                kind: ResourceKind::Compute,
            }),
        }

        Ok(report)
    }

    /// Guard check, confirmation gate, delete, record cleanup, in that
    /// order. `reference_target` is what bindings point at (URI for
    /// compute, ID for authorization); `id` addresses the DELETE.
    async fn guarded_delete(
        &self,
        kind: ResourceKind,
        reference_target: &str,
        id: &str,
        manager: &ResourceManager,
    ) -> Result<StepOutcome> {
        let blockers = self.guard.referenced_by(kind, reference_target).await?;
        if !blockers.is_empty() {
            tracing::warn!(%kind, target = reference_target, ?blockers, "delete blocked by references, skipping");
            return Ok(StepOutcome::Blocked {
                kind,
                target: reference_target.to_string(),
                blockers,
            });
        }

        let target = format!("{kind} '{reference_target}'");
        if !self.gate.confirm("delete", &target) {
            tracing::warn!(%kind, target = reference_target, "delete declined, skipping");
            return Ok(StepOutcome::Declined {
                kind,
                target: reference_target.to_string(),
            });
        }

        let outcome = manager
            .delete_by_id(id)
            .await
            .map_err(CloudError::in_step("teardown", reference_target.to_string()))?;
        self.store.remove(kind).await?;
        Ok(match outcome {
            DeleteOutcome::Deleted => StepOutcome::Removed {
                kind,
                target: reference_target.to_string(),
            },
            DeleteOutcome::AlreadyAbsent => StepOutcome::AlreadyAbsent {
                kind,
                target: reference_target.to_string(),
            },
        })
    }

    /// Register a binding against an existing compute resource.
    ///
    /// The compute must exist; registering against a missing one fails
    /// loudly instead of creating a dangling binding.
    pub async fn register(&self, compute: &ComputeUri, spec: &BindingSpec) -> Result<Resource> {
        let lock = self.store.acquire_lock().await?;
        let result = self.run_register(compute, spec).await;
        lock.release().await?;
        result
    }

    async fn run_register(&self, compute: &ComputeUri, spec: &BindingSpec) -> Result<Resource> {
        self.compute
            .exists(&compute.id)
            .await?
            .ok_or_else(|| CloudError::NotFound {
                kind: ResourceKind::Compute,
                key: compute.to_string(),
            })?;

        let auth_ids: Vec<String> = self
            .store
            .get(ResourceKind::Authorization)
            .await?
            .into_iter()
            .collect();
        let body = binding_body(spec, Some(compute.to_string()), auth_ids);
        let binding = self
            .binding
            .create_or_update(Some(&spec.display_name), body)
            .await
            .map_err(CloudError::in_step("register", spec.display_name.clone()))?;
        self.store.put(ResourceKind::Binding, &binding.id).await?;
        Ok(binding)
    }

    /// Delete a binding by display name.
    pub async fn unregister(&self, display_name: &str) -> Result<DeleteOutcome> {
        let lock = self.store.acquire_lock().await?;
        let result = self.run_unregister(display_name).await;
        lock.release().await?;
        result
    }

    async fn run_unregister(&self, display_name: &str) -> Result<DeleteOutcome> {
        let existing = self
            .binding
            .exists(display_name)
            .await
            .map_err(CloudError::in_step("unregister", display_name.to_string()))?;
        let Some(binding) = existing else {
            tracing::debug!(display_name, "binding already absent");
            return Ok(DeleteOutcome::AlreadyAbsent);
        };

        let outcome = self
            .binding
            .delete_by_id(&binding.id)
            .await
            .map_err(CloudError::in_step("unregister", display_name.to_string()))?;

        // Clear the record only when it points at this binding
        if self.store.get(ResourceKind::Binding).await?.as_deref() == Some(binding.id.as_str()) {
            self.store.remove(ResourceKind::Binding).await?;
        }
        Ok(outcome)
    }

    /// Guard-checked, gated delete of a single compute resource.
    pub async fn remove_compute(&self, uri: &ComputeUri) -> Result<RemoveOutcome> {
        let lock = self.store.acquire_lock().await?;
        let result = self.run_remove_compute(uri).await;
        lock.release().await?;
        result
    }

    async fn run_remove_compute(&self, uri: &ComputeUri) -> Result<RemoveOutcome> {
        let target = uri.to_string();
        let blockers = self
            .guard
            .referenced_by(ResourceKind::Compute, &target)
            .await?;
        if !blockers.is_empty() {
            return Err(CloudError::ReferenceInUse {
                kind: ResourceKind::Compute,
                target,
                blockers,
            });
        }

        if !self.gate.confirm("delete", &format!("compute '{target}'")) {
            return Ok(RemoveOutcome::Declined);
        }

        let outcome = self
            .compute
            .delete_by_id(&uri.id)
            .await
            .map_err(CloudError::in_step("remove-compute", target.clone()))?;

        // Clear the record only when it points at this resource
        if self.store.get(ResourceKind::Compute).await?.as_deref() == Some(target.as_str()) {
            self.store.remove(ResourceKind::Compute).await?;
        }

        Ok(match outcome {
            DeleteOutcome::Deleted => RemoveOutcome::Deleted,
            DeleteOutcome::AlreadyAbsent => RemoveOutcome::AlreadyAbsent,
        })
    }

    /// Re-verify every recorded identity against the remote system.
    pub async fn status(&self) -> Result<Vec<StatusEntry>> {
        let record = self.store.load().await?;
        let mut entries = Vec::new();

        if let Some(uri) = record.get(ResourceKind::Compute) {
            let id = ComputeUri::parse(uri)?.id;
            let present = self.compute.exists(&id).await?.is_some();
            entries.push(StatusEntry {
                kind: ResourceKind::Compute,
                target: uri.to_string(),
                present,
            });
        }
        if let Some(id) = record.get(ResourceKind::Authorization) {
            let present = self.authorization.exists(id).await?.is_some();
            entries.push(StatusEntry {
                kind: ResourceKind::Authorization,
                target: id.to_string(),
                present,
            });
        }
        if let Some(id) = record.get(ResourceKind::Binding) {
            let present = self.binding.fetch(id).await?.is_some();
            entries.push(StatusEntry {
                kind: ResourceKind::Binding,
                target: id.to_string(),
                present,
            });
        }

        Ok(entries)
    }
}

fn binding_body(
    spec: &BindingSpec,
    linked_compute_uri: Option<String>,
    linked_authorization_ids: Vec<String>,
) -> Value {
    json!({
        "displayName": spec.display_name,
        "description": spec.description,
        "toolDescription": spec.tool_description,
        "linkedComputeUri": linked_compute_uri,
        "linkedAuthorizationIds": linked_authorization_ids,
    })
}
