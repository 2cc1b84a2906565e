//! Generic resource manager
//!
//! One manager implementation covers all three resource kinds; the
//! differences (endpoint, identity scheme, update behavior) live in a
//! [`KindSpec`] capability descriptor instead of three copies of the same
//! control flow.

use crate::client::{ApiResponse, Method, ResourceClient};
use crate::error::{CloudError, Result};
use agentflow_core::ResourceKind;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// How a resource kind is identified by its natural key.
#[derive(Debug, Clone)]
pub enum IdentityScheme {
    /// Server-assigned ID, direct GET/DELETE by ID.
    ResourceId,
    /// Caller-assigned ID passed as a query parameter on create.
    CallerAssignedId { param: &'static str },
    /// Human-assigned display name; no GET-by-name exists, so lookup is
    /// list-and-match. More than one match is an error, never a guess.
    DisplayName,
}

/// What `create_or_update` does when the resource already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStrategy {
    /// Full-replace PATCH with the desired spec (no partial merge, to avoid
    /// stale-field drift).
    Patch,
    /// The REST surface has no update operation; the existing resource is
    /// returned unchanged.
    KeepExisting,
}

/// Capability descriptor for one resource kind.
#[derive(Debug, Clone)]
pub struct KindSpec {
    pub kind: ResourceKind,
    /// Absolute URL of the collection.
    pub collection: String,
    pub identity: IdentityScheme,
    pub update: UpdateStrategy,
}

impl KindSpec {
    pub fn compute(api_endpoint: &str) -> Self {
        Self {
            kind: ResourceKind::Compute,
            collection: format!("{api_endpoint}/computeResources"),
            identity: IdentityScheme::ResourceId,
            update: UpdateStrategy::KeepExisting,
        }
    }

    pub fn authorization(api_endpoint: &str) -> Self {
        Self {
            kind: ResourceKind::Authorization,
            collection: format!("{api_endpoint}/authorizations"),
            identity: IdentityScheme::CallerAssignedId {
                param: "authorizationId",
            },
            update: UpdateStrategy::KeepExisting,
        }
    }

    pub fn binding(api_endpoint: &str) -> Self {
        Self {
            kind: ResourceKind::Binding,
            collection: format!("{api_endpoint}/agents"),
            identity: IdentityScheme::DisplayName,
            update: UpdateStrategy::Patch,
        }
    }
}

/// A remote resource as returned by the API.
#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: ResourceKind,
    pub id: String,
    pub display_name: Option<String>,
    pub body: Value,
}

/// Outcome of an idempotent delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The resource was already gone; not an error.
    AlreadyAbsent,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    resources: Vec<Value>,
}

/// Manager for one resource kind, generic over the transport.
#[derive(Clone)]
pub struct ResourceManager {
    client: Arc<dyn ResourceClient>,
    spec: KindSpec,
}

impl ResourceManager {
    pub fn new(client: Arc<dyn ResourceClient>, spec: KindSpec) -> Self {
        Self { client, spec }
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind
    }

    /// Look up a resource by its natural key.
    ///
    /// Returns `None` when the resource is absent. For display-name kinds a
    /// duplicate name is `AmbiguousKey`, which must reach the operator
    /// instead of being resolved silently.
    pub async fn exists(&self, key: &str) -> Result<Option<Resource>> {
        match self.spec.identity {
            IdentityScheme::DisplayName => {
                let mut matches: Vec<Resource> = self
                    .list()
                    .await?
                    .into_iter()
                    .filter(|r| r.display_name.as_deref() == Some(key))
                    .collect();
                match matches.len() {
                    0 => Ok(None),
                    1 => Ok(Some(matches.remove(0))),
                    count => Err(CloudError::AmbiguousKey {
                        name: key.to_string(),
                        count,
                    }),
                }
            }
            _ => self.fetch(key).await,
        }
    }

    /// List every resource in the collection.
    pub async fn list(&self) -> Result<Vec<Resource>> {
        let response = self
            .client
            .send(Method::GET, &self.spec.collection, None)
            .await?;
        if !response.is_success() {
            return Err(self.error_for(&self.spec.collection, response));
        }
        let listing: ListResponse = response.json()?;
        listing
            .resources
            .into_iter()
            .map(|value| self.parse_resource(value))
            .collect()
    }

    /// Create the resource, or bring an existing one to the desired spec.
    ///
    /// `key` is the natural key to check for a pre-existing resource; `None`
    /// skips the check and always creates (first-time compute deploys, where
    /// no ID exists yet).
    pub async fn create_or_update(&self, key: Option<&str>, body: Value) -> Result<Resource> {
        let existing = match key {
            Some(key) => self.exists(key).await?,
            None => None,
        };

        if let Some(found) = existing {
            return match self.spec.update {
                UpdateStrategy::Patch => {
                    tracing::info!(kind = %self.spec.kind, id = %found.id, "updating existing resource");
                    let endpoint = format!("{}/{}", self.spec.collection, found.id);
                    let response = self.client.send(Method::PATCH, &endpoint, Some(body)).await?;
                    self.expect_resource(&endpoint, response)
                }
                UpdateStrategy::KeepExisting => {
                    tracing::info!(kind = %self.spec.kind, id = %found.id, "resource already exists");
                    Ok(found)
                }
            };
        }

        let endpoint = match self.spec.identity {
            IdentityScheme::CallerAssignedId { param } => {
                let key = key.ok_or_else(|| {
                    CloudError::Configuration(format!(
                        "{} create requires a caller-assigned ID",
                        self.spec.kind
                    ))
                })?;
                format!("{}?{}={}", self.spec.collection, param, key)
            }
            _ => self.spec.collection.clone(),
        };

        tracing::info!(kind = %self.spec.kind, "creating resource");
        let response = self.client.send(Method::POST, &endpoint, Some(body)).await?;
        self.expect_resource(&endpoint, response)
    }

    /// Delete by natural key. A 404 means the resource is already gone and
    /// counts as success.
    pub async fn delete(&self, key: &str) -> Result<DeleteOutcome> {
        let id = match self.spec.identity {
            IdentityScheme::DisplayName => match self.exists(key).await? {
                Some(resource) => resource.id,
                None => return Ok(DeleteOutcome::AlreadyAbsent),
            },
            _ => key.to_string(),
        };
        self.delete_by_id(&id).await
    }

    /// Delete by the server-assigned ID directly.
    pub async fn delete_by_id(&self, id: &str) -> Result<DeleteOutcome> {
        let endpoint = format!("{}/{}", self.spec.collection, id);
        let response = self.client.send(Method::DELETE, &endpoint, None).await?;
        match response.status {
            404 => {
                tracing::debug!(kind = %self.spec.kind, id, "already absent, delete is a no-op");
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            _ if response.is_success() => Ok(DeleteOutcome::Deleted),
            _ => Err(self.error_for(&endpoint, response)),
        }
    }

    /// Read a resource by its server-assigned ID.
    pub async fn fetch(&self, id: &str) -> Result<Option<Resource>> {
        let endpoint = format!("{}/{}", self.spec.collection, id);
        let response = self.client.send(Method::GET, &endpoint, None).await?;
        match response.status {
            404 => Ok(None),
            _ if response.is_success() => Ok(Some(self.parse_resource(response.json()?)?)),
            _ => Err(self.error_for(&endpoint, response)),
        }
    }

    fn expect_resource(&self, endpoint: &str, response: ApiResponse) -> Result<Resource> {
        if !response.is_success() {
            return Err(self.error_for(endpoint, response));
        }
        self.parse_resource(response.json()?)
    }

    fn parse_resource(&self, value: Value) -> Result<Resource> {
        let id = value
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CloudError::Api {
                status: 200,
                message: format!("{} resource without an 'id' field", self.spec.kind),
            })?
            .to_string();
        let display_name = value
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(String::from);
        Ok(Resource {
            kind: self.spec.kind,
            id,
            display_name,
            body: value,
        })
    }

    fn error_for(&self, endpoint: &str, response: ApiResponse) -> CloudError {
        match response.status {
            401 | 403 => CloudError::Transport {
                endpoint: endpoint.to_string(),
                reason: format!("authentication rejected ({})", response.status),
            },
            400 | 409 | 422 => CloudError::RemoteValidation {
                status: response.status,
                message: response.text(),
            },
            status => CloudError::Api {
                status,
                message: response.text(),
            },
        }
    }
}
