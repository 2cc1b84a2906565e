//! Platform capability enablement
//!
//! The resource surfaces used by a deploy must be enabled on the project
//! before the first create. These checks are mutually independent, so they
//! are dispatched concurrently and joined before orchestration step 1.
//! Failures here downgrade to warnings: a missing enablement permission
//! should not abort a deploy that may work anyway.

use crate::client::{Method, ResourceClient};
use crate::error::Result;
use futures_util::future::join_all;
use serde::Deserialize;
use std::sync::Arc;

/// Platform services the orchestrator depends on.
pub const REQUIRED_SERVICES: [&str; 3] = ["computeresources", "authorizations", "agents"];

#[derive(Deserialize)]
struct ServiceState {
    #[serde(default)]
    state: String,
}

/// Check each required service and enable the ones that are not.
///
/// Returns the list of services that could not be verified; the caller logs
/// them and proceeds.
pub async fn ensure_enabled(
    client: Arc<dyn ResourceClient>,
    api_endpoint: &str,
) -> Result<Vec<String>> {
    let checks = REQUIRED_SERVICES
        .iter()
        .map(|service| ensure_one(client.clone(), api_endpoint, service));
    let outcomes = join_all(checks).await;

    let unverified: Vec<String> = REQUIRED_SERVICES
        .iter()
        .zip(outcomes)
        .filter_map(|(service, outcome)| match outcome {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(service, error = %e, "could not verify service enablement");
                Some(service.to_string())
            }
        })
        .collect();

    Ok(unverified)
}

async fn ensure_one(
    client: Arc<dyn ResourceClient>,
    api_endpoint: &str,
    service: &str,
) -> Result<()> {
    let endpoint = format!("{api_endpoint}/services/{service}");
    let response = client.send(Method::GET, &endpoint, None).await?;

    if response.is_success() {
        let state: ServiceState = response.json()?;
        if state.state == "enabled" {
            tracing::debug!(service, "service already enabled");
            return Ok(());
        }
    }

    tracing::info!(service, "enabling service");
    let enable_endpoint = format!("{endpoint}:enable");
    client.send(Method::POST, &enable_endpoint, None).await?;
    Ok(())
}
