//! Environment-based configuration
//!
//! All identity and endpoint values come from the environment. Validation
//! happens up front and reports every missing variable at once, so an
//! operator fixes the configuration in one pass instead of replaying the
//! command per variable.

use crate::error::{CoreError, Result};
use crate::model::{AuthorizationSpec, BindingSpec, ComputeSpec, DeploySpec};
use std::time::Duration;

pub const ENV_PROJECT: &str = "AGENTFLOW_PROJECT";
pub const ENV_LOCATION: &str = "AGENTFLOW_LOCATION";
pub const ENV_API_ENDPOINT: &str = "AGENTFLOW_API_ENDPOINT";
pub const ENV_ACCESS_TOKEN: &str = "AGENTFLOW_ACCESS_TOKEN";
pub const ENV_AGENT_NAME: &str = "AGENTFLOW_AGENT_NAME";
pub const ENV_AGENT_DESCRIPTION: &str = "AGENTFLOW_AGENT_DESCRIPTION";
pub const ENV_TOOL_DESCRIPTION: &str = "AGENTFLOW_TOOL_DESCRIPTION";
pub const ENV_OAUTH_ID: &str = "AGENTFLOW_OAUTH_ID";
pub const ENV_OAUTH_CLIENT_ID: &str = "AGENTFLOW_OAUTH_CLIENT_ID";
pub const ENV_OAUTH_SECRET_HANDLE: &str = "AGENTFLOW_OAUTH_SECRET_HANDLE";
pub const ENV_OAUTH_TOKEN_ENDPOINT: &str = "AGENTFLOW_OAUTH_TOKEN_ENDPOINT";
pub const ENV_API_TIMEOUT: &str = "AGENTFLOW_API_TIMEOUT";

const DEFAULT_AGENT_NAME: &str = "agentflow-agent";
const DEFAULT_AGENT_DESCRIPTION: &str =
    "Conversational agent for managing records through natural language";
const DEFAULT_TOOL_DESCRIPTION: &str =
    "Creates, reads, updates and deletes business records on request";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration for one process invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project: String,
    pub location: String,
    /// Base URL of the resource API, without a trailing slash.
    pub api_endpoint: String,
    pub access_token: String,
    pub agent_name: String,
    pub agent_description: String,
    pub tool_description: String,
    pub oauth_id: String,
    pub oauth_client_id: String,
    pub oauth_secret_handle: String,
    pub oauth_token_endpoint: String,
    pub api_timeout: Duration,
}

impl Settings {
    /// Load settings from the environment, failing fast before any network
    /// call when required values are missing.
    pub fn from_env() -> Result<Self> {
        let required = [
            ENV_PROJECT,
            ENV_LOCATION,
            ENV_API_ENDPOINT,
            ENV_ACCESS_TOKEN,
            ENV_OAUTH_CLIENT_ID,
            ENV_OAUTH_SECRET_HANDLE,
            ENV_OAUTH_TOKEN_ENDPOINT,
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|name| std::env::var(name).map(|v| v.is_empty()).unwrap_or(true))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::MissingConfig(missing));
        }

        let agent_name =
            std::env::var(ENV_AGENT_NAME).unwrap_or_else(|_| DEFAULT_AGENT_NAME.to_string());

        let api_timeout = match std::env::var(ENV_API_TIMEOUT) {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| CoreError::InvalidConfig {
                    name: ENV_API_TIMEOUT.to_string(),
                    message: format!("expected seconds as an integer, got '{}'", raw),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            project: std::env::var(ENV_PROJECT).unwrap_or_default(),
            location: std::env::var(ENV_LOCATION).unwrap_or_default(),
            api_endpoint: std::env::var(ENV_API_ENDPOINT)
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            access_token: std::env::var(ENV_ACCESS_TOKEN).unwrap_or_default(),
            oauth_id: std::env::var(ENV_OAUTH_ID)
                .unwrap_or_else(|_| format!("{}-oauth", agent_name)),
            oauth_client_id: std::env::var(ENV_OAUTH_CLIENT_ID).unwrap_or_default(),
            oauth_secret_handle: std::env::var(ENV_OAUTH_SECRET_HANDLE).unwrap_or_default(),
            oauth_token_endpoint: std::env::var(ENV_OAUTH_TOKEN_ENDPOINT).unwrap_or_default(),
            agent_description: std::env::var(ENV_AGENT_DESCRIPTION)
                .unwrap_or_else(|_| DEFAULT_AGENT_DESCRIPTION.to_string()),
            tool_description: std::env::var(ENV_TOOL_DESCRIPTION)
                .unwrap_or_else(|_| DEFAULT_TOOL_DESCRIPTION.to_string()),
            agent_name,
            api_timeout,
        })
    }

    /// Desired state derived from the configuration.
    pub fn deploy_spec(&self) -> DeploySpec {
        DeploySpec {
            compute: ComputeSpec {
                display_name: self.agent_name.clone(),
            },
            authorization: AuthorizationSpec {
                id: self.oauth_id.clone(),
                client_id: self.oauth_client_id.clone(),
                secret_handle: self.oauth_secret_handle.clone(),
                token_endpoint: self.oauth_token_endpoint.clone(),
            },
            binding: BindingSpec {
                display_name: self.agent_name.clone(),
                description: self.agent_description.clone(),
                tool_description: self.tool_description.clone(),
            },
        }
    }
}
