//! Shared test doubles: an in-memory resource directory standing in for
//! the remote API, and a confirmation gate that records what it was asked.
#![allow(dead_code)]

use agentflow_cloud::{ApiResponse, CloudError, ConfirmationGate, Method, ResourceClient};
use agentflow_core::{
    AuthorizationSpec, BindingSpec, ComputeSpec, DeploySpec, Settings,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const BASE: &str = "https://api.test";

pub fn test_settings() -> Settings {
    Settings {
        project: "demo-project".to_string(),
        location: "us-central1".to_string(),
        api_endpoint: BASE.to_string(),
        access_token: "token".to_string(),
        agent_name: "agent-1".to_string(),
        agent_description: "test agent".to_string(),
        tool_description: "test tool".to_string(),
        oauth_id: "agent-1-oauth".to_string(),
        oauth_client_id: "client-1".to_string(),
        oauth_secret_handle: "secrets/oauth".to_string(),
        oauth_token_endpoint: "https://auth.test/token".to_string(),
        api_timeout: Duration::from_secs(5),
    }
}

pub fn deploy_spec() -> DeploySpec {
    DeploySpec {
        compute: ComputeSpec {
            display_name: "agent-1".to_string(),
        },
        authorization: AuthorizationSpec {
            id: "agent-1-oauth".to_string(),
            client_id: "client-1".to_string(),
            secret_handle: "secrets/oauth".to_string(),
            token_endpoint: "https://auth.test/token".to_string(),
        },
        binding: BindingSpec {
            display_name: "agent-1".to_string(),
            description: "test agent".to_string(),
            tool_description: "test tool".to_string(),
        },
    }
}

struct Rejection {
    method: String,
    path_contains: String,
    status: u16,
    message: String,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Value>>,
    calls: Vec<String>,
    rejections: Vec<Rejection>,
    next_id: u64,
}

/// In-memory stand-in for the remote resource directory.
///
/// Routes the same REST surface the real API exposes: list/create on
/// collections, get/patch/delete on members, caller-assigned IDs via query
/// parameter, and referential validation of binding bodies (a binding that
/// points at an unknown compute or authorization is rejected with a 422,
/// like the remote system would).
pub struct FakeDirectory {
    inner: Mutex<Inner>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn seed(&self, collection: &str, mut doc: Value) {
        let mut inner = self.inner.lock().unwrap();
        if doc.get("id").and_then(|v| v.as_str()).is_none() {
            inner.next_id += 1;
            doc["id"] = json!(format!("{collection}-{}", inner.next_id));
        }
        inner.collections.entry(collection.to_string()).or_default().push(doc);
    }

    /// Reject the next matching request with the given status.
    pub fn reject(&self, method: &str, path_contains: &str, status: u16, message: &str) {
        self.inner.lock().unwrap().rejections.push(Rejection {
            method: method.to_string(),
            path_contains: path_contains.to_string(),
            status,
            message: message.to_string(),
        });
    }

    /// Every request seen so far, as "METHOD /path" strings.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn docs(&self, collection: &str) -> Vec<Value> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Index of the first call matching the predicate string.
    pub fn call_index(&self, needle: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.contains(needle))
    }

    fn validate_binding(inner: &Inner, doc: &Value) -> Option<String> {
        if let Some(uri) = doc.get("linkedComputeUri").and_then(|v| v.as_str()) {
            let id = uri.rsplit('/').next().unwrap_or("");
            let known = inner
                .collections
                .get("computeResources")
                .map(|docs| docs.iter().any(|d| d["id"] == id))
                .unwrap_or(false);
            if !known {
                return Some(format!("unknown compute resource: {uri}"));
            }
        }
        if let Some(ids) = doc.get("linkedAuthorizationIds").and_then(|v| v.as_array()) {
            for id in ids {
                let id = id.as_str().unwrap_or("");
                let known = inner
                    .collections
                    .get("authorizations")
                    .map(|docs| docs.iter().any(|d| d["id"] == id))
                    .unwrap_or(false);
                if !known {
                    return Some(format!("unknown authorization: {id}"));
                }
            }
        }
        None
    }

    fn respond(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status,
            body: serde_json::to_vec(&body).unwrap(),
        }
    }
}

#[async_trait]
impl ResourceClient for FakeDirectory {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, CloudError> {
        let mut inner = self.inner.lock().unwrap();

        let path_and_query = endpoint
            .strip_prefix(BASE)
            .unwrap_or(endpoint)
            .trim_start_matches('/');
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path_and_query, None),
        };
        inner.calls.push(format!("{} /{}", method.as_str(), path));

        if let Some(pos) = inner
            .rejections
            .iter()
            .position(|r| r.method == method.as_str() && path.contains(&r.path_contains))
        {
            let rejection = inner.rejections.remove(pos);
            return Ok(Self::respond(rejection.status, json!({ "error": rejection.message })));
        }

        let segments: Vec<&str> = path.split('/').collect();
        match (method.as_str(), segments.as_slice()) {
            // Platform service enablement surface
            ("GET", ["services", _name]) => Ok(Self::respond(200, json!({ "state": "enabled" }))),
            ("POST", ["services", _name]) => Ok(Self::respond(200, json!({}))),

            ("GET", [collection]) => {
                let docs = inner.collections.get(*collection).cloned().unwrap_or_default();
                Ok(Self::respond(200, json!({ "resources": docs })))
            }

            ("POST", [collection]) => {
                let mut doc = body.unwrap_or_else(|| json!({}));
                if *collection == "agents"
                    && let Some(message) = Self::validate_binding(&inner, &doc)
                {
                    return Ok(Self::respond(422, json!({ "error": message })));
                }
                let id = query
                    .and_then(|q| q.split('&').find_map(|pair| pair.split_once('=')))
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| {
                        inner.next_id += 1;
                        format!("{collection}-{}", inner.next_id)
                    });
                doc["id"] = json!(id);
                inner
                    .collections
                    .entry(collection.to_string())
                    .or_default()
                    .push(doc.clone());
                Ok(Self::respond(200, doc))
            }

            ("GET", [collection, id]) => {
                let found = inner
                    .collections
                    .get(*collection)
                    .and_then(|docs| docs.iter().find(|d| d["id"] == *id))
                    .cloned();
                match found {
                    Some(doc) => Ok(Self::respond(200, doc)),
                    None => Ok(Self::respond(404, json!({ "error": "not found" }))),
                }
            }

            ("PATCH", [collection, id]) => {
                let mut doc = body.unwrap_or_else(|| json!({}));
                if *collection == "agents"
                    && let Some(message) = Self::validate_binding(&inner, &doc)
                {
                    return Ok(Self::respond(422, json!({ "error": message })));
                }
                doc["id"] = json!(*id);
                let docs = inner.collections.entry(collection.to_string()).or_default();
                match docs.iter_mut().find(|d| d["id"] == *id) {
                    Some(existing) => {
                        // Full replace, not a merge
                        *existing = doc.clone();
                        Ok(Self::respond(200, doc))
                    }
                    None => Ok(Self::respond(404, json!({ "error": "not found" }))),
                }
            }

            ("DELETE", [collection, id]) => {
                let docs = inner.collections.entry(collection.to_string()).or_default();
                let before = docs.len();
                docs.retain(|d| d["id"] != *id);
                if docs.len() < before {
                    Ok(Self::respond(200, json!({})))
                } else {
                    Ok(Self::respond(404, json!({ "error": "not found" })))
                }
            }

            _ => Ok(Self::respond(400, json!({ "error": format!("unroutable: {path}") }))),
        }
    }
}

/// Gate that records every question and answers with a fixed value.
pub struct RecordingGate {
    pub answer: bool,
    seen: Mutex<Vec<String>>,
}

impl RecordingGate {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl ConfirmationGate for RecordingGate {
    fn confirm(&self, action: &str, target: &str) -> bool {
        self.seen.lock().unwrap().push(format!("{action} {target}"));
        self.answer
    }
}
