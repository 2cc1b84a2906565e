//! AgentFlow deployment orchestration
//!
//! This crate deploys and tears down the small graph of dependent cloud
//! resources that together expose a conversational agent: a compute
//! resource (reasoning engine), an authorization resource (stored OAuth
//! client), and a binding that registers the two as a discoverable agent.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 AgentFlow CLI                    │
//! │              (agentflow up/down)                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                  Deployer                        │
//! │   up:   compute → authorization → binding        │
//! │   down: binding → authorization → compute        │
//! │  ┌────────────┐ ┌───────────┐ ┌──────────────┐  │
//! │  │ StateStore │ │ Reference │ │ Confirmation │  │
//! │  │ (deploy.   │ │   Guard   │ │     Gate     │  │
//! │  │   json)    │ │           │ │              │  │
//! │  └────────────┘ └───────────┘ └──────────────┘  │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────────────┐
//! │    ResourceManager    │  one generic implementation,
//! │  (KindSpec strategy)  │  parameterized per resource kind
//! └───────┬───────────────┘
//!         │
//! ┌───────▼───────┐
//! │ ResourceClient│  authenticated HTTP, no retries
//! └───────────────┘
//! ```

pub mod client;
pub mod confirm;
pub mod deploy;
pub mod error;
pub mod guard;
pub mod resource;
pub mod services;
pub mod state;

// Re-exports
pub use client::{ApiResponse, HttpResourceClient, Method, ResourceClient};
pub use confirm::{CONFIRM_PHRASE, ConfirmationGate, InteractiveGate, PresetGate};
pub use deploy::{
    Deployer, RemoveOutcome, StatusEntry, StepOutcome, TeardownReport, UpReport,
};
pub use error::{CloudError, Result};
pub use guard::ReferenceGuard;
pub use resource::{DeleteOutcome, IdentityScheme, KindSpec, Resource, ResourceManager, UpdateStrategy};
pub use state::{DeploymentRecord, StateLock, StateStore};
