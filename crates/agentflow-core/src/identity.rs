//! Typed identity for compute resources
//!
//! The remote API addresses a compute resource through a structured URI of
//! the shape `projects/{project}/locations/{location}/computeResources/{id}`.
//! Parsing is strict: `ComputeUri::parse(u.to_string()) == u` for every valid
//! URI, and anything that deviates from the format is rejected instead of
//! being pattern-matched loosely.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const COLLECTION_SEGMENT: &str = "computeResources";

/// Canonical identity of a compute resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUri {
    pub project: String,
    pub location: String,
    pub id: String,
}

impl ComputeUri {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            id: id.into(),
        }
    }

    /// Parse a full resource URI.
    pub fn parse(uri: &str) -> Result<Self> {
        let segments: Vec<&str> = uri.split('/').collect();
        match segments.as_slice() {
            ["projects", project, "locations", location, COLLECTION_SEGMENT, id] => {
                if project.is_empty() || location.is_empty() || id.is_empty() {
                    return Err(CoreError::InvalidUri(uri.to_string()));
                }
                Ok(Self::new(*project, *location, *id))
            }
            _ => Err(CoreError::InvalidUri(uri.to_string())),
        }
    }

    /// Accept either a full URI or a bare resource ID.
    ///
    /// A bare ID is resolved against the configured project and location.
    pub fn parse_or_bare(value: &str, project: &str, location: &str) -> Result<Self> {
        if value.contains('/') {
            return Self::parse(value);
        }
        if value.is_empty() {
            return Err(CoreError::InvalidId(value.to_string()));
        }
        Ok(Self::new(project, location, value))
    }
}

impl fmt::Display for ComputeUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/{}/{}",
            self.project, self.location, COLLECTION_SEGMENT, self.id
        )
    }
}

impl FromStr for ComputeUri {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
