use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cloudflare Pages deployment as returned by the deployments API.
///
/// Only `id` is guaranteed; everything else is read leniently so that
/// partially populated records (e.g. direct uploads without a trigger)
/// still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_trigger: Option<DeploymentTrigger>,
}

/// What caused a deployment to be created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentTrigger {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TriggerMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TriggerMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
}

impl Deployment {
    /// Source branch recorded in the trigger metadata, if any
    pub fn branch(&self) -> Option<&str> {
        self.deployment_trigger
            .as_ref()
            .and_then(|t| t.metadata.as_ref())
            .and_then(|m| m.branch.as_deref())
    }

    /// True when this deployment was triggered from `branch`
    pub fn is_for_branch(&self, branch: &str) -> bool {
        self.branch() == Some(branch)
    }
}

/// Cloudflare v4 API response envelope
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CloudflareError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl<T> CloudflareResponse<T> {
    /// Joined error messages, e.g. `"8000007: Project not found"`
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
