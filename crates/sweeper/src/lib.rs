// Preview teardown: GitHub environments and Cloudflare Pages deployments

pub mod cleanup;
pub mod cloudflare;
pub mod error;
pub mod github;
pub mod pagination;

mod http;

#[cfg(test)]
mod fakes;

use async_trait::async_trait;
use preview_sweep_core::Deployment;

pub use cleanup::{Cleanup, CleanupSummary};
pub use cloudflare::CloudflareClient;
pub use error::{ApiError, ApiResult};
pub use github::GithubClient;
pub use pagination::matching_deployments;

/// GitHub deployment environments
#[async_trait]
pub trait EnvironmentApi: Send + Sync {
    async fn delete_environment(&self, name: &str) -> ApiResult<()>;
}

/// Cloudflare Pages deployments of a single project
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// One page of deployments, 1-based. An empty page means there are no more.
    async fn list_deployments(&self, page: u32) -> ApiResult<Vec<Deployment>>;

    /// Force-delete a deployment, including any aliases pointing at it
    async fn delete_deployment(&self, id: &str) -> ApiResult<()>;
}
