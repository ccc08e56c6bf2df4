// Cloudflare Pages API client: deployment listing and removal

use crate::error::{ApiError, ApiResult};
use crate::http::{auth_headers, build_client, endpoint, error_for_status};
use crate::DeploymentApi;
use async_trait::async_trait;
use preview_sweep_core::{CloudflareConfig, CloudflareResponse, Deployment};
use reqwest::Url;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use std::time::Duration;

pub struct CloudflareClient {
    client: reqwest::Client,
    deployments_url: Url,
}

impl CloudflareClient {
    pub fn new(config: &CloudflareConfig, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut headers = auth_headers(&config.api_token)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let deployments_url = endpoint(
            &config.api_url,
            &[
                "accounts",
                &config.account_id,
                "pages",
                "projects",
                &config.project_name,
                "deployments",
            ],
        )?;

        Ok(Self {
            client: build_client(headers, timeout)?,
            deployments_url,
        })
    }

    /// `{api}/accounts/{account}/pages/projects/{project}/deployments`
    pub fn deployments_url(&self) -> &Url {
        &self.deployments_url
    }

    pub fn deployment_url(&self, id: &str) -> ApiResult<Url> {
        endpoint(self.deployments_url.as_str(), &[id])
    }
}

#[async_trait]
impl DeploymentApi for CloudflareClient {
    async fn list_deployments(&self, page: u32) -> ApiResult<Vec<Deployment>> {
        tracing::debug!(page, url = %self.deployments_url, "Listing Pages deployments");

        let response = self
            .client
            .get(self.deployments_url.clone())
            .query(&[("page", page)])
            .send()
            .await?;
        let response = error_for_status(response).await?;
        let status = response.status();
        let body = response.text().await?;

        let cf_response: CloudflareResponse<Vec<Deployment>> = serde_json::from_str(&body)?;
        if !cf_response.success {
            if let Some(message) = cf_response.error_summary() {
                return Err(ApiError::Status { status, message });
            }
        }

        let deployments = cf_response.result.unwrap_or_default();
        tracing::debug!(page, count = deployments.len(), "Received deployments");
        Ok(deployments)
    }

    async fn delete_deployment(&self, id: &str) -> ApiResult<()> {
        let url = self.deployment_url(id)?;
        tracing::debug!(%url, "Force-deleting Pages deployment");

        let response = self
            .client
            .delete(url)
            .query(&[("force", "true")])
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(())
    }
}
