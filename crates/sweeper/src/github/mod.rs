// GitHub REST client: deployment environments

use crate::error::ApiResult;
use crate::http::{auth_headers, build_client, endpoint, error_for_status};
use crate::EnvironmentApi;
use async_trait::async_trait;
use preview_sweep_core::GithubConfig;
use reqwest::header::{ACCEPT, HeaderName, HeaderValue};
use reqwest::Url;
use std::time::Duration;

pub const API_VERSION: &str = "2022-11-28";
const API_VERSION_HEADER: &str = "x-github-api-version";
const MEDIA_TYPE: &str = "application/vnd.github+json";

pub struct GithubClient {
    client: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut headers = auth_headers(&config.token)?;
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_static(API_VERSION),
        );

        Ok(Self {
            client: build_client(headers, timeout)?,
            api_url: config.api_url.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    /// `{api}/repos/{owner}/{repo}/environments/{name}`
    pub fn environment_url(&self, name: &str) -> ApiResult<Url> {
        endpoint(
            &self.api_url,
            &["repos", &self.owner, &self.repo, "environments", name],
        )
    }
}

#[async_trait]
impl EnvironmentApi for GithubClient {
    async fn delete_environment(&self, name: &str) -> ApiResult<()> {
        let url = self.environment_url(name)?;
        tracing::debug!(%url, "Deleting GitHub environment");

        let response = self.client.delete(url).send().await?;
        error_for_status(response).await?;
        Ok(())
    }
}
