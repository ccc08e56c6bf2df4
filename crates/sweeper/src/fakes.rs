// Test doubles: in-memory API fakes and a one-shot HTTP responder

use crate::error::{ApiError, ApiResult};
use crate::{DeploymentApi, EnvironmentApi};
use async_trait::async_trait;
use preview_sweep_core::{Deployment, DeploymentTrigger, TriggerMetadata};
use reqwest::StatusCode;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub(crate) fn deployment(id: &str, branch: &str) -> Deployment {
    Deployment {
        id: id.to_string(),
        url: Some(format!("https://{}.site.pages.dev", id)),
        environment: Some("preview".to_string()),
        created_on: None,
        deployment_trigger: Some(DeploymentTrigger {
            trigger_type: Some("ad_hoc".to_string()),
            metadata: Some(TriggerMetadata {
                branch: Some(branch.to_string()),
                ..Default::default()
            }),
        }),
    }
}

fn malformed() -> ApiError {
    ApiError::Decode(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err())
}

/// Ordered record of calls across both fakes
#[derive(Debug, Default, Clone)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

pub(crate) struct FakeGithub {
    journal: Journal,
    fail_with: Option<StatusCode>,
}

impl FakeGithub {
    pub(crate) fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail_with: None,
        }
    }

    pub(crate) fn failing(mut self, status: StatusCode) -> Self {
        self.fail_with = Some(status);
        self
    }
}

#[async_trait]
impl EnvironmentApi for FakeGithub {
    async fn delete_environment(&self, name: &str) -> ApiResult<()> {
        self.journal.record(format!("github:delete:{}", name));
        match self.fail_with {
            Some(status) => Err(ApiError::status(status, r#"{"message":"Not Found"}"#)),
            None => Ok(()),
        }
    }
}

pub(crate) enum FakePage {
    Deployments(Vec<Deployment>),
    Fail(StatusCode),
    Garbage,
}

pub(crate) struct FakeCloudflare {
    journal: Journal,
    pages: Vec<FakePage>,
    endless: bool,
    failing_deletes: HashSet<String>,
    fatal_deletes: HashSet<String>,
}

impl FakeCloudflare {
    pub(crate) fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            pages: Vec::new(),
            endless: false,
            failing_deletes: HashSet::new(),
            fatal_deletes: HashSet::new(),
        }
    }

    pub(crate) fn page(mut self, deployments: Vec<Deployment>) -> Self {
        self.pages.push(FakePage::Deployments(deployments));
        self
    }

    pub(crate) fn failing_page(mut self, status: StatusCode) -> Self {
        self.pages.push(FakePage::Fail(status));
        self
    }

    pub(crate) fn garbage_page(mut self) -> Self {
        self.pages.push(FakePage::Garbage);
        self
    }

    /// Repeat the last configured page forever instead of running dry
    pub(crate) fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    pub(crate) fn failing_delete(mut self, id: &str) -> Self {
        self.failing_deletes.insert(id.to_string());
        self
    }

    pub(crate) fn fatal_delete(mut self, id: &str) -> Self {
        self.fatal_deletes.insert(id.to_string());
        self
    }
}

#[async_trait]
impl DeploymentApi for FakeCloudflare {
    async fn list_deployments(&self, page: u32) -> ApiResult<Vec<Deployment>> {
        self.journal.record(format!("cloudflare:list:{}", page));

        let index = page as usize - 1;
        let page = match self.pages.get(index) {
            Some(p) => Some(p),
            None if self.endless => self.pages.last(),
            None => None,
        };

        match page {
            Some(FakePage::Deployments(d)) => Ok(d.clone()),
            Some(FakePage::Fail(status)) => Err(ApiError::status(
                *status,
                r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}]}"#,
            )),
            Some(FakePage::Garbage) => Err(malformed()),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_deployment(&self, id: &str) -> ApiResult<()> {
        self.journal.record(format!("cloudflare:delete:{}", id));

        if self.fatal_deletes.contains(id) {
            return Err(malformed());
        }
        if self.failing_deletes.contains(id) {
            return Err(ApiError::status(
                StatusCode::BAD_REQUEST,
                r#"{"success":false,"errors":[{"code":8000034,"message":"Cannot delete the active production deployment"}]}"#,
            ));
        }
        Ok(())
    }
}

/// Local HTTP endpoint that answers exactly one request with a canned response
pub(crate) struct TestServer {
    pub base_url: String,
    handle: JoinHandle<String>,
}

impl TestServer {
    /// Raw request head (request line + headers) as received
    pub(crate) async fn request(self) -> String {
        self.handle.await.unwrap()
    }
}

pub(crate) async fn serve_once(status: &str, body: &str) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
            if received.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&received).into_owned()
    });

    TestServer {
        base_url: format!("http://{}", addr),
        handle,
    }
}
