//! Preview teardown for a single ref.
//!
//! Runs strictly in sequence: delete the GitHub environment named after the
//! ref slug, collect every Pages deployment triggered from that branch, then
//! force-delete each one. HTTP status failures are reported and skipped;
//! transport failures abort the run.

use crate::error::{ApiError, ApiResult};
use crate::pagination::matching_deployments;
use crate::{DeploymentApi, EnvironmentApi};
use futures::StreamExt;
use preview_sweep_core::{Config, Deployment};

/// What a cleanup run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupSummary {
    pub environment_deleted: bool,
    /// Deployments matching the ref slug
    pub matched: usize,
    pub deleted: usize,
    pub failed: usize,
}

pub struct Cleanup<'a, G: ?Sized, C: ?Sized> {
    config: &'a Config,
    github: &'a G,
    cloudflare: &'a C,
    dry_run: bool,
}

impl<'a, G, C> Cleanup<'a, G, C>
where
    G: EnvironmentApi + ?Sized,
    C: DeploymentApi + ?Sized,
{
    pub fn new(config: &'a Config, github: &'a G, cloudflare: &'a C) -> Self {
        Self {
            config,
            github,
            cloudflare,
            dry_run: false,
        }
    }

    /// List what would be deleted without issuing any DELETE requests
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> ApiResult<CleanupSummary> {
        let slug = &self.config.ref_slug;
        println!("🧹 Starting cleanup for '{}'...", slug);
        if self.dry_run {
            println!("   (dry run - nothing will be deleted)");
        }
        println!();

        let mut summary = CleanupSummary {
            environment_deleted: self.delete_environment().await?,
            ..Default::default()
        };
        println!();

        let deployments = self.collect_deployments().await?;
        summary.matched = deployments.len();
        println!();

        if !deployments.is_empty() {
            println!("🗑️  Deleting {} Pages deployment(s)...", deployments.len());
        }
        for deployment in &deployments {
            if self.delete_deployment(deployment).await? {
                summary.deleted += 1;
            } else if !self.dry_run {
                summary.failed += 1;
            }
        }

        tracing::debug!(?summary, "Cleanup finished");
        println!();
        println!("✅ DONE!");
        Ok(summary)
    }

    async fn delete_environment(&self) -> ApiResult<bool> {
        let slug = &self.config.ref_slug;
        println!(
            "🐙 Deleting GitHub environment '{}' in {}/{}...",
            slug, self.config.github.owner, self.config.github.repo
        );

        if self.dry_run {
            println!("   Would delete environment '{}'", slug);
            return Ok(false);
        }

        match self.github.delete_environment(slug).await {
            Ok(()) => {
                println!("   ✓ Environment deleted");
                Ok(true)
            }
            Err(e) if e.is_recoverable() => {
                report("Failed to delete environment", &e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Drain the paginated listing before anything is deleted, so removals
    /// cannot shift later records onto pages that were already visited.
    async fn collect_deployments(&self) -> ApiResult<Vec<Deployment>> {
        println!(
            "🔍 Finding Pages deployments of '{}' for branch '{}'...",
            self.config.cloudflare.project_name, self.config.ref_slug
        );

        let stream = matching_deployments(
            self.cloudflare,
            &self.config.ref_slug,
            self.config.max_pages,
        );
        futures::pin_mut!(stream);

        let mut found = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(deployment) => found.push(deployment),
                Err(e) if e.is_recoverable() => {
                    report("Failed to list deployments", &e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        println!("   Found {} matching deployment(s)", found.len());
        Ok(found)
    }

    async fn delete_deployment(&self, deployment: &Deployment) -> ApiResult<bool> {
        let label = deployment_label(deployment);

        if self.dry_run {
            println!("   Would delete {}", label);
            return Ok(false);
        }

        match self.cloudflare.delete_deployment(&deployment.id).await {
            Ok(()) => {
                println!("   ✓ Deleted {}", label);
                Ok(true)
            }
            Err(e) if e.is_recoverable() => {
                report(&format!("Failed to delete {}", label), &e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// `id (url, created 2024-05-01 12:00 UTC)`, leaving out whatever is unknown
fn deployment_label(deployment: &Deployment) -> String {
    let mut details = Vec::new();
    if let Some(url) = &deployment.url {
        details.push(url.clone());
    }
    if let Some(created_on) = &deployment.created_on {
        details.push(format!("created {}", created_on.format("%Y-%m-%d %H:%M UTC")));
    }

    if details.is_empty() {
        deployment.id.clone()
    } else {
        format!("{} ({})", deployment.id, details.join(", "))
    }
}

fn report(what: &str, error: &ApiError) {
    println!("   ⚠️  {}: {}", what, error);
}
