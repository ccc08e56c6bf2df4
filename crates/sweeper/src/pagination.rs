use crate::error::ApiError;
use crate::DeploymentApi;
use async_stream::try_stream;
use futures::Stream;
use preview_sweep_core::Deployment;

/// Lazily walk the deployment list and yield records triggered from `branch`.
///
/// Pages are requested from 1 upwards, one at a time, only as the stream is
/// polled. The walk ends at the first empty page, at the first error, or
/// after `max_pages` pages, whichever comes first.
pub fn matching_deployments<'a, A>(
    api: &'a A,
    branch: &'a str,
    max_pages: u32,
) -> impl Stream<Item = Result<Deployment, ApiError>> + 'a
where
    A: DeploymentApi + ?Sized,
{
    try_stream! {
        let mut page: u32 = 1;
        loop {
            if page > max_pages {
                tracing::warn!(
                    max_pages,
                    "Deployment list still not exhausted after page cap, stopping"
                );
                break;
            }

            let deployments = api.list_deployments(page).await?;
            if deployments.is_empty() {
                tracing::debug!(page, "Empty page, end of deployment list");
                break;
            }

            for deployment in deployments {
                if deployment.is_for_branch(branch) {
                    yield deployment;
                }
            }

            page += 1;
        }
    }
}
