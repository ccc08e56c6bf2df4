use crate::error::{ApiError, ApiResult};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Response, Url};
use std::time::Duration;

const AGENT: &str = concat!("preview-sweep/", env!("CARGO_PKG_VERSION"));

/// Append path segments to a base URL, percent-encoding each one
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> ApiResult<Url> {
    let mut url =
        Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(format!("{}: cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Default headers shared by every client: bearer auth and a user agent
pub(crate) fn auth_headers(token: &str) -> ApiResult<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));
    Ok(headers)
}

pub(crate) fn build_client(
    headers: HeaderMap,
    timeout: Option<Duration>,
) -> ApiResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Pass successful responses through; turn anything else into [`ApiError::Status`]
pub(crate) async fn error_for_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(ApiError::status(status, &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let url = endpoint(
            "https://api.cloudflare.com/client/v4",
            &["accounts", "acc", "pages", "projects", "site", "deployments"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.cloudflare.com/client/v4/accounts/acc/pages/projects/site/deployments"
        );
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let url = endpoint("https://api.github.com", &["repos", "acme", "site"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/acme/site");
    }

    #[test]
    fn test_endpoint_encodes_slashes_in_segment() {
        let url = endpoint("https://api.github.com", &["environments", "feature/x y"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/environments/feature%2Fx%20y"
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(matches!(
            endpoint("not a url", &["x"]),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_auth_headers() {
        let headers = auth_headers("secret").unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer secret");
        assert!(auth.is_sensitive());
        let agent = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(agent.starts_with("preview-sweep/"));
    }

    #[test]
    fn test_auth_headers_rejects_newlines() {
        assert!(matches!(
            auth_headers("bad\ntoken"),
            Err(ApiError::InvalidHeader(_))
        ));
    }
}
