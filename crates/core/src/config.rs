use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_MAX_PAGES: u32 = 100;
pub const DOTENV_FILE: &str = ".env";

/// Environment variable names read at startup
pub mod vars {
    pub const REF_SLUG: &str = "REF_SLUG";
    pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
    pub const GITHUB_TOKEN: &str = "GH_REPO_TOKEN";
    pub const GITHUB_API_URL: &str = "GITHUB_API_URL";
    pub const CF_ACCOUNT_ID: &str = "CF_ACCOUNT_ID";
    pub const CF_PROJECT_NAME: &str = "CF_PROJECT_NAME";
    pub const CF_API_TOKEN: &str = "CF_API_TOKEN";
    pub const CLOUDFLARE_API_URL: &str = "CLOUDFLARE_API_URL";
    pub const MAX_PAGES: &str = "SWEEP_MAX_PAGES";
    pub const CONFIG_PATH: &str = "PREVIEW_SWEEP_CONFIG";
}

/// Resolved sweep configuration.
///
/// Built once at startup and handed to the clients and the cleanup run by
/// reference.
#[derive(Clone, PartialEq)]
pub struct Config {
    /// Branch/ref being cleaned up. Doubles as the GitHub environment name.
    pub ref_slug: String,
    pub github: GithubConfig,
    pub cloudflare: CloudflareConfig,
    /// Upper bound on deployment list pages fetched per run
    pub max_pages: u32,
}

#[derive(Clone, PartialEq)]
pub struct GithubConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token: String,
}

#[derive(Clone, PartialEq)]
pub struct CloudflareConfig {
    pub api_url: String,
    pub account_id: String,
    pub project_name: String,
    pub api_token: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ref_slug", &self.ref_slug)
            .field("github", &self.github)
            .field("cloudflare", &self.cloudflare)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_url", &self.api_url)
            .field("account_id", &self.account_id)
            .field("project_name", &self.project_name)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Raw TOML configuration file.
/// Every key is optional; environment variables win over file values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    ref_slug: Option<String>,
    max_pages: Option<u32>,
    #[serde(default)]
    github: RawGithub,
    #[serde(default)]
    cloudflare: RawCloudflare,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGithub {
    repository: Option<String>,
    token: Option<String>,
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCloudflare {
    account_id: Option<String>,
    project_name: Option<String>,
    api_token: Option<String>,
    api_url: Option<String>,
}

impl Config {
    /// Load configuration from the process environment, then `./.env`, then
    /// an optional TOML file, first source wins. When `path` is `None` the
    /// file named by `PREVIEW_SWEEP_CONFIG` is used, if set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_layered(path, Path::new(DOTENV_FILE), |name| std::env::var(name).ok())
    }

    /// [`Config::load`] with an explicit `.env` location and environment lookup.
    /// A missing `.env` file is not an error.
    pub fn load_layered<F>(path: Option<&Path>, dotenv: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dotenv = read_dotenv(dotenv)?;
        Self::load_with(path, |name| {
            non_blank(env(name)).or_else(|| dotenv.get(name).cloned())
        })
    }

    /// Same as [`Config::load`] with an injectable variable lookup
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => non_blank(lookup(vars::CONFIG_PATH)).map(PathBuf::from),
        };

        let raw = match path {
            Some(p) => read_config_file(&p)?,
            None => RawConfig::default(),
        };

        resolve(raw, &lookup)
    }

    /// Resolve configuration from variables only, no config file
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        resolve(RawConfig::default(), &lookup)
    }

    /// Override the page cap (e.g. from a command-line flag)
    pub fn with_max_pages(mut self, max_pages: u32) -> Result<Self> {
        self.max_pages = validate_max_pages(max_pages, "--max-pages")?;
        Ok(self)
    }
}

fn read_config_file(path: &Path) -> Result<RawConfig> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    entries.map(|entry| entry.map_err(Error::from)).collect()
}

fn parse_config_str(content: &str) -> Result<RawConfig> {
    Ok(toml::from_str(content)?)
}

fn resolve<F>(raw: RawConfig, lookup: &F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |name: &str, file_value: Option<String>| {
        non_blank(lookup(name)).or_else(|| non_blank(file_value))
    };
    let require = |name: &str, file_value: Option<String>| {
        pick(name, file_value).ok_or_else(|| Error::MissingVar(name.to_string()))
    };

    let ref_slug = require(vars::REF_SLUG, raw.ref_slug)?;

    let repository = require(vars::GITHUB_REPOSITORY, raw.github.repository)?;
    let (owner, repo) = split_repository(&repository)?;
    let github = GithubConfig {
        api_url: api_url(
            vars::GITHUB_API_URL,
            pick(vars::GITHUB_API_URL, raw.github.api_url),
            DEFAULT_GITHUB_API_URL,
        )?,
        owner,
        repo,
        token: require(vars::GITHUB_TOKEN, raw.github.token)?,
    };

    let cloudflare = CloudflareConfig {
        api_url: api_url(
            vars::CLOUDFLARE_API_URL,
            pick(vars::CLOUDFLARE_API_URL, raw.cloudflare.api_url),
            DEFAULT_CLOUDFLARE_API_URL,
        )?,
        account_id: require(vars::CF_ACCOUNT_ID, raw.cloudflare.account_id)?,
        project_name: require(vars::CF_PROJECT_NAME, raw.cloudflare.project_name)?,
        api_token: require(vars::CF_API_TOKEN, raw.cloudflare.api_token)?,
    };

    let max_pages = match non_blank(lookup(vars::MAX_PAGES)) {
        Some(value) => {
            let parsed = value
                .parse::<u32>()
                .map_err(|e| Error::invalid(vars::MAX_PAGES, e.to_string()))?;
            validate_max_pages(parsed, vars::MAX_PAGES)?
        }
        None => match raw.max_pages {
            Some(n) => validate_max_pages(n, "max_pages")?,
            None => DEFAULT_MAX_PAGES,
        },
    };

    Ok(Config {
        ref_slug,
        github,
        cloudflare,
        max_pages,
    })
}

/// Trimmed value, or `None` when absent or whitespace-only
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split `owner/repo` into its two parts
fn split_repository(repository: &str) -> Result<(String, String)> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(Error::invalid(
            vars::GITHUB_REPOSITORY,
            format!("expected 'owner/repo', got '{}'", repository),
        )),
    }
}

fn api_url(name: &str, value: Option<String>, default: &str) -> Result<String> {
    let url = value.unwrap_or_else(|| default.to_string());
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(Error::invalid(
            name,
            format!("'{}' is not an http(s) URL", url),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn validate_max_pages(value: u32, name: &str) -> Result<u32> {
    if value == 0 {
        return Err(Error::invalid(name, "must be at least 1"));
    }
    Ok(value)
}
