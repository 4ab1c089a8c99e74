//! Release catalog client.
//!
//! Bun, Deno and Tailwind publish through GitHub releases. The catalog is
//! paged with `?page={n}&per_page=100`; fetching stops at the first page that
//! holds fewer than 100 envelopes. Each envelope must carry at most one asset
//! for the current platform: envelopes with none are dropped, envelopes with
//! several are reported as a [`BvmError::CatalogIntegrity`] error.
//!
//! The same HTTP client serves the Node directory listing and artifact
//! downloads, so the proxy from the config applies everywhere.
//!
//! The API base can be overridden with `BVM_GITHUB_API`, which the
//! integration tests point at a local server.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::errors::BvmError;
use crate::release::{Release, ReleaseEnvelope};

/// Environment variable overriding the GitHub API base URL.
pub const GITHUB_API_ENV: &str = "BVM_GITHUB_API";

/// Default GitHub API base URL.
const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Number of envelopes requested per catalog page.
pub const PAGE_SIZE: usize = 100;

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Whole-request timeout in seconds for catalog pages and listings.
/// Artifact downloads stream without one.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// User-Agent header for HTTP requests. GitHub rejects requests without one.
const USER_AGENT: &str = concat!("bvm/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by every network operation of one command.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    github_api: String,
    request_timeout: Duration,
}

impl CatalogClient {
    /// Creates a client using `BVM_GITHUB_API` or the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the client cannot be
    /// built.
    pub fn new(proxy: Option<&str>) -> Result<Self> {
        Self::with_base_url(proxy, &github_api_url())
    }

    /// Creates a client against a specific GitHub-compatible API base.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the client cannot be
    /// built.
    pub fn with_base_url(proxy: Option<&str>, github_api: &str) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy URL: {proxy}"))?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            github_api: github_api.trim().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        })
    }

    #[cfg(test)]
    fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sends a GET request and fails on a non-success status.
    ///
    /// Only the connect timeout applies, so large bodies may stream for as
    /// long as the transport keeps delivering.
    ///
    /// # Errors
    ///
    /// Returns [`BvmError::HttpStatus`] for a non-success status, or an error
    /// if the request cannot be sent.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        Self::send(self.http.get(url), url).await
    }

    async fn send(request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BvmError::http_status(status.as_u16(), url).into());
        }
        Ok(response)
    }

    /// Fetches a URL as text, bounded by the whole-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out, or the body is not
    /// text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        Self::send(self.http.get(url).timeout(self.request_timeout), url)
            .await?
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))
    }

    /// Fetches one page of a repository's releases.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a release
    /// array.
    pub async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<ReleaseEnvelope>> {
        let url = format!(
            "{}/repos/{owner}/{repo}/releases?page={page}&per_page={per_page}",
            self.github_api
        );
        let text = self.get_text(&url).await?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse releases from {url}"))
    }

    /// Fetches every release of a repository, page by page.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails to load.
    pub async fn fetch_all(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseEnvelope>> {
        let mut envelopes = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.fetch_page(owner, repo, page, PAGE_SIZE).await?;
            let count = batch.len();
            tracing::debug!("Fetched page {page} of {owner}/{repo}: {count} releases");
            envelopes.extend(batch);

            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(envelopes)
    }

    /// Fetches a repository's releases and keeps those with an asset for the
    /// platform described by `is_match`.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching fails or an envelope has more than one
    /// matching asset.
    pub async fn retrieve_releases<F>(&self, owner: &str, repo: &str, is_match: F) -> Result<Vec<Release>>
    where
        F: Fn(&str) -> bool,
    {
        let envelopes = self.fetch_all(owner, repo).await?;
        Ok(extract_releases(&envelopes, is_match)?)
    }
}

/// Returns the GitHub API base URL.
///
/// Empty or whitespace-only values of `BVM_GITHUB_API` are treated as unset.
fn github_api_url() -> String {
    std::env::var(GITHUB_API_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GITHUB_API.to_string())
}

/// Turns catalog envelopes into releases for one platform.
///
/// Envelope order is preserved and no deduplication by tag happens.
///
/// # Errors
///
/// Returns [`BvmError::CatalogIntegrity`] if an envelope has more than one
/// matching asset.
pub fn extract_releases<F>(envelopes: &[ReleaseEnvelope], is_match: F) -> Result<Vec<Release>, BvmError>
where
    F: Fn(&str) -> bool,
{
    let mut releases = Vec::new();

    for envelope in envelopes {
        let mut matches = envelope.assets.iter().filter(|asset| is_match(&asset.name));
        let Some(asset) = matches.next() else {
            continue;
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(BvmError::catalog_integrity(&envelope.tag_name, extra + 1));
        }

        let name = if envelope.name.is_empty() {
            &envelope.tag_name
        } else {
            &envelope.name
        };
        releases.push(Release::remote(
            name,
            &envelope.tag_name,
            &asset.browser_download_url,
            asset.created_at,
            asset.updated_at,
        ));
    }

    Ok(releases)
}
