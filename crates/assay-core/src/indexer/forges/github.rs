//! GitHub REST release listing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use super::traits::{ListingSource, ReleaseFile, ReleaseInfo};

/// Default REST endpoint.
pub const GITHUB_API: &str = "https://api.github.com";

/// Redirect hops followed by any request made through [`build_client`].
pub const MAX_REDIRECTS: usize = 5;

const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 50;

/// Release object as returned by `GET /repos/{owner}/{repo}/releases`.
#[derive(Debug, Deserialize)]
pub struct GithubRelease {
    /// Git tag of the release.
    pub tag_name: String,
    /// Pre-release flag.
    #[serde(default)]
    pub prerelease: bool,
    /// Draft flag.
    #[serde(default)]
    pub draft: bool,
    /// Attached files.
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

/// Asset object nested in [`GithubRelease`].
#[derive(Debug, Deserialize)]
pub struct GithubAsset {
    /// Filename.
    pub name: String,
    /// Public download URL.
    pub browser_download_url: String,
    /// Server-computed digest (`sha256:<hex>`), present on newer uploads.
    #[serde(default)]
    pub digest: Option<String>,
}

impl From<GithubRelease> for ReleaseInfo {
    fn from(r: GithubRelease) -> Self {
        Self {
            tag_name: r.tag_name,
            prerelease: r.prerelease,
            draft: r.draft,
            files: r
                .assets
                .into_iter()
                .map(|a| ReleaseFile {
                    name: a.name,
                    download_url: a.browser_download_url,
                    digest: a.digest,
                })
                .collect(),
        }
    }
}

/// Build the HTTP client shared by release listing and checksum resolution.
///
/// # Errors
///
/// Returns an error if the token is not a valid header value or the TLS
/// backend fails to initialize.
pub fn build_client(token: Option<&str>, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("GITHUB_TOKEN is not a valid header value")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(Client::builder()
        .user_agent(crate::USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
        .build()?)
}

/// Drop drafts and pre-releases; those are never cataloged.
pub fn published(releases: Vec<ReleaseInfo>) -> Vec<ReleaseInfo> {
    releases
        .into_iter()
        .filter(|r| !r.draft && !r.prerelease)
        .collect()
}

/// Parse a releases listing in REST shape (a JSON array of releases).
///
/// # Errors
///
/// Returns an error if the JSON does not match the release schema.
pub fn parse_releases(json: &str) -> Result<Vec<ReleaseInfo>> {
    let raw: Vec<GithubRelease> =
        serde_json::from_str(json).context("Malformed release listing")?;
    Ok(published(raw.into_iter().map(ReleaseInfo::from).collect()))
}

/// Releases of one GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    api_base: String,
    owner: String,
    repo: String,
}

impl GitHubSource {
    /// Create a source for `owner/repo` against `api_base`.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo` is not in `owner/repo` form.
    pub fn new(api_base: &str, repo: &str) -> Result<Self> {
        let (owner, name) = repo
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty() && !n.contains('/'))
            .ok_or_else(|| anyhow::anyhow!("Invalid GitHub repository '{repo}', expected owner/repo"))?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: name.to_string(),
        })
    }
}

#[async_trait]
impl ListingSource for GitHubSource {
    fn key(&self) -> String {
        format!("github:{}/{}", self.owner, self.repo)
    }

    async fn fetch_releases(&self, client: &Client) -> Result<Vec<ReleaseInfo>> {
        fetch_releases(client, &self.api_base, &format!("{}/{}", self.owner, self.repo)).await
    }
}

/// List the published releases of `repo` (`owner/repo`), newest first.
///
/// Pages through the listing 100 releases at a time until a short page.
///
/// # Errors
///
/// Returns an error on transport failure, a non-success status, or a body
/// that is not a release array.
pub async fn fetch_releases(client: &Client, api_base: &str, repo: &str) -> Result<Vec<ReleaseInfo>> {
    let api_base = api_base.trim_end_matches('/');
    let mut releases = Vec::new();

    for page in 1..=MAX_PAGES {
        let url = format!("{api_base}/repos/{repo}/releases?per_page={PER_PAGE}&page={page}");
        tracing::debug!("fetching {url}");

        let resp = client.get(&url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("GitHub API error: {} for {}", resp.status(), url);
        }
        let batch: Vec<GithubRelease> = resp
            .json()
            .await
            .with_context(|| format!("Malformed release listing from {url}"))?;

        let last_page = batch.len() < PER_PAGE;
        releases.extend(batch.into_iter().map(ReleaseInfo::from));
        if last_page {
            break;
        }
    }

    Ok(published(releases))
}

/// Releases read from a local JSON file in REST shape.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ListingSource for FileSource {
    fn key(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn fetch_releases(&self, _client: &Client) -> Result<Vec<ReleaseInfo>> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        parse_releases(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn release_json(tag: &str, prerelease: bool, draft: bool) -> serde_json::Value {
        serde_json::json!({
            "tag_name": tag,
            "prerelease": prerelease,
            "draft": draft,
            "assets": [{
                "name": format!("tool-{tag}-linux-amd64.tar.gz"),
                "browser_download_url": format!("https://dl.example.com/{tag}/tool.tar.gz"),
                "digest": format!("sha256:{}", "c".repeat(64)),
            }]
        })
    }

    #[tokio::test]
    async fn test_fetch_releases_filters_and_maps() {
        let mut server = Server::new_async().await;
        let body = serde_json::json!([
            release_json("v1.1.0", false, false),
            release_json("v1.2.0-rc.1", true, false),
            release_json("v1.3.0", false, true),
        ]);

        let _m = server
            .mock("GET", "/repos/owner/tool/releases")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = build_client(Some("secret"), Duration::from_secs(5)).unwrap();
        let source = GitHubSource::new(&server.url(), "owner/tool").unwrap();
        assert_eq!(source.key(), "github:owner/tool");

        let releases = source.fetch_releases(&client).await.unwrap();
        assert_eq!(releases.len(), 1);
        let r = &releases[0];
        assert_eq!(r.tag_name, "v1.1.0");
        assert_eq!(r.files.len(), 1);
        assert_eq!(r.files[0].name, "tool-v1.1.0-linux-amd64.tar.gz");
        assert_eq!(
            r.files[0].digest.as_deref(),
            Some(format!("sha256:{}", "c".repeat(64)).as_str())
        );
    }

    #[tokio::test]
    async fn test_fetch_releases_follows_pages() {
        let mut server = Server::new_async().await;
        let full: Vec<_> = (0..PER_PAGE)
            .map(|i| release_json(&format!("v1.0.{i}"), false, false))
            .collect();
        let tail = vec![release_json("v0.9.0", false, false)];

        let _p1 = server
            .mock("GET", "/repos/owner/tool/releases")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(serde_json::Value::Array(full).to_string())
            .create_async()
            .await;
        let _p2 = server
            .mock("GET", "/repos/owner/tool/releases")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(serde_json::Value::Array(tail).to_string())
            .create_async()
            .await;

        let client = build_client(None, Duration::from_secs(5)).unwrap();
        let source = GitHubSource::new(&server.url(), "owner/tool").unwrap();
        let releases = source.fetch_releases(&client).await.unwrap();
        assert_eq!(releases.len(), PER_PAGE + 1);
        assert_eq!(releases.last().unwrap().tag_name, "v0.9.0");
    }

    #[tokio::test]
    async fn test_fetch_releases_reports_api_errors() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/owner/missing/releases")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let client = build_client(None, Duration::from_secs(5)).unwrap();
        let source = GitHubSource::new(&server.url(), "owner/missing").unwrap();
        let err = source.fetch_releases(&client).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_repo_must_be_owner_slash_name() {
        assert!(GitHubSource::new(GITHUB_API, "owner/repo").is_ok());
        assert!(GitHubSource::new(GITHUB_API, "owner").is_err());
        assert!(GitHubSource::new(GITHUB_API, "/repo").is_err());
        assert!(GitHubSource::new(GITHUB_API, "a/b/c").is_err());
    }

    #[tokio::test]
    async fn test_file_source_reads_rest_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("releases.json");
        let body = serde_json::json!([
            release_json("v2.0.0", false, false),
            release_json("v2.1.0-rc.1", true, false),
        ]);
        std::fs::write(&path, body.to_string()).unwrap();

        let releases = FileSource::new(&path)
            .fetch_releases(&Client::new())
            .await
            .unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag_name, "v2.0.0");
    }

    #[tokio::test]
    async fn test_client_caps_redirect_chain() {
        let mut server = Server::new_async().await;
        let hop = format!("{}/hop", server.url());
        let mock = server
            .mock("GET", "/hop")
            .with_status(302)
            .with_header("location", &hop)
            .expect(MAX_REDIRECTS + 1)
            .create_async()
            .await;

        let client = build_client(None, Duration::from_secs(5)).unwrap();
        let err = crate::io::download::fetch_text(&client, &hop, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(
            matches!(err, crate::io::download::DownloadError::Http(ref e) if e.is_redirect()),
            "{err}"
        );
        mock.assert_async().await;
    }
}
