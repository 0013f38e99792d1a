//! GitHub release API interaction

use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::PrepareError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("binprep/", env!("CARGO_PKG_VERSION"));

/// GitHub release metadata from API
#[derive(Deserialize, Debug, Clone)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// GitHub release asset metadata
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// Which release to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseQuery {
    /// Newest entry of the release list, prereleases dropped when `stable_only`
    Latest { stable_only: bool },
    /// `<tag_prefix><version>`, falling back to the bare version on 404
    Pinned { version: String, tag_prefix: String },
}

/// A remote that can hand out release metadata
pub trait ReleaseSource {
    fn locate(&self, query: &ReleaseQuery) -> impl Future<Output = Result<Release, PrepareError>>;
}

/// Build the HTTP client shared by the locator and the downloader
pub fn build_client(token: Option<&str>) -> Result<Client, PrepareError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        debug!("adding remote token to requests");
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| PrepareError::Config(format!("Invalid remote token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
    }

    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .default_headers(headers)
        .build()
        .map_err(PrepareError::http("client setup"))
}

/// GitHub REST implementation of [`ReleaseSource`]
#[derive(Debug, Clone)]
pub struct GitHubRemote {
    client: Client,
    api_base: String,
    author: String,
    repository: String,
    token_supplied: bool,
}

enum Lookup<T> {
    Found(T),
    Missing,
}

impl GitHubRemote {
    pub fn new(
        client: Client,
        api_base: &str,
        author: &str,
        repository: &str,
        token_supplied: bool,
    ) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            author: author.to_string(),
            repository: repository.to_string(),
            token_supplied,
        }
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/releases{}",
            self.api_base, self.author, self.repository, tail
        )
    }

    /// GET a JSON document; 404 is reported as `Missing`, other failures as errors
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Lookup<Option<T>>, PrepareError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(PrepareError::http("release lookup"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::Missing);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                PrepareError::Auth {
                    status: status.as_u16(),
                    body,
                    token_supplied: self.token_supplied,
                }
            } else {
                PrepareError::Remote {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        let text = response
            .text()
            .await
            .map_err(PrepareError::http("release lookup"))?;
        if text.trim().is_empty() {
            return Ok(Lookup::Found(None));
        }
        let parsed = serde_json::from_str::<Option<T>>(&text).map_err(|e| PrepareError::Remote {
            status: status.as_u16(),
            body: format!("unexpected release payload: {e}"),
        })?;
        Ok(Lookup::Found(parsed))
    }

    async fn latest(&self, stable_only: bool) -> Result<Release, PrepareError> {
        let url = self.repo_url("");
        let releases = match self.get_json::<Vec<Release>>(&url).await? {
            Lookup::Found(Some(list)) => list,
            Lookup::Found(None) | Lookup::Missing => {
                return Err(PrepareError::NotFound(format!(
                    "{}/{} has no releases",
                    self.author, self.repository
                )));
            }
        };

        releases
            .into_iter()
            .find(|r| !(stable_only && r.prerelease))
            .ok_or_else(|| {
                PrepareError::NotFound(format!(
                    "{}/{} has no {}releases",
                    self.author,
                    self.repository,
                    if stable_only { "stable " } else { "" }
                ))
            })
    }

    async fn by_tag(&self, tag: &str) -> Result<Lookup<Release>, PrepareError> {
        let url = self.repo_url(&format!("/tags/{tag}"));
        Ok(match self.get_json::<Release>(&url).await? {
            Lookup::Found(Some(release)) => Lookup::Found(release),
            Lookup::Found(None) | Lookup::Missing => Lookup::Missing,
        })
    }

    async fn pinned(&self, version: &str, tag_prefix: &str) -> Result<Release, PrepareError> {
        let bare = version.strip_prefix(tag_prefix).unwrap_or(version);
        let prefixed = format!("{tag_prefix}{bare}");
        if let Lookup::Found(release) = self.by_tag(&prefixed).await? {
            return Ok(release);
        }
        if prefixed != bare {
            info!("Tag {prefixed} not found, retrying with {bare}");
            if let Lookup::Found(release) = self.by_tag(bare).await? {
                return Ok(release);
            }
        }
        Err(PrepareError::NotFound(format!(
            "{}/{} has no release tagged {prefixed} or {bare}",
            self.author, self.repository
        )))
    }
}

impl ReleaseSource for GitHubRemote {
    async fn locate(&self, query: &ReleaseQuery) -> Result<Release, PrepareError> {
        let release = match query {
            ReleaseQuery::Latest { stable_only } => self.latest(*stable_only).await?,
            ReleaseQuery::Pinned { version, tag_prefix } => self.pinned(version, tag_prefix).await?,
        };
        info!(
            "Using release {} of {}/{} ({} assets)",
            release.tag_name,
            self.author,
            self.repository,
            release.assets.len()
        );
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn remote(server: &Server, token: Option<&str>) -> GitHubRemote {
        GitHubRemote::new(
            build_client(token).unwrap(),
            &server.url(),
            "dprint",
            "dprint",
            token.is_some(),
        )
    }

    const RELEASES: &str = r#"[
        {"tag_name": "0.46.0-rc.1", "prerelease": true, "assets": []},
        {"tag_name": "0.45.0", "prerelease": false, "assets": [
            {"name": "dprint-x86_64-apple-darwin.zip",
             "browser_download_url": "https://example.invalid/a", "size": 3}
        ]},
        {"tag_name": "0.44.0", "prerelease": false, "assets": []}
    ]"#;

    #[tokio::test]
    async fn latest_skips_prereleases_when_stable_only() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/dprint/dprint/releases")
            .match_header("accept", "application/vnd.github+json")
            .with_status(200)
            .with_body(RELEASES)
            .expect(2)
            .create_async()
            .await;

        let remote = remote(&server, None);
        let release = remote
            .locate(&ReleaseQuery::Latest { stable_only: true })
            .await
            .unwrap();
        assert_eq!(release.tag_name, "0.45.0");
        assert_eq!(release.assets.len(), 1);

        let release = remote
            .locate(&ReleaseQuery::Latest { stable_only: false })
            .await
            .unwrap();
        assert_eq!(release.tag_name, "0.46.0-rc.1");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn empty_release_list_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/dprint/dprint/releases")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = remote(&server, None)
            .locate(&ReleaseQuery::Latest { stable_only: true })
            .await
            .unwrap_err();
        assert!(matches!(err, PrepareError::NotFound(_)));
    }

    #[tokio::test]
    async fn pinned_falls_back_to_unprefixed_tag() {
        let mut server = Server::new_async().await;
        let prefixed = server
            .mock("GET", "/repos/dprint/dprint/releases/tags/v0.45.0")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;
        let bare = server
            .mock("GET", "/repos/dprint/dprint/releases/tags/0.45.0")
            .with_status(200)
            .with_body(r#"{"tag_name": "0.45.0", "prerelease": false, "assets": []}"#)
            .create_async()
            .await;

        let release = remote(&server, None)
            .locate(&ReleaseQuery::Pinned {
                version: "0.45.0".into(),
                tag_prefix: "v".into(),
            })
            .await
            .unwrap();
        assert_eq!(release.tag_name, "0.45.0");
        prefixed.assert_async().await;
        bare.assert_async().await;
    }

    #[tokio::test]
    async fn pinned_missing_after_fallback_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/repos/dprint/dprint/releases/tags/.*$".into()))
            .with_status(404)
            .expect(2)
            .create_async()
            .await;

        let err = remote(&server, None)
            .locate(&ReleaseQuery::Pinned {
                version: "9.9.9".into(),
                tag_prefix: "v".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PrepareError::NotFound(_)));
    }

    #[tokio::test]
    async fn unauthorized_message_depends_on_token() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/dprint/dprint/releases")
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .expect(2)
            .create_async()
            .await;

        let query = ReleaseQuery::Latest { stable_only: true };
        let without = remote(&server, None).locate(&query).await.unwrap_err();
        let with = remote(&server, Some("secret"))
            .locate(&query)
            .await
            .unwrap_err();

        assert!(matches!(without, PrepareError::Auth { token_supplied: false, .. }));
        assert!(matches!(with, PrepareError::Auth { token_supplied: true, .. }));
        assert_ne!(without.to_string(), with.to_string());
        assert!(!with.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn token_is_sent_as_bearer() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/dprint/dprint/releases")
            .match_header("authorization", "Bearer abc123")
            .with_status(200)
            .with_body(RELEASES)
            .create_async()
            .await;

        remote(&server, Some("abc123"))
            .locate(&ReleaseQuery::Latest { stable_only: true })
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_body_is_surfaced_verbatim() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/dprint/dprint/releases")
            .with_status(502)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let err = remote(&server, None)
            .locate(&ReleaseQuery::Latest { stable_only: true })
            .await
            .unwrap_err();
        match err {
            PrepareError::Remote { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_release_body_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/dprint/dprint/releases/tags/v1.0.0")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;
        server
            .mock("GET", "/repos/dprint/dprint/releases/tags/1.0.0")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let err = remote(&server, None)
            .locate(&ReleaseQuery::Pinned {
                version: "1.0.0".into(),
                tag_prefix: "v".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PrepareError::NotFound(_)));
    }
}
