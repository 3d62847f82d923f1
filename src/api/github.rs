//! GitHub REST API repository.
//!
//! - `GET /search/repositories?q=<query>&per_page=<n>`
//! - `GET <forks_url>?per_page=<n>`, always routed through the configured
//!   base URL so a proxy or mock server sees fork requests too

use async_trait::async_trait;
use log::info;

use super::client::{ClientError, WebClient};
use super::repository::GithubWebRepository;
use super::types::{GithubRepo, SearchResults};
use crate::core::loadable::LoadError;

pub struct RealGithubRepository {
    client: WebClient,
    per_page: u32,
}

impl RealGithubRepository {
    pub fn new(base_url: &str, token: Option<&str>, per_page: u32) -> Result<Self, ClientError> {
        Ok(Self {
            client: WebClient::new(base_url, token)?,
            per_page,
        })
    }

    /// Path component of a `forks_url`, relative to the configured base.
    fn forks_path(&self, forks_url: &str) -> String {
        if let Some(rest) = forks_url.strip_prefix(self.client.base_url())
            && (rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
        {
            return rest.to_string();
        }
        match reqwest::Url::parse(forks_url) {
            Ok(url) => url.path().to_string(),
            // Already relative
            Err(_) if forks_url.starts_with('/') => forks_url.to_string(),
            Err(_) => format!("/{forks_url}"),
        }
    }
}

#[async_trait]
impl GithubWebRepository for RealGithubRepository {
    fn name(&self) -> &str {
        "github"
    }

    async fn search(&self, query: &str) -> Result<Vec<GithubRepo>, LoadError> {
        let results: SearchResults = self
            .client
            .get_json(
                "/search/repositories",
                &[
                    ("q", query.to_string()),
                    ("per_page", self.per_page.to_string()),
                ],
            )
            .await?;
        info!("Search '{}' returned {} repositories", query, results.items.len());
        Ok(results.items)
    }

    async fn load_forks(&self, repo: &GithubRepo) -> Result<Vec<GithubRepo>, LoadError> {
        let path = self.forks_path(&repo.forks_url);
        let forks: Vec<GithubRepo> = self
            .client
            .get_json(&path, &[("per_page", self.per_page.to_string())])
            .await?;
        info!("Loaded {} forks of {}", forks.len(), repo.full_name());
        Ok(forks)
    }
}
