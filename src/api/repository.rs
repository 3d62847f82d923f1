//! Web repository seams. Interactors only see these traits so tests can swap
//! in mocks without standing up a server.

use async_trait::async_trait;

use super::types::{Country, CountryDetailsIntermediate, GithubRepo};
use crate::core::loadable::LoadError;

#[async_trait]
pub trait GithubWebRepository: Send + Sync {
    /// Returns the name of the backing service, for logs.
    fn name(&self) -> &str;

    /// Repositories matching `query`.
    async fn search(&self, query: &str) -> Result<Vec<GithubRepo>, LoadError>;

    /// Forks of `repo`, fetched through its `forks_url`.
    async fn load_forks(&self, repo: &GithubRepo) -> Result<Vec<GithubRepo>, LoadError>;
}

#[async_trait]
pub trait CountriesWebRepository: Send + Sync {
    fn name(&self) -> &str;

    async fn load_countries(&self) -> Result<Vec<Country>, LoadError>;

    /// Details for a single country. An empty response is
    /// [`LoadError::UnexpectedResponse`].
    async fn load_country_details(
        &self,
        country: &Country,
    ) -> Result<CountryDetailsIntermediate, LoadError>;
}
