//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::api::repository::{CountriesWebRepository, GithubWebRepository};
use crate::api::types::{Country, CountryDetailsIntermediate, Currency, GithubRepo, Owner};
use crate::core::loadable::LoadError;

// ============================================================================
// Fixtures
// ============================================================================

pub fn mocked_repos() -> Vec<GithubRepo> {
    vec![GithubRepo {
        id: 100500,
        name: "test".to_string(),
        description: Some("desc".to_string()),
        forks: 100,
        watchers: 120,
        owner: Owner {
            id: 1,
            avatar_url: "https://avatars3.githubusercontent.com/u/13662162?v=4".to_string(),
            login: "test".to_string(),
        },
        forks_url: "https://api.github.com/repos/Moya/Moya/forks".to_string(),
    }]
}

pub fn mocked_countries() -> Vec<Country> {
    vec![
        Country {
            name: "United States".to_string(),
            translations: HashMap::new(),
            population: 125_000_000,
            flag: Some("https://restcountries.eu/data/usa.svg".to_string()),
            alpha3_code: "USA".to_string(),
        },
        Country {
            name: "Georgia".to_string(),
            translations: HashMap::new(),
            population: 2_340_000,
            flag: None,
            alpha3_code: "GEO".to_string(),
        },
        Country {
            name: "Canada".to_string(),
            translations: HashMap::new(),
            population: 57_600_000,
            flag: None,
            alpha3_code: "CAN".to_string(),
        },
    ]
}

pub fn mocked_currencies() -> Vec<Currency> {
    vec![
        Currency {
            code: "USD".to_string(),
            symbol: Some("$".to_string()),
            name: "US Dollar".to_string(),
        },
        Currency {
            code: "EUR".to_string(),
            symbol: Some("€".to_string()),
            name: "Euro".to_string(),
        },
    ]
}

/// Details whose borders include one unknown code.
pub fn mocked_details() -> CountryDetailsIntermediate {
    CountryDetailsIntermediate {
        capital: "Sin City".to_string(),
        currencies: mocked_currencies(),
        borders: vec!["CAN".to_string(), "XXX".to_string()],
    }
}

// ============================================================================
// Mocked web repositories
// ============================================================================

/// Calls recorded by [`MockedGithubRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoAction {
    Search(String),
    LoadForks(u64),
}

/// Optional gate holding responses back until the test releases them.
#[derive(Default)]
struct Gate(Option<Arc<Semaphore>>);

impl Gate {
    fn closed() -> Self {
        Gate(Some(Arc::new(Semaphore::new(0))))
    }

    async fn pass(&self) {
        if let Some(semaphore) = &self.0
            && let Ok(permit) = semaphore.acquire().await
        {
            permit.forget();
        }
    }

    fn release(&self, n: usize) {
        if let Some(semaphore) = &self.0 {
            semaphore.add_permits(n);
        }
    }
}

/// GitHub repository answering from canned responses.
/// Unconfigured calls fail with `Decoding("value not set")`.
#[derive(Default)]
pub struct MockedGithubRepository {
    search: HashMap<String, Result<Vec<GithubRepo>, LoadError>>,
    forks: Option<Result<Vec<GithubRepo>, LoadError>>,
    actions: Mutex<Vec<RepoAction>>,
    gate: Gate,
}

fn value_not_set() -> LoadError {
    LoadError::Decoding("value not set".to_string())
}

impl MockedGithubRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, response: Result<Vec<GithubRepo>, LoadError>) -> Self {
        self.search.insert(query.to_string(), response);
        self
    }

    pub fn with_forks(mut self, response: Result<Vec<GithubRepo>, LoadError>) -> Self {
        self.forks = Some(response);
        self
    }

    /// Responses wait for [`MockedGithubRepository::release`].
    pub fn gated(mut self) -> Self {
        self.gate = Gate::closed();
        self
    }

    pub fn release(&self, n: usize) {
        self.gate.release(n);
    }

    pub fn actions(&self) -> Vec<RepoAction> {
        self.actions.lock().clone()
    }
}

#[async_trait]
impl GithubWebRepository for MockedGithubRepository {
    fn name(&self) -> &str {
        "mock-github"
    }

    async fn search(&self, query: &str) -> Result<Vec<GithubRepo>, LoadError> {
        self.actions.lock().push(RepoAction::Search(query.to_string()));
        self.gate.pass().await;
        self.search.get(query).cloned().unwrap_or_else(|| Err(value_not_set()))
    }

    async fn load_forks(&self, repo: &GithubRepo) -> Result<Vec<GithubRepo>, LoadError> {
        self.actions.lock().push(RepoAction::LoadForks(repo.id));
        self.gate.pass().await;
        self.forks.clone().unwrap_or_else(|| Err(value_not_set()))
    }
}

/// Countries repository answering from canned responses.
#[derive(Default)]
pub struct MockedCountriesRepository {
    countries: Option<Result<Vec<Country>, LoadError>>,
    details: Option<Result<CountryDetailsIntermediate, LoadError>>,
    gate: Gate,
}

impl MockedCountriesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_countries(mut self, response: Result<Vec<Country>, LoadError>) -> Self {
        self.countries = Some(response);
        self
    }

    pub fn with_details(mut self, response: Result<CountryDetailsIntermediate, LoadError>) -> Self {
        self.details = Some(response);
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate = Gate::closed();
        self
    }

    pub fn release(&self, n: usize) {
        self.gate.release(n);
    }
}

#[async_trait]
impl CountriesWebRepository for MockedCountriesRepository {
    fn name(&self) -> &str {
        "mock-countries"
    }

    async fn load_countries(&self) -> Result<Vec<Country>, LoadError> {
        self.gate.pass().await;
        self.countries.clone().unwrap_or_else(|| Err(value_not_set()))
    }

    async fn load_country_details(
        &self,
        _country: &Country,
    ) -> Result<CountryDetailsIntermediate, LoadError> {
        self.gate.pass().await;
        self.details.clone().unwrap_or_else(|| Err(value_not_set()))
    }
}
