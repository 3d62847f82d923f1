//! # Interactors
//!
//! Turn a user intent into store transitions plus a network call.
//!
//! ```text
//!  search_repos("swift")
//!     │  store: NotRequested ─▶ Loading { last, token }     (synchronous)
//!     ▼
//!  tokio::spawn ── web.search() ──┬── token fired ─▶ nothing written
//!                                 └── settled ─────▶ combine ─▶ Loaded / Failed
//! ```
//!
//! Starting a load while one is already in flight at the same path cancels
//! the older one, so a slow stale response can never overwrite a newer one.
//! The final write re-checks the token under the store lock: once a load is
//! cancelled nothing it produces reaches the store.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::repository::{CountriesWebRepository, GithubWebRepository};
use crate::api::types::{Country, GithubRepo};
use crate::core::loadable::{LoadError, Loadable};
use crate::core::state::{AppState, paths};
use crate::core::store::{Path, Store};

/// Combines freshly loaded forks with the current search results.
pub type ForksMerge = fn(Vec<GithubRepo>, &[GithubRepo]) -> Vec<GithubRepo>;

/// Default merge: forks as returned.
pub fn keep_forks(forks: Vec<GithubRepo>, _listed: &[GithubRepo]) -> Vec<GithubRepo> {
    forks
}

/// Drops forks that already appear in the search results.
pub fn hide_listed_forks(forks: Vec<GithubRepo>, listed: &[GithubRepo]) -> Vec<GithubRepo> {
    forks
        .into_iter()
        .filter(|fork| !listed.iter().any(|repo| repo.id == fork.id))
        .collect()
}

/// Moves the value at `path` into `Loading`, carrying its last value forward.
/// An in-flight load at the same path is superseded and its token fired.
fn begin_load<T>(store: &Store<AppState>, path: &Path<AppState, Loadable<T>>) -> CancellationToken
where
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let loading_token = token.clone();
    store.update(path, move |current| {
        if let Some(previous) = current.token() {
            debug!("Superseding in-flight load at {}", path.name());
            previous.cancel();
        }
        let last = std::mem::take(current).into_value();
        *current = Loadable::is_loading(last, loading_token);
    });
    token
}

/// Spawns `request` and writes its outcome to `path` unless `token` fires
/// first. The returned handle resolves once the load has settled or been
/// abandoned.
fn spawn_load<T, F>(
    store: &Store<AppState>,
    path: Path<AppState, Loadable<T>>,
    request: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = Result<T, LoadError>> + Send + 'static,
{
    let token = begin_load(store, &path);
    let store = store.clone();
    let id = Uuid::new_v4();
    debug!("[{}] Loading {}", id, path.name());

    tokio::spawn(async move {
        let result = tokio::select! {
            _ = token.cancelled() => {
                info!("[{}] Load at {} cancelled", id, path.name());
                return;
            }
            result = request => result,
        };

        if let Err(e) = &result {
            warn!("[{}] Load at {} failed: {}", id, path.name(), e);
        }
        let written = store.update(&path, |current| {
            if token.is_cancelled() {
                return false;
            }
            *current = Loadable::from(result);
            true
        });
        if written {
            debug!("[{}] Settled {}", id, path.name());
        } else {
            debug!("[{}] Discarded late result for {}", id, path.name());
        }
    })
}

// ============================================================================
// Repositories
// ============================================================================

/// Search and fork listing against GitHub.
pub struct ReposInteractor {
    web: Arc<dyn GithubWebRepository>,
    store: Store<AppState>,
    merge: ForksMerge,
}

impl ReposInteractor {
    pub fn new(web: Arc<dyn GithubWebRepository>, store: Store<AppState>) -> Self {
        Self {
            web,
            store,
            merge: keep_forks,
        }
    }

    /// Replaces the step combining loaded forks with the search results.
    pub fn with_forks_merge(mut self, merge: ForksMerge) -> Self {
        self.merge = merge;
        self
    }

    /// Searches repositories and publishes them at `user_data.github_repos`.
    pub fn search_repos(&self, query: &str) -> JoinHandle<()> {
        info!("Searching {} for '{}'", self.web.name(), query);
        let web = Arc::clone(&self.web);
        let query = query.to_string();
        spawn_load(&self.store, paths::github_repos(), async move {
            web.search(&query).await
        })
    }

    /// Loads forks of `repo` into `user_data.forks[repo.id]`.
    ///
    /// The result is merged with the current search results; if the search
    /// itself failed, that failure is reported here too.
    pub fn load_forks(&self, repo: &GithubRepo) -> JoinHandle<()> {
        info!("Loading forks of {}", repo.full_name());
        let web = Arc::clone(&self.web);
        let store = self.store.clone();
        let merge = self.merge;
        let repo = repo.clone();
        spawn_load(&self.store, paths::forks(repo.id), async move {
            let forks = web.load_forks(&repo).await?;
            let listed = store.get(&paths::github_repos()).into_result()?;
            Ok(merge(forks, &listed))
        })
    }

    pub fn cancel_search(&self) {
        self.store
            .update(&paths::github_repos(), Loadable::cancel_loading);
    }

    pub fn cancel_forks(&self, repo_id: u64) {
        self.store
            .update(&paths::forks(repo_id), Loadable::cancel_loading);
    }
}

// ============================================================================
// Countries
// ============================================================================

/// Country list and details against the countries API.
pub struct CountriesInteractor {
    web: Arc<dyn CountriesWebRepository>,
    store: Store<AppState>,
}

impl CountriesInteractor {
    pub fn new(web: Arc<dyn CountriesWebRepository>, store: Store<AppState>) -> Self {
        Self { web, store }
    }

    pub fn load_countries(&self) -> JoinHandle<()> {
        info!("Loading countries from {}", self.web.name());
        let web = Arc::clone(&self.web);
        spawn_load(&self.store, paths::countries(), async move {
            web.load_countries().await
        })
    }

    /// Loads details of `country`, resolving border codes against the
    /// country list currently in the store.
    pub fn load_country_details(&self, country: &Country) -> JoinHandle<()> {
        info!("Loading details of {}", country.name);
        let web = Arc::clone(&self.web);
        let store = self.store.clone();
        let country = country.clone();
        spawn_load(
            &self.store,
            paths::country_details(&country.alpha3_code),
            async move {
                let intermediate = web.load_country_details(&country).await?;
                let countries = store.get(&paths::countries()).into_result()?;
                Ok(intermediate.substitute_neighbors(&countries))
            },
        )
    }

    pub fn cancel_countries(&self) {
        self.store
            .update(&paths::countries(), Loadable::cancel_loading);
    }

    pub fn cancel_country_details(&self, code: &str) {
        self.store
            .update(&paths::country_details(code), Loadable::cancel_loading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        MockedCountriesRepository, MockedGithubRepository, RepoAction, mocked_countries,
        mocked_details, mocked_repos,
    };
    use futures::StreamExt;

    fn repos_fixture(web: MockedGithubRepository) -> (ReposInteractor, Store<AppState>, Arc<MockedGithubRepository>) {
        let web = Arc::new(web);
        let store = Store::new(AppState::default());
        let interactor = ReposInteractor::new(web.clone(), store.clone());
        (interactor, store, web)
    }

    #[tokio::test]
    async fn test_search_success_transitions() {
        let repos = mocked_repos();
        let (interactor, store, web) =
            repos_fixture(MockedGithubRepository::new().with_search("swift", Ok(repos.clone())));
        let mut sub = store.subscribe(&paths::github_repos());

        let handle = interactor.search_repos("swift");
        assert_eq!(
            store.get(&paths::github_repos()),
            Loadable::is_loading(None, CancellationToken::new())
        );
        handle.await.unwrap();

        assert_eq!(sub.next().await, Some(Loadable::NotRequested));
        assert_eq!(
            sub.next().await,
            Some(Loadable::is_loading(None, CancellationToken::new()))
        );
        assert_eq!(sub.next().await, Some(Loadable::Loaded(repos)));
        assert_eq!(web.actions(), vec![RepoAction::Search("swift".to_string())]);
    }

    #[tokio::test]
    async fn test_search_network_failure() {
        let (interactor, store, _web) = repos_fixture(
            MockedGithubRepository::new()
                .with_search("swift", Err(LoadError::Network("offline".to_string()))),
        );
        interactor.search_repos("swift").await.unwrap();
        assert_eq!(
            store.get(&paths::github_repos()),
            Loadable::Failed(LoadError::Network("offline".to_string()))
        );
    }

    #[tokio::test]
    async fn test_refresh_carries_last_value() {
        let repos = mocked_repos();
        let (interactor, store, _web) =
            repos_fixture(MockedGithubRepository::new().with_search("swift", Ok(repos.clone())));
        store.set(&paths::github_repos(), Loadable::loaded(repos.clone()));

        let handle = interactor.search_repos("swift");
        assert_eq!(
            store.get(&paths::github_repos()).value(),
            Some(&repos)
        );
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_wins_over_late_success() {
        let (interactor, store, web) = repos_fixture(
            MockedGithubRepository::new()
                .with_search("swift", Ok(mocked_repos()))
                .gated(),
        );
        let handle = interactor.search_repos("swift");
        interactor.cancel_search();
        assert_eq!(
            store.get(&paths::github_repos()),
            Loadable::Failed(LoadError::Cancelled)
        );

        web.release(1);
        handle.await.unwrap();
        assert_eq!(
            store.get(&paths::github_repos()),
            Loadable::Failed(LoadError::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_result_resolved_after_cancel_is_discarded() {
        let store = Store::new(AppState::default());
        let request_store = store.clone();
        // The request fires its own token on the way out, so the result is
        // already in hand when the cancel lands.
        let handle = spawn_load(&store, paths::github_repos(), async move {
            let current = request_store.get(&paths::github_repos());
            if let Some(token) = current.token() {
                token.cancel();
            }
            Ok(mocked_repos())
        });
        handle.await.unwrap();

        let current = store.get(&paths::github_repos());
        assert!(current.is_in_flight());
        assert!(current.token().is_some_and(|t| t.is_cancelled()));
        assert!(current.value().is_none());
    }

    #[tokio::test]
    async fn test_cancel_after_settle_is_noop() {
        let repos = mocked_repos();
        let (interactor, store, _web) =
            repos_fixture(MockedGithubRepository::new().with_search("swift", Ok(repos.clone())));
        interactor.search_repos("swift").await.unwrap();
        interactor.cancel_search();
        assert_eq!(store.get(&paths::github_repos()), Loadable::Loaded(repos));
    }

    #[tokio::test]
    async fn test_newer_search_supersedes_older() {
        let old = mocked_repos();
        let mut new = mocked_repos();
        new[0].name = "newer".to_string();
        let (interactor, store, web) = repos_fixture(
            MockedGithubRepository::new()
                .with_search("old", Ok(old))
                .with_search("new", Ok(new.clone()))
                .gated(),
        );

        let first = interactor.search_repos("old");
        let second = interactor.search_repos("new");
        web.release(2);
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(store.get(&paths::github_repos()), Loadable::Loaded(new));
    }

    #[tokio::test]
    async fn test_load_forks_writes_keyed_path() {
        let repo = mocked_repos().remove(0);
        let forks = vec![repo.clone()];
        let (interactor, store, web) =
            repos_fixture(MockedGithubRepository::new().with_forks(Ok(forks.clone())));

        interactor.load_forks(&repo).await.unwrap();

        assert_eq!(store.get(&paths::forks(repo.id)), Loadable::Loaded(forks));
        assert_eq!(store.get(&paths::forks(repo.id + 1)), Loadable::NotRequested);
        assert_eq!(web.actions(), vec![RepoAction::LoadForks(repo.id)]);
    }

    #[tokio::test]
    async fn test_load_forks_reports_failed_search() {
        let repo = mocked_repos().remove(0);
        let (interactor, store, _web) =
            repos_fixture(MockedGithubRepository::new().with_forks(Ok(vec![])));
        store.set(
            &paths::github_repos(),
            Loadable::failed(LoadError::Http { status: 403 }),
        );

        interactor.load_forks(&repo).await.unwrap();

        assert_eq!(
            store.get(&paths::forks(repo.id)),
            Loadable::Failed(LoadError::Http { status: 403 })
        );
    }

    #[tokio::test]
    async fn test_custom_forks_merge() {
        let listed = mocked_repos();
        let mut other = listed[0].clone();
        other.id = 1;
        let forks = vec![listed[0].clone(), other.clone()];
        let (interactor, store, _web) =
            repos_fixture(MockedGithubRepository::new().with_forks(Ok(forks)));
        let interactor = interactor.with_forks_merge(hide_listed_forks);
        store.set(&paths::github_repos(), Loadable::loaded(listed.clone()));

        interactor.load_forks(&listed[0]).await.unwrap();

        assert_eq!(
            store.get(&paths::forks(listed[0].id)),
            Loadable::Loaded(vec![other])
        );
    }

    #[tokio::test]
    async fn test_cancel_forks_leaves_other_repos_alone() {
        let repo = mocked_repos().remove(0);
        let (interactor, store, web) = repos_fixture(
            MockedGithubRepository::new().with_forks(Ok(vec![])).gated(),
        );
        store.set(&paths::forks(5), Loadable::loaded(vec![]));

        let handle = interactor.load_forks(&repo);
        interactor.cancel_forks(repo.id);
        web.release(1);
        handle.await.unwrap();

        assert_eq!(
            store.get(&paths::forks(repo.id)),
            Loadable::Failed(LoadError::Cancelled)
        );
        assert_eq!(store.get(&paths::forks(5)), Loadable::Loaded(vec![]));
    }

    #[tokio::test]
    async fn test_country_details_substitutes_neighbors() {
        let countries = mocked_countries();
        let web = Arc::new(
            MockedCountriesRepository::new()
                .with_countries(Ok(countries.clone()))
                .with_details(Ok(mocked_details())),
        );
        let store = Store::new(AppState::default());
        let interactor = CountriesInteractor::new(web, store.clone());

        interactor.load_countries().await.unwrap();
        interactor.load_country_details(&countries[0]).await.unwrap();

        let details = store.get(&paths::country_details("USA"));
        let neighbors: Vec<_> = details
            .value()
            .unwrap()
            .neighbors
            .iter()
            .map(|c| c.alpha3_code.clone())
            .collect();
        assert_eq!(neighbors, vec!["CAN".to_string()]);
    }

    #[tokio::test]
    async fn test_country_details_unexpected_response() {
        let countries = mocked_countries();
        let web = Arc::new(
            MockedCountriesRepository::new().with_details(Err(LoadError::UnexpectedResponse)),
        );
        let store = Store::new(AppState::default());
        let interactor = CountriesInteractor::new(web, store.clone());

        interactor.load_country_details(&countries[1]).await.unwrap();

        assert_eq!(
            store.get(&paths::country_details("GEO")),
            Loadable::Failed(LoadError::UnexpectedResponse)
        );
    }

    #[tokio::test]
    async fn test_cancel_countries() {
        let web = Arc::new(
            MockedCountriesRepository::new()
                .with_countries(Ok(mocked_countries()))
                .gated(),
        );
        let store = Store::new(AppState::default());
        let interactor = CountriesInteractor::new(web.clone(), store.clone());

        let handle = interactor.load_countries();
        interactor.cancel_countries();
        web.release(1);
        handle.await.unwrap();

        assert_eq!(
            store.get(&paths::countries()),
            Loadable::Failed(LoadError::Cancelled)
        );
    }
}
