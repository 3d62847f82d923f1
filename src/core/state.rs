//! # Application State
//!
//! The root record held by the [`Store`](crate::core::store::Store). Domain
//! data only; how it is rendered is the front end's business.
//!
//! ```text
//! AppState
//! ├── user_data
//! │   ├── github_repos: Loadable<Vec<GithubRepo>>          // search results
//! │   ├── forks: BTreeMap<repo id, Loadable<Vec<GithubRepo>>>
//! │   ├── countries: Loadable<Vec<Country>>
//! │   └── country_details: BTreeMap<alpha3, Loadable<CountryDetails>>
//! ├── routing
//! │   ├── repos_list.repo_details: Option<repo id>         // drill-down target
//! │   └── repo_details.details_sheet: bool                 // modal shown
//! └── system
//!     └── is_active: bool
//! ```
//!
//! Interactors write `user_data`; the front end writes `routing` and
//! `system`. Every field is reachable through a [`Path`] from [`paths`].

use std::collections::BTreeMap;

use crate::api::types::{Country, CountryDetails, GithubRepo};
use crate::core::loadable::Loadable;
use crate::core::store::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user_data: UserData,
    pub routing: Routing,
    pub system: System,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserData {
    pub github_repos: Loadable<Vec<GithubRepo>>,
    pub forks: BTreeMap<u64, Loadable<Vec<GithubRepo>>>,
    pub countries: Loadable<Vec<Country>>,
    pub country_details: BTreeMap<String, Loadable<CountryDetails>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routing {
    pub repos_list: ReposListRouting,
    pub repo_details: RepoDetailsRouting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReposListRouting {
    pub repo_details: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoDetailsRouting {
    pub details_sheet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct System {
    pub is_active: bool,
}

impl Default for System {
    fn default() -> Self {
        Self { is_active: true }
    }
}

/// Builds a [`Path`] to a plain field: `field_path!(user_data.countries)`.
macro_rules! field_path {
    ($($field:ident).+) => {
        Path::new(
            stringify!($($field).+),
            |state: &AppState| state.$($field).+.clone(),
            |state: &mut AppState, value| state.$($field).+ = value,
        )
    };
}

/// Addressable locations in [`AppState`].
pub mod paths {
    use super::*;

    pub fn user_data() -> Path<AppState, UserData> {
        field_path!(user_data)
    }

    pub fn github_repos() -> Path<AppState, Loadable<Vec<GithubRepo>>> {
        field_path!(user_data.github_repos)
    }

    pub fn countries() -> Path<AppState, Loadable<Vec<Country>>> {
        field_path!(user_data.countries)
    }

    /// Forks of one repository. Reads `NotRequested` until first written;
    /// writing `NotRequested` removes the entry.
    pub fn forks(repo_id: u64) -> Path<AppState, Loadable<Vec<GithubRepo>>> {
        Path::new(
            format!("user_data.forks[{repo_id}]"),
            move |state: &AppState| {
                state
                    .user_data
                    .forks
                    .get(&repo_id)
                    .cloned()
                    .unwrap_or_default()
            },
            move |state: &mut AppState, value| {
                let forks = &mut state.user_data.forks;
                if matches!(value, Loadable::NotRequested) {
                    forks.remove(&repo_id);
                } else {
                    forks.insert(repo_id, value);
                }
            },
        )
    }

    /// Details of one country, keyed by its alpha-3 code.
    pub fn country_details(code: &str) -> Path<AppState, Loadable<CountryDetails>> {
        let read_key = code.to_string();
        let write_key = code.to_string();
        Path::new(
            format!("user_data.country_details[{code}]"),
            move |state: &AppState| {
                state
                    .user_data
                    .country_details
                    .get(&read_key)
                    .cloned()
                    .unwrap_or_default()
            },
            move |state: &mut AppState, value| {
                let details = &mut state.user_data.country_details;
                if matches!(value, Loadable::NotRequested) {
                    details.remove(&write_key);
                } else {
                    details.insert(write_key.clone(), value);
                }
            },
        )
    }

    pub fn routing() -> Path<AppState, Routing> {
        field_path!(routing)
    }

    pub fn selected_repo() -> Path<AppState, Option<u64>> {
        field_path!(routing.repos_list.repo_details)
    }

    pub fn details_sheet() -> Path<AppState, bool> {
        field_path!(routing.repo_details.details_sheet)
    }

    pub fn is_active() -> Path<AppState, bool> {
        field_path!(system.is_active)
    }
}
