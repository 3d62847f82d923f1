pub mod client;
pub mod countries;
pub mod github;
pub mod repository;
pub mod types;

pub use client::{ClientError, WebClient};
pub use countries::RealCountriesRepository;
pub use github::RealGithubRepository;
pub use repository::{CountriesWebRepository, GithubWebRepository};
pub use types::{Country, CountryDetails, CountryDetailsIntermediate, Currency, GithubRepo, Owner};
