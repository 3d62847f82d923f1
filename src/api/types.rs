use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// GitHub
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: u64,
    pub avatar_url: String,
    pub login: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub forks: u64,
    pub watchers: u64,
    pub owner: Owner,
    pub forks_url: String,
}

impl GithubRepo {
    /// `owner/name`, the form GitHub shows in its UI.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }
}

/// Envelope of `GET /search/repositories`. Only `items` is used.
#[derive(Deserialize, Debug)]
pub struct SearchResults {
    pub items: Vec<GithubRepo>,
}

// ============================================================================
// Countries
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub translations: HashMap<String, Option<String>>,
    pub population: u64,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(rename = "alpha3Code")]
    pub alpha3_code: String,
}

impl Country {
    /// Name in the given language, falling back to the default name.
    pub fn localized_name(&self, lang: &str) -> &str {
        self.translations
            .get(lang)
            .and_then(|t| t.as_deref())
            .unwrap_or(&self.name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub name: String,
}

/// Details as the countries API returns them: neighbours are border codes.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CountryDetailsIntermediate {
    pub capital: String,
    #[serde(default)]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub borders: Vec<String>,
}

/// Details with border codes resolved against the loaded country list.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct CountryDetails {
    pub capital: String,
    pub currencies: Vec<Currency>,
    pub neighbors: Vec<Country>,
}

impl CountryDetailsIntermediate {
    /// Resolves border codes against `countries`. Codes with no match in the
    /// list are dropped; order follows the border list.
    pub fn substitute_neighbors(self, countries: &[Country]) -> CountryDetails {
        let neighbors = self
            .borders
            .iter()
            .filter_map(|code| countries.iter().find(|c| &c.alpha3_code == code))
            .cloned()
            .collect();
        CountryDetails {
            capital: self.capital,
            currencies: self.currencies,
            neighbors,
        }
    }
}
