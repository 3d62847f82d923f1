//! Countries REST API repository (restcountries v2 layout).
//!
//! - `GET /all`
//! - `GET /name/<percent-encoded name>`, which answers with an array

use async_trait::async_trait;
use log::{info, warn};

use super::client::{ClientError, WebClient};
use super::repository::CountriesWebRepository;
use super::types::{Country, CountryDetailsIntermediate};
use crate::core::loadable::LoadError;

pub struct RealCountriesRepository {
    client: WebClient,
}

impl RealCountriesRepository {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: WebClient::new(base_url, None)?,
        })
    }

    /// Absolute details URL with the country name as one encoded segment.
    fn details_url(&self, name: &str) -> Result<String, LoadError> {
        let mut url = reqwest::Url::parse(&self.client.url_for("/name"))
            .map_err(|e| LoadError::Network(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| LoadError::Network("base URL cannot carry a path".to_string()))?
            .push(name);
        Ok(url.to_string())
    }
}

#[async_trait]
impl CountriesWebRepository for RealCountriesRepository {
    fn name(&self) -> &str {
        "countries"
    }

    async fn load_countries(&self) -> Result<Vec<Country>, LoadError> {
        let countries: Vec<Country> = self.client.get_json("/all", &[]).await?;
        info!("Loaded {} countries", countries.len());
        Ok(countries)
    }

    async fn load_country_details(
        &self,
        country: &Country,
    ) -> Result<CountryDetailsIntermediate, LoadError> {
        let url = self.details_url(&country.name)?;
        let details: Vec<CountryDetailsIntermediate> = self.client.get_json(&url, &[]).await?;
        details.into_iter().next().ok_or_else(|| {
            warn!("Details for {} came back empty", country.name);
            LoadError::UnexpectedResponse
        })
    }
}
