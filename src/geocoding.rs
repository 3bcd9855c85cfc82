use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::entry::{Address, Coordinates};

/// Enumerates errors returned by geocoders. None of these are fatal to
/// a submission; the entry is stored without a location instead.
#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Geocoding is disabled")]
    Disabled,

    #[error("Unable to build geocoding client")]
    Client { source: reqwest::Error },

    #[error("Unable to build geocoding URL")]
    InvalidUrl { source: url::ParseError },

    #[error("Geocoding request failed")]
    Request { source: reqwest::Error },

    #[error("Malformed geocoding response")]
    MalformedResponse { source: serde_json::Error },

    #[error("No address found: {0}")]
    NoAddress(String),
}

/// Resolves coordinates to a structured address.
pub trait Geocoder {
    fn reverse(&self, coordinates: Coordinates) -> BoxFuture<Result<Address, GeocodingError>>;
}

/// A geocoder that never resolves anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledGeocoder;

impl Geocoder for DisabledGeocoder {
    fn reverse(&self, _coordinates: Coordinates) -> BoxFuture<Result<Address, GeocodingError>> {
        futures::future::ready(Err(GeocodingError::Disabled)).boxed()
    }
}

/// A client for the reverse endpoint of a Nominatim server.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: Url,
}

impl NominatimGeocoder {
    /// Creates a new instance. Nominatim’s usage policy requires a
    /// descriptive `user_agent`.
    pub fn new(
        mut base_url: Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodingError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|source| GeocodingError::Client { source })?;

        Ok(NominatimGeocoder { client, base_url })
    }

    pub fn reverse_url(&self, coordinates: Coordinates) -> Result<Url, GeocodingError> {
        let mut url = self
            .base_url
            .join("reverse")
            .map_err(|source| GeocodingError::InvalidUrl { source })?;

        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &coordinates.latitude.to_string())
            .append_pair("lon", &coordinates.longitude.to_string());

        Ok(url)
    }
}

impl Geocoder for NominatimGeocoder {
    fn reverse(&self, coordinates: Coordinates) -> BoxFuture<Result<Address, GeocodingError>> {
        async move {
            let url = self.reverse_url(coordinates)?;

            let body = self
                .client
                .get(url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|source| GeocodingError::Request { source })?
                .bytes()
                .await
                .map_err(|source| GeocodingError::Request { source })?;

            parse_reverse_response(&body)
        }
        .boxed()
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<NominatimAddress>,
    error: Option<String>,
}

/// The subset of Nominatim’s address breakdown we use. Which key holds
/// the “city” depends on the size of the settlement.
#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    city_district: Option<String>,
    suburb: Option<String>,
    borough: Option<String>,
    state: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

impl From<NominatimAddress> for Address {
    fn from(a: NominatimAddress) -> Self {
        Address {
            city: a.city.or(a.town).or(a.village).or(a.municipality),
            district: a.city_district.or(a.suburb).or(a.borough),
            state: a.state.or(a.region),
            country: a.country,
        }
    }
}

fn parse_reverse_response(body: &[u8]) -> Result<Address, GeocodingError> {
    let response: ReverseResponse = serde_json::from_slice(body)
        .map_err(|source| GeocodingError::MalformedResponse { source })?;

    match response {
        ReverseResponse {
            address: Some(address),
            ..
        } => Ok(address.into()),
        ReverseResponse { error, .. } => Err(GeocodingError::NoAddress(
            error.unwrap_or_else(|| "empty response".to_owned()),
        )),
    }
}
