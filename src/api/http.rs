use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::directory::{DirectoryApi, LookupOutcome};
use crate::config::DirectoryConfig;
use crate::domain::Coordinate;
use crate::error::{Result, StoreReachError};

const USER_AGENT: &str = concat!("storereach/", env!("CARGO_PKG_VERSION"));
const UNAVAILABLE_CODE: &str = "BUSINESS_UNAVAILABLE";

#[derive(Debug, Deserialize)]
struct BusinessResponse {
    #[serde(default)]
    coordinates: Option<BusinessCoordinates>,
}

#[derive(Debug, Deserialize)]
struct BusinessCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
}

/// Business directory over HTTP.
///
/// Business details come from `{api_url}/businesses/{id}` with bearer auth;
/// the storefront check fetches the public page at `{site_url}/biz/{id}`.
pub struct HttpDirectory {
    client: Client,
    api_url: String,
    site_url: String,
    api_key: String,
}

impl HttpDirectory {
    /// # Errors
    /// * `MissingCredentials` - no API key in the config or environment
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            site_url: config.site_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl DirectoryApi for HttpDirectory {
    fn lookup(&self, id: &str) -> Result<LookupOutcome> {
        let url = format!("{}/businesses/{}", self.api_url, id);
        let response = self.client.get(&url).bearer_auth(&self.api_key).send()?;
        let status = response.status();
        let body = response.text()?;

        debug!(id, status = status.as_u16(), "directory lookup");
        classify_lookup(status, &body, &url)
    }

    fn storefront_exists(&self, id: &str) -> Result<bool> {
        let url = format!("{}/biz/{}", self.site_url, id);
        let status = self.client.get(&url).send()?.status();

        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(false),
            s => Err(StoreReachError::UnexpectedStatus {
                status: s.as_u16(),
                url,
            }),
        }
    }
}

/// Map a business-details response onto a lookup outcome.
///
/// The error code takes precedence over the status: the directory reports
/// unavailable businesses with a client-error status that would otherwise
/// read as "not found".
fn classify_lookup(status: StatusCode, body: &str, url: &str) -> Result<LookupOutcome> {
    if status.is_success() {
        let business: BusinessResponse =
            serde_json::from_str(body).map_err(|source| StoreReachError::Json {
                context: url.to_string(),
                source,
            })?;
        let position = business.coordinates.and_then(|c| match (c.latitude, c.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        });
        return Ok(LookupOutcome::Found(position));
    }

    let code = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error.code);
    if code.as_deref() == Some(UNAVAILABLE_CODE) {
        return Ok(LookupOutcome::Unavailable);
    }

    match status {
        StatusCode::NOT_FOUND => Ok(LookupOutcome::NotFound),
        StatusCode::UNAUTHORIZED => Err(StoreReachError::MissingCredentials),
        s => Err(StoreReachError::UnexpectedStatus {
            status: s.as_u16(),
            url: url.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://api.example.test/businesses/x";

    #[test]
    fn test_found_with_coordinates() {
        let body = r#"{"id": "starbucks-new-york", "coordinates": {"latitude": 40.75, "longitude": -73.98}}"#;
        let outcome = classify_lookup(StatusCode::OK, body, URL).unwrap();
        assert_eq!(
            outcome,
            LookupOutcome::Found(Some(Coordinate::new(40.75, -73.98)))
        );
    }

    #[test]
    fn test_found_without_coordinates() {
        let body = r#"{"id": "x", "coordinates": {"latitude": null, "longitude": null}}"#;
        let outcome = classify_lookup(StatusCode::OK, body, URL).unwrap();
        assert_eq!(outcome, LookupOutcome::Found(None));
    }

    #[test]
    fn test_not_found() {
        let body = r#"{"error": {"code": "BUSINESS_NOT_FOUND", "description": "nope"}}"#;
        let outcome = classify_lookup(StatusCode::NOT_FOUND, body, URL).unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[test]
    fn test_unavailable_code_wins_over_status() {
        let body = r#"{"error": {"code": "BUSINESS_UNAVAILABLE", "description": "later"}}"#;
        for status in [StatusCode::NOT_FOUND, StatusCode::FORBIDDEN] {
            let outcome = classify_lookup(status, body, URL).unwrap();
            assert_eq!(outcome, LookupOutcome::Unavailable);
        }
    }

    #[test]
    fn test_server_error_surfaces() {
        let result = classify_lookup(StatusCode::BAD_GATEWAY, "<html>", URL);
        assert!(matches!(
            result,
            Err(StoreReachError::UnexpectedStatus { status: 502, .. })
        ));
    }

    #[test]
    fn test_unauthorized_is_credentials_error() {
        let body = r#"{"error": {"code": "TOKEN_INVALID"}}"#;
        assert!(matches!(
            classify_lookup(StatusCode::UNAUTHORIZED, body, URL),
            Err(StoreReachError::MissingCredentials)
        ));
    }

    #[test]
    fn test_new_requires_key() {
        let config = DirectoryConfig {
            api_key: Some(String::new()),
            ..DirectoryConfig::default()
        };
        assert!(matches!(
            HttpDirectory::new(&config),
            Err(StoreReachError::MissingCredentials)
        ));
    }
}
