// Place-search HTTP client
//
// Base path: {base}/v1/places/search?q=<query>
// Auth: optional X-API-KEY header (see `TransportConfig`)

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Wire types ───────────────────────────────────────────────────────

/// One grounded place returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceResponse {
    pub title: String,
    pub uri: String,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    places: Vec<PlaceResponse>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the place-search service.
///
/// Results come back in the order the service ranked them; the client never
/// re-sorts or de-duplicates.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SearchClient {
    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Force a trailing slash so relative joins keep the configured path prefix.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Search for places matching `query`.
    pub async fn search_locations(&self, query: &str) -> Result<Vec<PlaceResponse>, Error> {
        let url = self.base_url.join("v1/places/search")?;
        debug!("GET {url} q={query:?}");

        let resp = self.http.get(url).query(&[("q", query)]).send().await?;
        let envelope: SearchEnvelope = self.handle_response(resp).await?;
        Ok(envelope.places)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidApiKey);
        }

        let body = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    if body.is_empty() {
                        status.to_string()
                    } else {
                        body.clone()
                    }
                });
            return Err(Error::Service {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
