//! BrickLink store API client
//!
//! Every call is one signed GET returning the fixed envelope
//! `{"meta": {"code", "message", "description"}, "data": ...}`. The meta block
//! is decoded first; `data` is only decoded, into the call's own type, once
//! the code is known to be 200.

pub mod catalog;
pub mod error;
pub mod notifications;
pub mod orders;

use reqwest::Url;
use std::fmt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::models::credentials::CredentialSet;
use crate::services::oauth::OAuthClient;

pub use error::{BricklinkError, TransportError};

pub const BRICKLINK_API_BASE_URL: &str = "https://api.bricklink.com/api/store/v1";

/// Provider slug used for stored credentials and webhook routes
pub const PROVIDER: &str = "bricklink";

/// Success code carried in `meta.code`
const META_OK: i32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
struct MetaOnly {
    meta: ResponseMeta,
}

#[derive(Deserialize)]
struct DataOnly<T> {
    data: T,
}

/// A successful envelope with its raw body kept verbatim
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub meta: ResponseMeta,
    body: String,
}

impl ApiResponse {
    /// Untouched response body, for callers that re-parse the payload
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decode `data` into the shape this call expects
    pub fn data<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, BricklinkError> {
        serde_json::from_str::<DataOnly<T>>(&self.body)
            .map(|envelope| envelope.data)
            .map_err(|source| BricklinkError::Decode { what, source })
    }
}

/// Turn a raw HTTP answer into an envelope or a typed error.
///
/// A body that parses as an envelope wins over the HTTP status, since the
/// provider reports auth failures as e.g. HTTP 401 with `meta.code = 401`.
pub(crate) fn parse_envelope(status: u16, body: String) -> Result<ApiResponse, BricklinkError> {
    match serde_json::from_str::<MetaOnly>(&body) {
        Ok(MetaOnly { meta }) if meta.code == META_OK => Ok(ApiResponse { meta, body }),
        Ok(MetaOnly { meta }) => Err(BricklinkError::Api {
            code: meta.code,
            message: meta.message,
            description: meta.description,
        }),
        Err(_) if !(200..300).contains(&status) => Err(TransportError::Status {
            status,
            body: truncate(&body, 200),
        }
        .into()),
        Err(e) => Err(TransportError::InvalidBody(e.to_string()).into()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Authenticated client for one user. Cheap to share behind an `Arc`.
pub struct BricklinkClient {
    oauth: OAuthClient,
    base_url: String,
}

// Only the consumer key is shown; secrets stay inside the signer
impl fmt::Debug for BricklinkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BricklinkClient")
            .field("base_url", &self.base_url)
            .field("consumer_key", &self.oauth.consumer_key())
            .finish_non_exhaustive()
    }
}

impl BricklinkClient {
    pub fn new(credentials: CredentialSet, config: &ApiConfig) -> Result<Self, BricklinkError> {
        let oauth = OAuthClient::new(credentials, config.timeout).map_err(TransportError::from)?;

        Ok(Self {
            oauth,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signed GET of `{base}{endpoint}`; `endpoint` includes any query string
    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, BricklinkError> {
        let full = format!("{}{}", self.base_url, endpoint);
        let url = Url::parse(&full).map_err(|e| TransportError::InvalidUrl {
            url: full.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(endpoint = %endpoint, consumer_key = %self.oauth.consumer_key(), "BrickLink GET");

        let raw = self.oauth.get(&url).await.map_err(TransportError::from)?;
        let response = parse_envelope(raw.status.as_u16(), raw.body)?;

        tracing::debug!(
            endpoint = %endpoint,
            response_length = response.body().len(),
            "BrickLink request succeeded"
        );
        Ok(response)
    }
}
