//! OAuth1 one-legged request signing (HMAC-SHA1, Authorization header)
//!
//! The provider issues all four credential parts up front, so there is no
//! token dance here: every request is signed with the consumer and access
//! secrets and sent with an `Authorization: OAuth ...` header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{header::AUTHORIZATION, Client, StatusCode, Url};
use sha1::Sha1;
use std::time::Duration;
use uuid::Uuid;

use crate::models::credentials::CredentialSet;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("failed to initialise request signer: {0}")]
    Signer(#[from] hmac::digest::InvalidLength),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Status and body of a signed request, body kept verbatim
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// HTTP client that signs every request with one user's credentials
pub struct OAuthClient {
    http: Client,
    credentials: CredentialSet,
}

impl OAuthClient {
    pub fn new(credentials: CredentialSet, timeout: Duration) -> Result<Self, OAuthError> {
        let http = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self { http, credentials })
    }

    /// Signed GET. Non-2xx statuses are returned, not turned into errors,
    /// because the provider still answers with its JSON envelope.
    pub async fn get(&self, url: &Url) -> Result<RawResponse, OAuthError> {
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = Utc::now().timestamp();
        let header = self.authorization_header("GET", url, &nonce, timestamp)?;

        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, header)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }

    pub fn consumer_key(&self) -> &str {
        &self.credentials.consumer_key
    }

    fn authorization_header(
        &self,
        method: &str,
        url: &Url,
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, OAuthError> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", self.credentials.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.credentials.token.as_str()),
            ("oauth_version", OAUTH_VERSION),
        ];

        let base = signature_base_string(method, url, &oauth_params);
        let key = signing_key(&self.credentials);
        let signature = sign(&key, &base)?;
        oauth_params.push(("oauth_signature", signature.as_str()));
        oauth_params.sort_by(|a, b| a.0.cmp(b.0));

        let fields = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", fields))
    }
}

/// `METHOD&enc(base_uri)&enc(sorted params)` over query and oauth parameters
fn signature_base_string(method: &str, url: &Url, oauth_params: &[(&str, &str)]) -> String {
    let mut base_uri = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        base_uri.push_str(&format!(":{}", port));
    }
    base_uri.push_str(url.path());

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (urlencoding::encode(&k).into_owned(), urlencoding::encode(&v).into_owned()))
        .chain(oauth_params.iter().map(|(k, v)| {
            (urlencoding::encode(k).into_owned(), urlencoding::encode(v).into_owned())
        }))
        .collect();
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        urlencoding::encode(&base_uri),
        urlencoding::encode(&param_string)
    )
}

fn signing_key(credentials: &CredentialSet) -> String {
    format!(
        "{}&{}",
        urlencoding::encode(&credentials.consumer_secret),
        urlencoding::encode(&credentials.token_secret)
    )
}

fn sign(key: &str, base: &str) -> Result<String, OAuthError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
