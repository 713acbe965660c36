use crate::services::oauth::OAuthError;

/// Failures below the API envelope: the request never produced a usable
/// `{meta, data}` body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] OAuthError),
    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response body is not a JSON envelope: {0}")]
    InvalidBody(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BricklinkError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The provider answered with `meta.code != 200`
    #[error("BrickLink API error {code}: {message}")]
    Api {
        code: i32,
        message: String,
        description: String,
    },

    /// Envelope was fine but `data` did not match the expected shape
    #[error("failed to decode {what} from response data: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("The ID '{id}' is not a valid {item_type} ID. Please check the ID and try again.")]
    InvalidItemId { item_type: String, id: String },

    #[error("Unable to find {item_type} with ID '{id}'. Please verify the ID is correct.")]
    ItemLookupFailed { item_type: String, id: String },
}

impl BricklinkError {
    /// Network, timeout and malformed-body failures. Callers that retry
    /// should only retry these.
    pub fn is_transport(&self) -> bool {
        matches!(self, BricklinkError::Transport(_))
    }

    /// `meta.code` for API-reported failures
    pub fn api_code(&self) -> Option<i32> {
        match self {
            BricklinkError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
