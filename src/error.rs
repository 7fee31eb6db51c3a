//! Error type shared by the platform client.
//!
//! Authentication failures are kept apart from every other remote failure so
//! callers (and the resolver) can tell "the session is dead" from "this one
//! request did not work".

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Number of body characters kept when a response carries no usable message.
const RAW_BODY_PREVIEW: usize = 200;

#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Authorization-code exchange or token refresh was rejected.
    #[error("authentication failed ({status}): {message}")]
    Auth { status: StatusCode, message: String },

    /// Any other non-success API response, or a transport failure (no status).
    #[error("remote error{}: {message}", status_suffix(.status))]
    Remote {
        status: Option<StatusCode>,
        message: String,
    },

    /// A successful response whose content could not be mapped to domain values.
    #[error("mapping error: {0}")]
    Mapping(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Auth { status, .. } => Some(*status),
            ClientError::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// Builds a [`ClientError::Remote`] from a non-success response.
    pub fn remote(status: StatusCode, body: &str) -> Self {
        ClientError::Remote {
            status: Some(status),
            message: error_message(body),
        }
    }

    /// Builds a [`ClientError::Auth`] from a rejected token request.
    pub fn auth(status: StatusCode, body: &str) -> Self {
        ClientError::Auth {
            status,
            message: error_message(body),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Remote {
            status: e.status(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Mapping(e.to_string())
    }
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    // Web API: {"error": {"status": 404, "message": "..."}}
    Api { error: ApiError },
    // Accounts service: {"error": "invalid_grant", "error_description": "..."}
    OAuth {
        error: String,
        error_description: Option<String>,
    },
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Extracts the server-reported message from an error response body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Api { error }) => error.message,
        Ok(ErrorBody::OAuth {
            error,
            error_description,
        }) => match error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        },
        Err(_) => body.chars().take(RAW_BODY_PREVIEW).collect(),
    }
}
