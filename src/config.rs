//! Configuration management for playlist-porter.
//!
//! Configuration is read from environment variables, optionally seeded from a
//! `.env` file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::error::ClientError;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5000/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_SCOPE: &str =
    "playlist-modify-public playlist-modify-private playlist-read-private";
pub const DEFAULT_SEARCH_CONCURRENCY: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives at `<data_local_dir>/playlist-porter/.env`:
/// - Linux: `~/.local/share/playlist-porter/.env`
/// - macOS: `~/Library/Application Support/playlist-porter/.env`
/// - Windows: `%LOCALAPPDATA%/playlist-porter/.env`
///
/// A missing file is not an error; the process environment is used as is.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("playlist-porter/.env");
    path
}

/// Everything the platform client needs to know about its environment.
///
/// # Environment Variables
///
/// | Variable | Field | Default |
/// |---|---|---|
/// | `SPOTIFY_API_AUTH_CLIENT_ID` | `client_id` | required |
/// | `SPOTIFY_API_REDIRECT_URI` | `redirect_uri` | `http://127.0.0.1:5000/callback` |
/// | `SPOTIFY_API_AUTH_SCOPE` | `scope` | playlist read and modify scopes |
/// | `SPOTIFY_API_AUTH_URL` | `auth_url` | Spotify accounts authorize page |
/// | `SPOTIFY_API_TOKEN_URL` | `token_url` | Spotify accounts token endpoint |
/// | `SPOTIFY_API_URL` | `api_url` | `https://api.spotify.com/v1` |
/// | `SERVER_ADDRESS` | `server_addr` | `127.0.0.1:5000` |
/// | `PORTER_SEARCH_CONCURRENCY` | `search_concurrency` | `8` |
/// | `PORTER_REQUEST_TIMEOUT_SECS` | `request_timeout` | `30` |
///
/// The redirect URI must be registered for the app in the Spotify developer
/// dashboard and has to point at `server_addr`'s `/callback` route.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub client_id: String,
    pub redirect_uri: String,
    /// Space separated OAuth scopes.
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    /// Web API base URL, without trailing slash.
    pub api_url: String,
    /// Address the local callback server binds to.
    pub server_addr: String,
    /// Upper bound on concurrent search requests while resolving songs.
    pub search_concurrency: usize,
    /// Timeout applied by the transport to every HTTP request.
    pub request_timeout: Duration,
}

impl PlatformConfig {
    /// Configuration with the public Spotify endpoints and defaults.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            search_concurrency: DEFAULT_SEARCH_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// `SPOTIFY_API_AUTH_CLIENT_ID` is required; every other variable falls
    /// back to its default. Call [`load_env`] first to pick up the `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if:
    /// - the client id is missing or blank
    /// - a numeric variable does not parse
    /// - `PORTER_SEARCH_CONCURRENCY` is `0`
    ///
    /// # Example
    ///
    /// ```ignore
    /// config::load_env().await?;
    /// let config = PlatformConfig::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let client_id = lookup("SPOTIFY_API_AUTH_CLIENT_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ClientError::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".into()))?;

        let mut config = Self::new(client_id);
        let overrides = [
            ("SPOTIFY_API_REDIRECT_URI", &mut config.redirect_uri),
            ("SPOTIFY_API_AUTH_SCOPE", &mut config.scope),
            ("SPOTIFY_API_AUTH_URL", &mut config.auth_url),
            ("SPOTIFY_API_TOKEN_URL", &mut config.token_url),
            ("SPOTIFY_API_URL", &mut config.api_url),
            ("SERVER_ADDRESS", &mut config.server_addr),
        ];
        for (key, field) in overrides {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(n) = parse_var::<usize>(&lookup, "PORTER_SEARCH_CONCURRENCY")? {
            if n == 0 {
                return Err(ClientError::Config(
                    "PORTER_SEARCH_CONCURRENCY must be at least 1".into(),
                ));
            }
            config.search_concurrency = n;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "PORTER_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        config.api_url = config.api_url.trim_end_matches('/').to_string();
        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ClientError>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ClientError::Config(format!("{key}: invalid value '{raw}': {e}")))
        })
        .transpose()
}
