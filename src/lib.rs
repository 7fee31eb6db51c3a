//! Playlist Porter Library
//!
//! Moves playlists between music streaming platforms. The core is the
//! platform client: OAuth2 PKCE authentication with a self-refreshing bearer
//! token, cursor pagination, concurrent song resolution and batched playlist
//! construction.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Client error type
//! - `logging` - Diagnostic logging setup
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `transport` - HTTP transport abstraction
//! - `types` - Domain values and wire formats
//! - `utils` - PKCE and date helpers
//!
//! # Example
//!
//! ```ignore
//! use playlist_porter::{config::PlatformConfig, spotify::SpotifyClient};
//!
//! let client = SpotifyClient::connect(config, transport, &grant).await?;
//! let songs = client.get_playlist(&playlist_id).await?;
//! let created = client.create_playlist("Copy", &songs, false).await?;
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod spotify;
pub mod transport;
pub mod types;
pub mod utils;

/// A convenient Result type alias for the command-line layer.
///
/// Library operations return [`error::ClientError`]; the CLI funnels those
/// and its own I/O errors through this boxed error type.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Status output goes to stderr so stdout stays clean for exported data.
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors in the binary; library code returns errors instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
