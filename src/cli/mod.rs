//! # CLI Module
//!
//! User-facing commands. Every command that touches a playlist first runs the
//! authorization flow ([`connect`]); credentials are not stored between runs.
//!
//! ## Commands
//!
//! - [`auth`] - Authorize and print the logged-in user
//! - [`list_playlists`] - Table of the user's playlists
//! - [`list_songs`] - Table of one playlist's songs
//! - [`export`] - Write a playlist's songs as JSON
//! - [`import`] - Create a playlist from exported songs
//!
//! ```bash
//! playlist-porter playlists
//! playlist-porter export 37i9dQZF1DXcBWIGoYBM5M --output hits.json
//! playlist-porter import hits.json --name "Hits (copy)"
//! ```
//!
//! Status messages go to stderr, data (tables, JSON) to stdout.

mod auth;
mod playlist;

pub use auth::auth;
pub use auth::connect;
pub use playlist::export;
pub use playlist::import;
pub use playlist::list_playlists;
pub use playlist::list_songs;
pub use playlist::read_songs;
