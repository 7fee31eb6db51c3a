//! # API Module
//!
//! HTTP endpoints served by the local callback server while the user grants
//! access in the browser.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the OAuth redirect. It checks the `state` value
//!   against the pending authorization and records either the authorization
//!   code or the reported error. The code is exchanged for a token by the
//!   client, not here.
//! - [`health`] - Reports service name and version.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use playlist_porter::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
