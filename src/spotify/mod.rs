//! # Spotify Integration Module
//!
//! Client for the Spotify Web API covering what is needed to move a playlist:
//! reading a playlist's songs, listing the user's playlists, searching for
//! tracks and building a new playlist.
//!
//! ## Architecture
//!
//! ```text
//! SpotifyClient (façade, MusicPlatform)
//!     ├── auth        Token: PKCE code exchange, validate/refresh
//!     ├── pagination  Paginator: items/next cursor walks
//!     ├── search      search_track + Resolver (bounded concurrency)
//!     └── playlist    PlaylistWriter: create, then append in batches
//!          ↓
//! Transport (reqwest in production)
//! ```
//!
//! Every public operation goes through [`SpotifyClient::authorized`], which
//! validates (and if needed refreshes) the token before handing the bearer
//! credential to the operation body.
//!
//! ## Errors
//!
//! There is no retry anywhere besides the proactive token refresh. Failures
//! surface as [`ClientError`]; partial states (a playlist created but only
//! partly filled) are reported as the error of the step that failed.

pub mod auth;
pub mod pagination;
pub mod playlist;
pub mod search;

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::info;

use crate::{
    config::PlatformConfig,
    error::ClientError,
    transport::{HttpRequest, Transport},
    types::{CreatedPlaylist, CurrentUserResponse, PlatformId, Playlist, Song},
};

use auth::{AuthorizationCode, Token};
use pagination::{Paginator, items_page};
use playlist::{PLAYLIST_TRACK_FIELDS, PlaylistWriter};

/// Description attached to every playlist this tool creates.
pub const PLAYLIST_DESCRIPTION: &str = concat!("generated by ", env!("CARGO_PKG_NAME"));

/// Operations every supported platform offers.
#[async_trait]
pub trait MusicPlatform: Send + Sync {
    /// Finds the platform id of a song, or `None` when nothing matches.
    async fn search(&self, song: &Song) -> Result<Option<PlatformId>, ClientError>;

    /// Returns every song of a playlist, in playlist order.
    async fn get_playlist(&self, id: &PlatformId) -> Result<Vec<Song>, ClientError>;

    async fn get_user_playlists(&self) -> Result<Vec<Playlist>, ClientError>;

    /// Creates a playlist named `name` holding whichever `songs` can be found.
    async fn create_playlist(
        &self,
        name: &str,
        songs: &[Song],
        public: bool,
    ) -> Result<CreatedPlaylist, ClientError>;
}

/// Spotify Web API client.
///
/// Owns the configuration, the transport and the [`Token`]. Every operation
/// runs through [`SpotifyClient::authorized`], so callers never handle the
/// access token themselves.
///
/// # Example
///
/// ```ignore
/// let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
/// let client = SpotifyClient::connect(config, transport, &grant).await?;
///
/// for playlist in client.get_user_playlists().await? {
///     println!("{} ({})", playlist.title, playlist.id);
/// }
/// ```
pub struct SpotifyClient {
    config: PlatformConfig,
    transport: Arc<dyn Transport>,
    token: Token,
}

impl SpotifyClient {
    /// Completes the authorization flow and builds a ready client.
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoints, client id and resolver concurrency
    /// * `transport` - HTTP transport shared by the token and all operations
    /// * `grant` - Authorization code received by the callback server
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] if the code exchange is rejected.
    pub async fn connect(
        config: PlatformConfig,
        transport: Arc<dyn Transport>,
        grant: &AuthorizationCode,
    ) -> Result<Self, ClientError> {
        let token = Token::exchange(grant, &config, Arc::clone(&transport)).await?;
        Ok(Self::with_token(config, transport, token))
    }

    /// Builds a client around an existing token, e.g. one restored elsewhere.
    pub fn with_token(config: PlatformConfig, transport: Arc<dyn Transport>, token: Token) -> Self {
        Self {
            config,
            transport,
            token,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    fn api(&self) -> &str {
        &self.config.api_url
    }

    /// Validates the token, then runs `op` with the bearer credential.
    ///
    /// # Arguments
    ///
    /// * `op` - Operation body; receives the current access token
    ///
    /// # Errors
    ///
    /// Any error from [`Token::validate`], in which case `op` never runs,
    /// otherwise whatever `op` returns.
    pub async fn authorized<F, Fut, R>(&self, op: F) -> Result<R, ClientError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
    {
        let bearer = self.token.validate().await?;
        op(bearer).await
    }

    /// Looks a song up by title and artists.
    ///
    /// # Returns
    ///
    /// The id of the first candidate, `None` if the search came back empty.
    ///
    /// # Errors
    ///
    /// [`ClientError::Remote`] on a non-200 answer.
    pub async fn search(&self, song: &Song) -> Result<Option<PlatformId>, ClientError> {
        self.authorized(|bearer| async move {
            search::search_track(self.transport.as_ref(), self.api(), &bearer, song).await
        })
        .await
    }

    /// Reads every song of a playlist, following pagination to the end.
    ///
    /// Removed or unavailable tracks (`track: null`) are skipped. Release
    /// dates are normalized by their precision tag.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Remote`] if any page fails; no partial list is returned
    /// - [`ClientError::Mapping`] if a track cannot be turned into a [`Song`]
    pub async fn get_playlist(&self, id: &PlatformId) -> Result<Vec<Song>, ClientError> {
        self.authorized(|bearer| async move {
            let first = HttpRequest::get(format!("{}/playlists/{id}/tracks", self.api()))
                .query("fields", PLAYLIST_TRACK_FIELDS)
                .bearer(&bearer);

            Paginator::new(self.transport.as_ref())
                .collect(first, items_page(playlist::song_from_item))
                .await
        })
        .await
    }

    /// Lists the playlists of the authenticated user.
    ///
    /// # Errors
    ///
    /// [`ClientError::Remote`] if any page fails.
    pub async fn get_user_playlists(&self) -> Result<Vec<Playlist>, ClientError> {
        self.authorized(|bearer| async move {
            let first = HttpRequest::get(format!("{}/me/playlists", self.api())).bearer(&bearer);

            Paginator::new(self.transport.as_ref())
                .collect(first, items_page(playlist::playlist_from_item))
                .await
        })
        .await
    }

    /// Id of the authenticated user, needed to create playlists.
    pub async fn current_user_id(&self) -> Result<PlatformId, ClientError> {
        self.authorized(|bearer| async move {
            let request = HttpRequest::get(format!("{}/me", self.api())).bearer(&bearer);

            let response = self.transport.send(request).await?;
            if response.status != StatusCode::OK {
                return Err(ClientError::remote(response.status, &response.body));
            }

            let user: CurrentUserResponse = response.json()?;
            Ok(PlatformId::new(user.id))
        })
        .await
    }

    /// Resolves `songs` concurrently, creates the playlist and appends the
    /// resolved tracks in batches.
    ///
    /// A failure while appending leaves the created playlist in place.
    ///
    /// # Arguments
    ///
    /// * `name` - Title of the new playlist
    /// * `songs` - Songs to look up, in the order they should appear
    /// * `public` - Whether the playlist is visible on the user's profile
    ///
    /// # Returns
    ///
    /// The new playlist, the number of tracks appended and the songs that
    /// could not be found.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] if the token cannot be refreshed; resolution
    ///   stops and nothing is created
    /// - [`ClientError::Remote`] if creating the playlist or an append fails
    pub async fn create_playlist(
        &self,
        name: &str,
        songs: &[Song],
        public: bool,
    ) -> Result<CreatedPlaylist, ClientError> {
        let resolution =
            search::resolve(songs, self.config.search_concurrency, |song| self.search(song))
                .await?;
        let user_id = self.current_user_id().await?;

        self.authorized(|bearer| async move {
            let writer = PlaylistWriter::new(self.transport.as_ref(), self.api(), &bearer);
            let playlist_id = writer
                .create(&user_id, name, public, PLAYLIST_DESCRIPTION)
                .await?;
            let tracks_added = writer.attach(&playlist_id, &resolution.ids).await?;

            info!(
                playlist = %playlist_id,
                tracks_added,
                unresolved = resolution.unresolved.len(),
                "playlist filled"
            );

            Ok(CreatedPlaylist {
                playlist: Playlist {
                    title: name.to_string(),
                    id: playlist_id,
                    image: None,
                },
                tracks_added,
                unresolved: resolution.unresolved,
            })
        })
        .await
    }
}

#[async_trait]
impl MusicPlatform for SpotifyClient {
    async fn search(&self, song: &Song) -> Result<Option<PlatformId>, ClientError> {
        SpotifyClient::search(self, song).await
    }

    async fn get_playlist(&self, id: &PlatformId) -> Result<Vec<Song>, ClientError> {
        SpotifyClient::get_playlist(self, id).await
    }

    async fn get_user_playlists(&self) -> Result<Vec<Playlist>, ClientError> {
        SpotifyClient::get_user_playlists(self).await
    }

    async fn create_playlist(
        &self,
        name: &str,
        songs: &[Song],
        public: bool,
    ) -> Result<CreatedPlaylist, ClientError> {
        SpotifyClient::create_playlist(self, name, songs, public).await
    }
}
