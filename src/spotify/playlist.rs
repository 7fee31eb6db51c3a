//! Playlist reads (item mapping) and playlist construction.

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::{
    error::ClientError,
    transport::{HttpRequest, Transport},
    types::{
        AddTracksRequest, CreatePlaylistRequest, CreatePlaylistResponse, Playlist, PlatformId,
        PlaylistItem, Song, UserPlaylist,
    },
    utils::{self, ReleasePrecision},
};

/// The platform accepts at most this many track URIs per append request.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Projection for the playlist-tracks endpoint.
pub const PLAYLIST_TRACK_FIELDS: &str =
    "items(track(name,artists(name),album(name,release_date,release_date_precision))),next";

pub fn track_uri(id: &PlatformId) -> String {
    format!("spotify:track:{id}")
}

/// Maps one playlist item to a song. Items without a track are skipped.
pub fn song_from_item(item: PlaylistItem) -> Result<Option<Song>, ClientError> {
    let Some(track) = item.track else {
        return Ok(None);
    };

    if track.artists.is_empty() {
        return Err(ClientError::Mapping(format!(
            "track '{}' has no artists",
            track.name
        )));
    }

    let mut song = Song::new(track.name, track.artists.into_iter().map(|a| a.name));
    if let Some(album) = track.album {
        song.album = album.name;
        song.released = match (album.release_date, album.release_date_precision) {
            (Some(date), Some(tag)) => {
                let precision: ReleasePrecision = tag.parse()?;
                Some(utils::parse_release_date(&date, precision)?)
            }
            (Some(date), None) => {
                return Err(ClientError::Mapping(format!(
                    "release date '{date}' has no precision tag"
                )));
            }
            (None, _) => None,
        };
    }

    Ok(Some(song))
}

/// Maps one entry of the user's playlists to a playlist reference.
pub fn playlist_from_item(item: UserPlaylist) -> Result<Option<Playlist>, ClientError> {
    let image = item
        .images
        .and_then(|images| images.into_iter().next())
        .map(|image| image.url);

    Ok(Some(Playlist {
        title: item.name,
        id: PlatformId::new(item.id),
        image,
    }))
}

/// Splits `ids` into contiguous append batches.
pub fn batches(ids: &[PlatformId]) -> impl Iterator<Item = &[PlatformId]> {
    ids.chunks(MAX_TRACKS_PER_REQUEST)
}

/// Creates a playlist and fills it, in two non-transactional steps.
///
/// If an append fails the playlist is left in place with the batches that
/// made it in before the failure.
pub struct PlaylistWriter<'a> {
    transport: &'a dyn Transport,
    api_url: &'a str,
    bearer: &'a str,
}

impl<'a> PlaylistWriter<'a> {
    pub fn new(transport: &'a dyn Transport, api_url: &'a str, bearer: &'a str) -> Self {
        Self {
            transport,
            api_url,
            bearer,
        }
    }

    /// Creates an empty playlist owned by `user_id`.
    ///
    /// # Returns
    ///
    /// The id of the new playlist.
    ///
    /// # Errors
    ///
    /// [`ClientError::Remote`] unless the platform answers 201 Created.
    pub async fn create(
        &self,
        user_id: &PlatformId,
        name: &str,
        public: bool,
        description: &str,
    ) -> Result<PlatformId, ClientError> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            public,
            description: description.to_string(),
        };
        let request = HttpRequest::post(format!("{}/users/{user_id}/playlists", self.api_url))
            .bearer(self.bearer)
            .json(serde_json::to_value(&body)?);

        let response = self.transport.send(request).await?;
        if response.status != StatusCode::CREATED {
            return Err(ClientError::remote(response.status, &response.body));
        }

        let created: CreatePlaylistResponse = response.json()?;
        info!(playlist = %created.id, name, "playlist created");
        Ok(PlatformId::new(created.id))
    }

    /// Appends `ids` in order, one request per batch of at most
    /// [`MAX_TRACKS_PER_REQUEST`]. Returns the number of tracks appended.
    ///
    /// # Errors
    ///
    /// [`ClientError::Remote`] on the first batch not answered with 201.
    /// Later batches are not sent; earlier ones stay in the playlist.
    pub async fn attach(
        &self,
        playlist_id: &PlatformId,
        ids: &[PlatformId],
    ) -> Result<usize, ClientError> {
        let url = format!("{}/playlists/{playlist_id}/tracks", self.api_url);
        let mut attached = 0;

        for (n, batch) in batches(ids).enumerate() {
            let body = AddTracksRequest {
                uris: batch.iter().map(track_uri).collect(),
            };
            let request = HttpRequest::post(&url)
                .bearer(self.bearer)
                .json(serde_json::to_value(&body)?);

            let response = self.transport.send(request).await?;
            if response.status != StatusCode::CREATED {
                return Err(ClientError::remote(response.status, &response.body));
            }

            attached += batch.len();
            debug!(batch = n, size = batch.len(), "tracks appended");
        }

        Ok(attached)
    }
}
