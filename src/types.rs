use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Opaque identifier of a track, playlist or user on one platform.
///
/// Only meaningful within the platform that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PlatformId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PlatformId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A song as it travels between platforms.
///
/// `released` is normalized to a calendar date even when the source only knew
/// the year or month, so day-level precision is not guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<NaiveDate>,
}

impl Song {
    pub fn new<I, S>(title: impl Into<String>, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            artists: artists.into_iter().map(Into::into).collect(),
            album: None,
            released: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_release_date(mut self, released: NaiveDate) -> Self {
        self.released = Some(released);
        self
    }

    /// Free-text search query: the title followed by every artist name.
    pub fn search_query(&self) -> String {
        std::iter::once(self.title.as_str())
            .chain(self.artists.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Reference to a playlist on a platform, not its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub title: String,
    pub id: PlatformId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// An authorization request waiting for the platform to call back.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    /// Value sent as `state`; the callback must echo it.
    pub state: String,
    /// Authorization code on success, error description otherwise.
    pub outcome: Option<Result<String, String>>,
}

/// Outcome of `create_playlist`.
#[derive(Debug, Clone)]
pub struct CreatedPlaylist {
    pub playlist: Playlist,
    pub tracks_added: usize,
    pub unresolved: Vec<Song>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct SongTableRow {
    pub title: String,
    pub artists: String,
    pub album: String,
    pub released: String,
}

impl From<&Song> for SongTableRow {
    fn from(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            artists: song.artists.join(", "),
            album: song.album.clone().unwrap_or_default(),
            released: song.released.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

// Wire formats of the platform's Web API.

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: SearchTracks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTracks {
    pub items: Vec<TrackRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrack {
    pub name: String,
    pub artists: Vec<TrackArtist>,
    pub album: Option<TrackAlbum>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackAlbum {
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub release_date_precision: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub public: bool,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_joins_title_and_artists() {
        let song = Song::new("Under Pressure", ["Queen", "David Bowie"]);
        assert_eq!(song.search_query(), "Under Pressure Queen David Bowie");
    }

    #[test]
    fn test_song_round_trips_through_json() {
        let full = Song::new("Heroes", ["David Bowie"])
            .with_album("\"Heroes\"")
            .with_release_date(NaiveDate::from_ymd_opt(1977, 10, 14).unwrap());
        let year_only = Song::new("Heroes", ["David Bowie"])
            .with_release_date(NaiveDate::from_ymd_opt(1977, 1, 1).unwrap());
        let undated = Song::new("Untitled", ["Unknown Artist"]);

        for song in [full, year_only, undated] {
            let json = serde_json::to_string(&song).unwrap();
            let back: Song = serde_json::from_str(&json).unwrap();
            assert_eq!(back, song);
        }
    }

    #[test]
    fn test_song_without_optional_fields_deserializes() {
        let song: Song = serde_json::from_str(r#"{"title": "Song", "artists": ["A"]}"#).unwrap();
        assert_eq!(song.album, None);
        assert_eq!(song.released, None);

        let json = serde_json::to_string(&song).unwrap();
        assert!(!json.contains("released"));
    }

    #[test]
    fn test_released_serializes_as_iso_date() {
        let song = Song::new("Song", ["A"]).with_release_date(NaiveDate::from_ymd_opt(2001, 2, 3).unwrap());
        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(json["released"], "2001-02-03");
    }
}
