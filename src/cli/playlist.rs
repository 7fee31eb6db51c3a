use std::{path::Path, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    Res, info,
    spotify::MusicPlatform,
    success,
    types::{PlatformId, PlaylistTableRow, Song, SongTableRow},
    warning,
};

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// `playlists` command: lists the user's playlists.
pub async fn list_playlists(platform: &dyn MusicPlatform) -> Res<()> {
    let pb = spinner("Fetching playlists...");
    let playlists = platform.get_user_playlists().await;
    pb.finish_and_clear();

    let rows: Vec<PlaylistTableRow> = playlists?
        .into_iter()
        .map(|p| PlaylistTableRow {
            name: p.title,
            id: p.id.to_string(),
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}

/// `songs` command: shows the songs of one playlist.
pub async fn list_songs(platform: &dyn MusicPlatform, playlist_id: &str) -> Res<()> {
    let pb = spinner("Fetching playlist...");
    let songs = platform.get_playlist(&PlatformId::from(playlist_id)).await;
    pb.finish_and_clear();

    let rows: Vec<SongTableRow> = songs?.iter().map(SongTableRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

/// `export` command: writes a playlist's songs as JSON.
pub async fn export(
    platform: &dyn MusicPlatform,
    playlist_id: &str,
    output: Option<&Path>,
) -> Res<()> {
    let pb = spinner("Fetching playlist...");
    let songs = platform.get_playlist(&PlatformId::from(playlist_id)).await;
    pb.finish_and_clear();

    let songs = songs?;
    let json = serde_json::to_string_pretty(&songs)?;

    match output {
        Some(path) => {
            async_fs::write(path, json).await?;
            success!("Exported {} songs to {}", songs.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Reads songs previously written by `export`.
pub async fn read_songs(path: &Path) -> Res<Vec<Song>> {
    let content = async_fs::read_to_string(path).await?;
    let songs: Vec<Song> = serde_json::from_str(&content)?;

    if let Some(song) = songs.iter().find(|s| s.artists.is_empty()) {
        return Err(format!("song '{}' has no artists", song.title).into());
    }
    Ok(songs)
}

/// `import` command: creates a playlist from exported songs.
pub async fn import(
    platform: &dyn MusicPlatform,
    input: &Path,
    name: &str,
    public: bool,
) -> Res<()> {
    let songs = read_songs(input).await?;
    info!("Creating playlist '{}' from {} songs", name, songs.len());

    let pb = spinner("Searching songs and building playlist...");
    let created = platform.create_playlist(name, &songs, public).await;
    pb.finish_and_clear();

    let created = created?;
    success!(
        "Playlist '{}' ({}) created with {} tracks",
        created.playlist.title,
        created.playlist.id,
        created.tracks_added
    );

    if !created.unresolved.is_empty() {
        warning!("{} songs could not be found:", created.unresolved.len());
        for song in &created.unresolved {
            warning!("  {} - {}", song.artists.join(", "), song.title);
        }
    }
    Ok(())
}
