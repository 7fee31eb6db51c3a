//! Track search and bulk song resolution.

use std::future::Future;

use futures::{StreamExt, stream};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::{
    error::ClientError,
    transport::{HttpRequest, Transport},
    types::{PlatformId, SearchResponse, Song},
};

/// Looks a single song up and returns the first candidate's id, if any.
///
/// An empty result set is `Ok(None)`; only a failed request is an error.
pub async fn search_track(
    transport: &dyn Transport,
    api_url: &str,
    bearer: &str,
    song: &Song,
) -> Result<Option<PlatformId>, ClientError> {
    let request = HttpRequest::get(format!("{api_url}/search"))
        .query("q", song.search_query())
        .query("type", "track")
        .bearer(bearer);

    let response = transport.send(request).await?;
    if response.status != StatusCode::OK {
        return Err(ClientError::remote(response.status, &response.body));
    }

    let result: SearchResponse = response.json()?;
    Ok(result
        .tracks
        .items
        .into_iter()
        .next()
        .map(|track| PlatformId::new(track.id)))
}

/// Result of resolving a batch of songs.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Ids of the songs that were found, in input order.
    pub ids: Vec<PlatformId>,
    /// Songs with no usable candidate, or whose lookup failed.
    pub unresolved: Vec<Song>,
}

/// Resolves every song with at most `concurrency` lookups in flight.
///
/// A failed lookup leaves its song unresolved and does not disturb the
/// others, except for an authentication failure, which aborts the whole
/// resolution.
pub async fn resolve<'a, F, Fut>(
    songs: &'a [Song],
    concurrency: usize,
    search: F,
) -> Result<Resolution, ClientError>
where
    F: Fn(&'a Song) -> Fut,
    Fut: Future<Output = Result<Option<PlatformId>, ClientError>>,
{
    // futures are lazy: nothing is sent until the stream polls them
    let pending: Vec<_> = songs
        .iter()
        .map(|song| lookup(song, search(song)))
        .collect();
    let mut lookups = stream::iter(pending).buffered(concurrency.max(1));

    let mut resolution = Resolution::default();
    while let Some((song, result)) = lookups.next().await {
        match result {
            Ok(Some(id)) => resolution.ids.push(id),
            Ok(None) => {
                debug!(title = %song.title, "no candidate found");
                resolution.unresolved.push(song.clone());
            }
            Err(e) if e.is_auth() => return Err(e),
            Err(e) => {
                warn!(title = %song.title, error = %e, "search failed");
                resolution.unresolved.push(song.clone());
            }
        }
    }

    debug!(
        found = resolution.ids.len(),
        unresolved = resolution.unresolved.len(),
        "resolution finished"
    );
    Ok(resolution)
}

async fn lookup<Fut>(song: &Song, search: Fut) -> (&Song, Result<Option<PlatformId>, ClientError>)
where
    Fut: Future<Output = Result<Option<PlatformId>, ClientError>>,
{
    (song, search.await)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    use super::*;

    fn songs(n: usize) -> Vec<Song> {
        (0..n)
            .map(|i| Song::new(format!("song-{i}"), ["artist"]))
            .collect()
    }

    #[tokio::test]
    async fn test_keeps_input_order_and_collects_misses() {
        let input = songs(5);

        let resolution = resolve(&input, 3, |song| async move {
            let n: u64 = song.title.trim_start_matches("song-").parse().unwrap();
            // later songs finish first
            tokio::time::sleep(Duration::from_millis(10 * (5 - n))).await;
            Ok((n != 2).then(|| PlatformId::new(format!("id-{n}"))))
        })
        .await
        .unwrap();

        let ids: Vec<&str> = resolution.ids.iter().map(PlatformId::as_str).collect();
        assert_eq!(ids, vec!["id-0", "id-1", "id-3", "id-4"]);
        assert_eq!(resolution.unresolved, vec![input[2].clone()]);
    }

    #[tokio::test]
    async fn test_remote_failure_only_drops_that_song() {
        let input = songs(3);

        let resolution = resolve(&input, 2, |song| async move {
            if song.title == "song-1" {
                Err(ClientError::remote(StatusCode::BAD_GATEWAY, "Bad Gateway"))
            } else {
                Ok(Some(PlatformId::new(song.title.clone())))
            }
        })
        .await
        .unwrap();

        assert_eq!(resolution.ids.len(), 2);
        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(resolution.unresolved[0].title, "song-1");
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_resolution() {
        let input = songs(4);

        let err = resolve(&input, 2, |song| async move {
            if song.title == "song-0" {
                Err(ClientError::Auth {
                    status: StatusCode::BAD_REQUEST,
                    message: "invalid_grant".to_string(),
                })
            } else {
                Ok(None)
            }
        })
        .await
        .unwrap_err();

        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let input = songs(20);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        resolve(&input, 4, |_song| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(None)
            }
        })
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert!(peak.load(Ordering::SeqCst) > 1);
    }
}
