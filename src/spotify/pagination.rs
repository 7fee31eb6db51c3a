//! Cursor pagination over collection endpoints.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::ClientError,
    transport::{HttpRequest, HttpResponse, Transport},
    types::PageResponse,
};

/// One decoded page: its items and the URL of the next page, if any.
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Walks a cursor-paginated collection to the end.
///
/// Pages are requested strictly one after another. The walk is all or
/// nothing: the first non-success response (or undecodable page) fails the
/// whole call and the items gathered so far are dropped.
pub struct Paginator<'a> {
    transport: &'a dyn Transport,
}

impl<'a> Paginator<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Fetches `first` and then every `next` page, decoding each with `decode`.
    ///
    /// Follow-up requests keep the bearer token and re-send only those query
    /// parameters of `first` that the `next` URL does not carry itself.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Remote`] on the first non-200 page
    /// - whatever `decode` returns for a page it cannot map
    pub async fn collect<T, D>(&self, first: HttpRequest, mut decode: D) -> Result<Vec<T>, ClientError>
    where
        D: FnMut(&HttpResponse) -> Result<Page<T>, ClientError>,
    {
        let mut items = Vec::new();
        let mut request = first.clone();
        let mut pages = 0usize;

        loop {
            let response = self.transport.send(request).await?;
            if response.status != StatusCode::OK {
                return Err(ClientError::remote(response.status, &response.body));
            }

            let page = decode(&response)?;
            pages += 1;
            debug!(page = pages, items = page.items.len(), "fetched page");
            items.extend(page.items);

            match page.next {
                Some(next) => request = first.follow(&next),
                None => break,
            }
        }

        Ok(items)
    }
}

/// Decoder for the common `{"items": [...], "next": ...}` page shape, mapping
/// every raw item through `map`.
pub fn items_page<R, T, F>(mut map: F) -> impl FnMut(&HttpResponse) -> Result<Page<T>, ClientError>
where
    R: DeserializeOwned,
    F: FnMut(R) -> Result<Option<T>, ClientError>,
{
    move |response| {
        let page: PageResponse<R> = response.json()?;
        let mut items = Vec::with_capacity(page.items.len());
        for raw in page.items {
            if let Some(item) = map(raw)? {
                items.push(item);
            }
        }
        Ok(Page {
            items,
            next: page.next,
        })
    }
}
