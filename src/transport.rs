//! HTTP transport used by the platform client.
//!
//! The client never talks to `reqwest` directly. Every round trip goes through
//! [`Transport::send`], which takes a fully described [`HttpRequest`] and hands
//! back the status code and raw body. Non-success statuses are *not* errors at
//! this layer; only failures to complete the exchange are.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Form(Vec<(String, String)>),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Body,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            bearer: None,
            body: Body::Empty,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(url)
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = Body::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    /// Same request aimed at `url`.
    ///
    /// Query parameters already present in `url` are not repeated, so a cursor
    /// that echoes the original parameters does not end up with duplicates.
    pub fn follow(&self, url: &str) -> Self {
        let present: Vec<String> = Url::parse(url)
            .map(|u| u.query_pairs().map(|(k, _)| k.into_owned()).collect())
            .unwrap_or_default();

        Self {
            url: url.to_string(),
            query: self
                .query
                .iter()
                .filter(|(k, _)| !present.contains(k))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// One synchronous-looking HTTP round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// Production transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| ClientError::Config(format!("build http client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut builder = self.http.request(request.method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Form(fields) => builder.form(&fields),
            Body::Json(value) => builder.json(&value),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_keeps_parameters_missing_from_cursor() {
        let first = HttpRequest::get("https://api.example.com/v1/playlists/1/tracks")
            .query("fields", "items,next")
            .bearer("token");

        let next = first.follow("https://api.example.com/v1/playlists/1/tracks?offset=100&limit=100");
        assert_eq!(next.query, vec![("fields".to_string(), "items,next".to_string())]);
        assert_eq!(next.bearer.as_deref(), Some("token"));
        assert_eq!(next.method, Method::GET);
    }

    #[test]
    fn test_follow_drops_parameters_the_cursor_already_carries() {
        let first = HttpRequest::get("https://api.example.com/v1/me/playlists").query("limit", "50");

        let next = first.follow("https://api.example.com/v1/me/playlists?offset=50&limit=50");
        assert!(next.query.is_empty());
    }

    #[test]
    fn test_response_json_maps_parse_failure() {
        let response = HttpResponse::new(StatusCode::OK, "not json");
        let err = response.json::<Value>().unwrap_err();
        assert!(matches!(err, ClientError::Mapping(_)));
    }
}
