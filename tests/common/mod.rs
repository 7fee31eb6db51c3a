#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use playlist_porter::{
    config::PlatformConfig,
    error::ClientError,
    spotify::{
        SpotifyClient,
        auth::{Credentials, Token},
    },
    transport::{Body, HttpRequest, HttpResponse, Transport},
};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

pub const CLIENT_ID: &str = "test-client";
pub const API: &str = "https://api.example.com/v1";
pub const TOKEN_URL: &str = "https://accounts.example.com/api/token";

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Transport answering from a fixed routing table and recording every request.
pub struct FakeTransport {
    routes: Vec<(Method, String, Handler)>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Duration,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn route(
        mut self,
        method: Method,
        url: &str,
        handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Self {
        self.routes.push((method, url.to_string(), Box::new(handler)));
        self
    }

    pub fn reply(self, method: Method, url: &str, status: u16, body: Value) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        let body = body.to_string();
        self.route(method, url, move |_| HttpResponse::new(status, body.clone()))
    }

    /// Every response is held back this long.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url == url)
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self
            .routes
            .iter()
            .find(|(method, url, _)| *method == request.method && *url == request.url)
            .map(|(_, _, handler)| handler(&request))
            .unwrap_or_else(|| {
                HttpResponse::new(
                    StatusCode::NOT_FOUND,
                    json!({"error": {"status": 404, "message": "no route"}}).to_string(),
                )
            });
        Ok(response)
    }
}

pub fn config() -> PlatformConfig {
    let mut config = PlatformConfig::new(CLIENT_ID);
    config.api_url = API.to_string();
    config.token_url = TOKEN_URL.to_string();
    config
}

pub fn credentials(expires_in_secs: i64) -> Credentials {
    Credentials {
        access_token: "access-1".to_string(),
        refresh_token: "refresh-1".to_string(),
        expires_at: Utc::now() + chrono::Duration::seconds(expires_in_secs),
    }
}

/// Client whose token expires `expires_in_secs` from now.
pub fn client(transport: &Arc<FakeTransport>, expires_in_secs: i64) -> SpotifyClient {
    let transport: Arc<dyn Transport> = transport.clone();
    let config = config();
    let token = Token::new(credentials(expires_in_secs), &config, Arc::clone(&transport));
    SpotifyClient::with_token(config, transport, token)
}

pub fn query<'a>(request: &'a HttpRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn form<'a>(request: &'a HttpRequest, key: &str) -> Option<&'a str> {
    match &request.body {
        Body::Form(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str()),
        _ => None,
    }
}

pub fn json_body(request: &HttpRequest) -> Value {
    match &request.body {
        Body::Json(value) => value.clone(),
        _ => Value::Null,
    }
}
