use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{Res, api, types::PendingAuthorization};

/// Binds the callback server. The returned future serves until dropped.
pub async fn start_api_server(
    addr: &str,
    state: Arc<Mutex<Option<PendingAuthorization>>>,
) -> Res<impl Future<Output = std::io::Result<()>> + use<>> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)));

    let addr = SocketAddr::from_str(addr)
        .map_err(|e| format!("Failed to parse server address '{addr}': {e}"))?;
    let listener = TcpListener::bind(&addr).await?;

    Ok(axum::serve(listener, app).into_future())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_future_outlives_address() {
        let server = {
            let addr = String::from("127.0.0.1:0");
            start_api_server(&addr, Arc::new(Mutex::new(None))).await.unwrap()
        };

        let handle = tokio::spawn(server);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected() {
        let result = start_api_server("not an address", Arc::new(Mutex::new(None))).await;
        assert!(result.is_err());
    }
}
