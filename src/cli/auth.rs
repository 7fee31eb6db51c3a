use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    Res,
    config::PlatformConfig,
    info,
    server::start_api_server,
    spotify::{
        SpotifyClient,
        auth::{AuthorizationCode, Pkce, authorize_url},
    },
    success,
    transport::ReqwestTransport,
    types::PendingAuthorization,
    utils, warning,
};

/// How long the user has to finish granting access in the browser.
const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(120);

/// `auth` command: runs the authorization flow and reports who logged in.
pub async fn auth(config: &PlatformConfig) -> Res<()> {
    let client = connect(config).await?;
    let user = client.current_user_id().await?;
    success!("Authenticated as {}", user);
    Ok(())
}

/// Runs the PKCE authorization flow and returns a connected client.
///
/// Starts the local callback server, sends the user to the authorize page
/// and exchanges the returned code for a token.
pub async fn connect(config: &PlatformConfig) -> Res<SpotifyClient> {
    let pkce = Pkce::generate();
    let state = utils::generate_state();

    let shared_state = Arc::new(Mutex::new(Some(PendingAuthorization {
        state: state.clone(),
        outcome: None,
    })));

    let server = start_api_server(&config.server_addr, Arc::clone(&shared_state)).await?;
    let server = tokio::spawn(server);

    let auth_url = authorize_url(config, &pkce.challenge, &state)?;
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        );
    }
    info!("Waiting for authorization in the browser...");

    let outcome = wait_for_code(shared_state).await;
    server.abort();

    let code = match outcome {
        Some(Ok(code)) => code,
        Some(Err(e)) => return Err(format!("Authorization failed: {e}").into()),
        None => return Err("Authorization timed out.".into()),
    };

    let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
    let grant = AuthorizationCode {
        code,
        verifier: pkce.verifier,
        redirect_uri: config.redirect_uri.clone(),
    };
    Ok(SpotifyClient::connect(config.clone(), transport, &grant).await?)
}

/// Polls the shared state until the callback recorded an outcome.
async fn wait_for_code(
    shared_state: Arc<Mutex<Option<PendingAuthorization>>>,
) -> Option<Result<String, String>> {
    let start = tokio::time::Instant::now();

    while start.elapsed() < AUTHORIZATION_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(outcome) = lock.as_ref().and_then(|p| p.outcome.clone()) {
            return Some(outcome);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    None
}
