use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::PendingAuthorization;

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PendingAuthorization>>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pending) = state.as_mut() else {
        return Html("<h4>No authorization in progress.</h4>");
    };

    if params.get("state") != Some(&pending.state) {
        pending.outcome = Some(Err("state mismatch in authorization callback".to_string()));
        return Html("<h4>Login failed.</h4>");
    }

    if let Some(error) = params.get("error") {
        pending.outcome = Some(Err(error.clone()));
        return Html("<h4>Login failed.</h4>");
    }

    match params.get("code") {
        Some(code) => {
            pending.outcome = Some(Ok(code.clone()));
            Html("<h2>Authentication successful.</h2><p>Close browser window.</p>")
        }
        None => {
            pending.outcome = Some(Err("callback carried no authorization code".to_string()));
            Html("<h4>Missing authorization code.</h4>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(state: &str) -> Arc<Mutex<Option<PendingAuthorization>>> {
        Arc::new(Mutex::new(Some(PendingAuthorization {
            state: state.to_string(),
            outcome: None,
        })))
    }

    fn params(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_code_is_stored_when_state_matches() {
        let state = shared("s1");
        callback(params(&[("code", "abc"), ("state", "s1")]), Extension(Arc::clone(&state))).await;

        let outcome = state.lock().await.as_ref().unwrap().outcome.clone();
        assert_eq!(outcome, Some(Ok("abc".to_string())));
    }

    #[tokio::test]
    async fn test_state_mismatch_is_rejected() {
        let state = shared("s1");
        callback(params(&[("code", "abc"), ("state", "forged")]), Extension(Arc::clone(&state))).await;

        let outcome = state.lock().await.as_ref().unwrap().outcome.clone();
        assert!(matches!(outcome, Some(Err(_))));
    }

    #[tokio::test]
    async fn test_denied_access_is_reported() {
        let state = shared("s1");
        callback(params(&[("error", "access_denied"), ("state", "s1")]), Extension(Arc::clone(&state))).await;

        let outcome = state.lock().await.as_ref().unwrap().outcome.clone();
        assert_eq!(outcome, Some(Err("access_denied".to_string())));
    }
}
