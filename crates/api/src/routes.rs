use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::Uri;
use axum::middleware;
use axum::response::{Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{debug, info, warn};
use zephyr_domain::ZephyrError;
use zephyr_infra::config::{load_analytics_endpoint, load_settings};
use zephyr_infra::{fetch_epic_stories, AnalyticsSession, AuthenticatedSession};

use crate::error::WebError;
use crate::state::AppState;
use crate::utils::logging::log_requests;

/// Build the front-end router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/callback", get(callback))
        .route("/dashboard", get(dashboard))
        .route("/flowpath", get(flowpath))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Start a fresh session and send the user-agent to the authorization page.
async fn index(State(app): State<AppState>) -> Result<Redirect, WebError> {
    let settings = load_settings(&app.settings().config_path)?;
    let credentials = app.oauth_credentials();
    if credentials.is_empty() {
        return Err(ZephyrError::Configuration(format!(
            "no client credentials named '{}'",
            app.settings().credentials_name
        ))
        .into());
    }

    let mut session =
        AuthenticatedSession::from_settings(&settings, credentials.client_id, app.http(), app.policy())?;
    let authorization_url = session.authorization_url()?;
    app.store_oauth(session.to_plain()?).await;

    info!(host = authorization_url.host_str().unwrap_or_default(), "Redirecting to authorization page");
    Ok(Redirect::to(authorization_url.as_str()))
}

/// Redeem the authorization code carried by the redirect back.
async fn callback(State(app): State<AppState>, uri: Uri) -> Result<Redirect, WebError> {
    let mut session = rehydrate(&app).await?;

    let callback_url = uri.to_string();
    session.exchange_code(&callback_url).await?;
    app.store_oauth(session.to_plain()?).await;

    Ok(Redirect::to("/dashboard"))
}

/// Relay an authenticated services-api request.
async fn dashboard(State(app): State<AppState>) -> Result<Response, WebError> {
    let mut session = rehydrate(&app).await?;
    if !session.is_authorized() {
        debug!("Session has no access token yet");
        return Err(WebError::NoSession);
    }

    let url = session.api_url(&app.settings().dashboard_path)?;
    let result = session.get(url).await;

    // A refresh may have replaced the token even if the request failed.
    app.store_oauth(session.to_plain()?).await;
    let upstream = result?;

    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let body = app.http().bytes(upstream).await?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(response)
}

/// Epic/story view for the configured sprint.
async fn flowpath(State(app): State<AppState>) -> Result<Json<Vec<Value>>, WebError> {
    let credentials = app.analytics_credentials();

    let stored = match app.load_analytics().await {
        Some(plain) => {
            match AnalyticsSession::from_plain(&plain, credentials.clone(), app.http(), app.policy())
            {
                Ok(session) => Some(session),
                Err(err) => {
                    warn!(error = %err, "Discarding unreadable analytics session");
                    None
                }
            }
        }
        None => None,
    };
    let session = match stored {
        Some(session) => session,
        None => {
            let endpoint =
                load_analytics_endpoint(&app.settings().analytics_config_path).map_err(WebError::Analytics)?;
            AnalyticsSession::new(endpoint, credentials, app.http(), app.policy())
        }
    };

    let view = fetch_epic_stories(&session, &app.settings().story_query)
        .await
        .map_err(WebError::Analytics)?;
    app.store_analytics(session.to_plain().map_err(WebError::Analytics)?).await;

    Ok(Json(view.epics()))
}

/// Rebuild the stored OAuth session; an absent or unreadable one means the
/// login has to start over.
async fn rehydrate(app: &AppState) -> Result<AuthenticatedSession, WebError> {
    let plain = app.load_oauth().await.ok_or(WebError::NoSession)?;

    match AuthenticatedSession::from_plain(&plain, app.http(), app.policy()) {
        Ok(session) => Ok(session.with_credentials(app.oauth_credentials())),
        Err(err) => {
            warn!(error = %err, "Discarding unreadable session");
            app.clear_oauth().await;
            Err(WebError::NoSession)
        }
    }
}
