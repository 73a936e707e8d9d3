//! REST API
//!
//! | Method | Path                 | Action                                   |
//! |--------|----------------------|------------------------------------------|
//! | GET    | `/api/state`         | application state (button enablement)    |
//! | GET    | `/api/geofences`     | active geofences                         |
//! | POST   | `/api/geofences`     | register the configured landmarks        |
//! | DELETE | `/api/geofences`     | remove all geofences                     |
//! | POST   | `/api/permission`    | grant location permission                |
//! | DELETE | `/api/permission`    | deny location permission                 |
//! | POST   | `/api/samples`       | queue a position sample                  |
//! | POST   | `/api/transitions`   | deliver a platform geofencing event      |
//! | GET    | `/api/notifications` | most recent notifications                |

use std::net::{Ipv4Addr, SocketAddr};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use geofence_core::notification::invalid_transition_message;
use geofence_core::{Geofence, Notification, PositionSample};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::app_state::AppState;
use crate::error::ServerError;
use crate::notifier::{dispatch_raw, report_event_error};
use crate::{now_ms, Session};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: Option<String>,
    pub state: AppState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Defaults to the time of arrival
    pub timestamp_ms: Option<u64>,
}

/// A geofencing event as reported by the platform: either an error code or
/// a transition code with the triggering geofence ids
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub error_code: Option<i32>,
    #[serde(default)]
    pub transition: i32,
    #[serde(default)]
    pub geofence_ids: Vec<String>,
}

pub fn router(session: Session) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route(
            "/api/geofences",
            get(list_geofences).post(add_geofences).delete(remove_geofences),
        )
        .route(
            "/api/permission",
            post(grant_permission).delete(deny_permission),
        )
        .route("/api/samples", post(post_sample))
        .route("/api/transitions", post(post_transition))
        .route("/api/notifications", get(get_notifications))
        .with_state(session)
}

pub async fn serve(session: Session, subsys: SubsystemHandle) -> Result<(), ServerError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, session.args.port));
    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);

    axum::serve(listener, router(session))
        .with_graceful_shutdown(async move { subsys.on_shutdown_requested().await })
        .await?;
    log::debug!("Web server stopped");
    Ok(())
}

async fn get_state(State(session): State<Session>) -> Json<AppState> {
    Json(session.registration.app_state().await)
}

async fn list_geofences(State(session): State<Session>) -> Json<Vec<Geofence>> {
    Json(session.monitor.lock().await.active_geofences(now_ms()))
}

async fn add_geofences(
    State(session): State<Session>,
) -> Result<Json<MessageResponse>, ServerError> {
    let message = session.registration.add_geofences().await?;
    Ok(Json(MessageResponse {
        message: Some(message),
        state: session.registration.app_state().await,
    }))
}

async fn remove_geofences(
    State(session): State<Session>,
) -> Result<Json<MessageResponse>, ServerError> {
    let message = session.registration.remove_geofences().await?;
    Ok(Json(MessageResponse {
        message: Some(message),
        state: session.registration.app_state().await,
    }))
}

async fn grant_permission(
    State(session): State<Session>,
) -> Result<Json<MessageResponse>, ServerError> {
    let message = session.registration.grant_permission().await?;
    Ok(Json(MessageResponse {
        message,
        state: session.registration.app_state().await,
    }))
}

async fn deny_permission(State(session): State<Session>) -> Json<MessageResponse> {
    let message = session.registration.deny_permission().await;
    Json(MessageResponse {
        message: Some(message),
        state: session.registration.app_state().await,
    })
}

async fn post_sample(
    State(session): State<Session>,
    Json(request): Json<SampleRequest>,
) -> Result<StatusCode, ServerError> {
    let sample = PositionSample::new(
        request.latitude,
        request.longitude,
        request.timestamp_ms.unwrap_or_else(now_ms),
    );
    session.submit_sample(sample).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn post_transition(
    State(session): State<Session>,
    Json(request): Json<TransitionRequest>,
) -> impl IntoResponse {
    if let Some(code) = request.error_code {
        let error = report_event_error(code);
        return (StatusCode::ACCEPTED, Json(serde_json::json!({ "error": error })));
    }

    if dispatch_raw(
        &*session.notifier,
        request.transition,
        request.geofence_ids,
        now_ms(),
    )
    .await
    {
        (StatusCode::ACCEPTED, Json(serde_json::json!({})))
    } else {
        let error = invalid_transition_message(request.transition);
        (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": error })))
    }
}

async fn get_notifications(State(session): State<Session>) -> Json<Vec<Notification>> {
    Json(session.history.recent())
}
