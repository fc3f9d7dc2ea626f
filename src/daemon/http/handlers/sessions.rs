//! Session handlers.
//!
//! Creating a session returns its share code. Looking a code up after the
//! retention window answers 410 Gone, distinct from 404 for codes that were
//! never issued or have since been swept.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::super::types::{MediaPayload, SessionResponse};
use super::super::{AppError, SharedState, metrics};
use crate::daemon::error::Error;

/// POST /sessions - Create a completed session from media URLs.
pub(crate) async fn session_create(
    State(state): State<SharedState>,
    payload: Result<Json<MediaPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let Json(payload) = payload?;
    let session = state.sessions.create_async(payload.into_media()).await?;
    metrics::record_session_created("create");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(session, state.public_url.as_deref())),
    ))
}

/// POST /sessions/reserve - Create an empty session awaiting media.
pub(crate) async fn session_reserve(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.sessions.reserve_async().await?;
    metrics::record_session_created("reserve");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(session, state.public_url.as_deref())),
    ))
}

/// GET /sessions/:code - Fetch a session by its share code.
pub(crate) async fn session_get(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let result = state.sessions.get_async(code).await;

    metrics::record_session_lookup(match &result {
        Ok(_) => "found",
        Err(Error::SessionExpired { .. }) => "expired",
        Err(_) => "not_found",
    });

    let session = result?;
    Ok(Json(SessionResponse::new(
        session,
        state.public_url.as_deref(),
    )))
}

/// PATCH /sessions/:code - Attach media to a reserved session.
pub(crate) async fn session_attach(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<MediaPayload>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(payload) = payload?;
    let session = state
        .sessions
        .attach_async(code, payload.into_media())
        .await?;

    Ok(Json(SessionResponse::new(
        session,
        state.public_url.as_deref(),
    )))
}
