use askama::Template;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use uuid::Uuid;

use crate::services::checkin::ScanView;
use crate::web::AppState;

#[derive(Template)]
#[template(path = "scan.html")]
pub struct ScanTemplate {
    pub session_id: String,
}

/// Open the scanner screen. Each page load gets its own session; the page
/// announces teardown through the close endpoint.
pub async fn scan_page(State(state): State<AppState>) -> Html<String> {
    let session_id = state.scanner.open().await;
    let template = ScanTemplate {
        session_id: session_id.to_string(),
    };
    Html(template.render().unwrap())
}

/// One captured camera frame, raw image bytes in the body.
pub async fn scan_frame(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ScanView>, StatusCode> {
    let session = state
        .scanner
        .get(session_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let mut session = session.lock().await;
    Ok(Json(session.process_frame(state.api.as_ref(), &body).await))
}

pub async fn scan_dismiss(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ScanView>, StatusCode> {
    let session = state
        .scanner
        .get(session_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let mut session = session.lock().await;
    Ok(Json(session.dismiss()))
}

pub async fn scan_close(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> StatusCode {
    if state.scanner.close(session_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
