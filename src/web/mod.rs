pub mod routes;

use std::sync::Arc;

use axum::{
    response::Redirect,
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::OpenhouseApi;
use crate::services::checkin::ScannerRegistry;

/// Shared handler state: the upstream backend client behind its trait (so
/// tests can swap in a fake) and the live scanner sessions.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn OpenhouseApi>,
    pub scanner: Arc<ScannerRegistry>,
}

impl AppState {
    pub fn new(api: Arc<dyn OpenhouseApi>) -> Self {
        Self {
            api,
            scanner: Arc::new(ScannerRegistry::new()),
        }
    }
}

/// Build the whole application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Registration screen
        .route("/", get(|| async { Redirect::to("/register") }))
        .route(
            "/register",
            get(routes::register::register_page).post(routes::register::register_submit),
        )
        .route("/register/idcard.jpg", get(routes::register::idcard_jpeg))
        // Check-in screen
        .route("/scan", get(routes::scan::scan_page))
        .route("/scan/:session_id/frame", post(routes::scan::scan_frame))
        .route("/scan/:session_id/dismiss", post(routes::scan::scan_dismiss))
        .route("/scan/:session_id/close", post(routes::scan::scan_close))
        // Static files
        .nest_service(
            "/assets",
            get_service(ServeDir::new("assets")).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        // State
        .with_state(state)
}
