use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use openhouse::api::{ApiError, NewRegistrant, OpenhouseApi, PhoneLookup, QrLookup};
use openhouse::web::{app, AppState};

#[derive(Default)]
struct FakeApi {
    existing: Option<String>,
    registered: Mutex<Vec<NewRegistrant>>,
}

#[async_trait]
impl OpenhouseApi for FakeApi {
    async fn check_phone(&self, _phone: &str) -> Result<PhoneLookup, ApiError> {
        Ok(PhoneLookup {
            exists: self.existing.is_some(),
            name: self.existing.clone(),
        })
    }

    async fn register(&self, registrant: &NewRegistrant) -> Result<(), ApiError> {
        self.registered.lock().unwrap().push(registrant.clone());
        Ok(())
    }

    async fn check_qrcode(&self, _code: &str) -> Result<QrLookup, ApiError> {
        Ok(QrLookup {
            exists: false,
            name: None,
            phone: None,
        })
    }

    async fn update_log(&self, _phone: &str, _log: &str) -> Result<bool, ApiError> {
        Ok(true)
    }
}

fn budi_form() -> &'static str {
    "name=Budi&phone=081234567890&email=budi%40x.com&gender=Laki-laki&school=SMAN+4+Padang"
}

async fn post_form(router: axum::Router, body: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn root_redirects_to_the_registration_form() {
    let router = app(AppState::new(Arc::new(FakeApi::default())));
    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/register");
}

#[tokio::test]
async fn successful_registration_renders_the_confirmation_card() {
    let api = Arc::new(FakeApi::default());
    let router = app(AppState::new(api.clone()));

    let (status, body) = post_form(router, budi_form()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Detail Pendaftaran"));
    assert!(body.contains("Budi"));
    assert!(body.contains("SMAN 4 Padang"));
    // The embedded card URL carries the derived attendance code.
    assert!(body.contains("code=12562469135780"));

    let registered = api.registered.lock().unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].phone, "6281234567890");
    assert_eq!(registered[0].qrcode, "12562469135780");
}

#[tokio::test]
async fn duplicate_phone_shows_the_warning_and_writes_nothing() {
    let api = Arc::new(FakeApi {
        existing: Some("Budi".to_string()),
        ..FakeApi::default()
    });
    let router = app(AppState::new(api.clone()));

    let (status, body) = post_form(router, budi_form()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Anda sudah terdaftar dengan nama Budi"));
    assert!(api.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_submission_re_renders_with_field_messages() {
    let api = Arc::new(FakeApi::default());
    let router = app(AppState::new(api.clone()));

    let (status, body) = post_form(router, "name=&phone=&email=&gender=&school=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Nama harus diisi"));
    assert!(body.contains("Nomor HP harus diisi"));
    assert!(body.contains("Email harus diisi"));
    assert!(body.contains("Jenis kelamin harus dipilih"));
    assert!(body.contains("Asal sekolah harus dipilih"));
    assert!(api.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn idcard_endpoint_serves_a_jpeg_attachment() {
    let router = app(AppState::new(Arc::new(FakeApi::default())));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/register/idcard.jpg?name=Budi&school=SMAN%204%20Padang&code=12562469135780&download=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["Content-Type"], "image/jpeg");
    assert_eq!(
        response.headers()["Content-Disposition"],
        "attachment; filename=\"Budi-idcard.jpg\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // JPEG magic bytes.
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn scan_page_opens_and_unknown_sessions_are_rejected() {
    let router = app(AppState::new(Arc::new(FakeApi::default())));

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/scan").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/scan/{}/frame", uuid::Uuid::new_v4()))
                .body(Body::from("frame"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
