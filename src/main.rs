use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;

use openhouse::api::HttpOpenhouseApi;
use openhouse::web::{self, AppState};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Upstream backend client
    let api = HttpOpenhouseApi::from_env();
    let state = AppState::new(Arc::new(api));

    // 3. Build the application
    let app = web::app(state);

    // 4. Start the server (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("invalid HOST/PORT");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "⚠️  Could not bind {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("invalid fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("could not bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("🚀 Open House server running on http://{}", bound_addr);
    println!("📍 Registration form: http://{}/register", bound_addr);
    println!("📷 Check-in scanner: http://{}/scan", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
