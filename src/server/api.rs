use crate::agent::{ ChatProxy, ProxyError };
use crate::voice::{ VapiClient, VoiceError };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    routing::{ get, post },
    Router,
    extract::State,
    response::{ IntoResponse, Response },
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn };

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ChatProxy>,
    pub voice: Arc<VapiClient>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_body())).into_response()
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_body())).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/chatbot", post(chatbot_handler))
        .route("/api/make-call", post(make_call_handler))
        .route("/api/make-direct-call", post(make_direct_call_handler))
        .route("/api/create-assistant", post(create_assistant_handler))
        .route("/api/create-phone-number", post(create_phone_number_handler))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

pub async fn start_http_server(
    addr: SocketAddr,
    state: AppState,
    tls: Option<(String, String)>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = build_router(state);

    match tls {
        Some((cert_path, key_path)) => {
            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;
            info!("Starting HTTPS server on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
            })?;
            info!("Starting HTTP server on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "chat_configured": state.proxy.is_configured(),
    }))
}

async fn chatbot_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match state.proxy.handle(&body).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn make_call_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match state.voice.make_call(parse_or_default(&body)).await {
        Ok(started) => Json(started).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn make_direct_call_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match state.voice.make_direct_call(parse_or_default(&body)).await {
        Ok(started) => Json(started).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn create_assistant_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match state.voice.create_assistant(parse_or_default(&body)).await {
        Ok(created) => Json(created).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn create_phone_number_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match state.voice.create_phone_number(parse_or_default(&body)).await {
        Ok(created) => Json(created).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Voice routes validate fields themselves, so an unreadable body is treated as empty.
fn parse_or_default<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!("Unreadable voice request body: {}", e);
        T::default()
    })
}
