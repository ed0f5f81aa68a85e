//! In-memory development backend
//!
//! Speaks the same `/start_session` and `/chat` protocol as the production
//! assistant service, answering every message with a canned reply so the
//! client can be exercised without the real service.

use crate::runtime::brand_title;
use crate::transport::{
    ChatRequest, ChatResponse, ErrorResponse, StartSessionRequest, StartSessionResponse,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Turns of history kept per session
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct DevSession {
    pub brand_id: String,
    pub history: Vec<Turn>,
}

impl DevSession {
    fn new(brand_id: String) -> Self {
        Self {
            brand_id,
            history: Vec::new(),
        }
    }

    fn add_turn(&mut self, role: &'static str, content: String) {
        self.history.push(Turn { role, content });
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }
}

/// Shared backend state
#[derive(Clone)]
pub struct AppState {
    brands: Arc<Vec<String>>,
    sessions: Arc<RwLock<HashMap<String, DevSession>>>,
}

impl AppState {
    pub fn new(brands: Vec<String>) -> Self {
        Self {
            brands: Arc::new(brands),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn session(&self, session_id: &str) -> Option<DevSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Create the backend router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/start_session", post(start_session))
        .route("/chat", post(chat))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already-bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}

async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, AppError> {
    if !state.brands.iter().any(|b| *b == req.brand_id) {
        return Err(AppError::BadRequest("Invalid Brand ID".to_string()));
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), DevSession::new(req.brand_id.clone()));

    tracing::info!(brand = %req.brand_id, session_id = %session_id, "Session started");

    Ok(Json(StartSessionResponse {
        session_id,
        message: Some(format!("Welcome to {} support!", brand_title(&req.brand_id))),
    }))
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&req.session_id)
        .ok_or_else(|| AppError::NotFound("Session expired or invalid".to_string()))?;

    let response = canned_reply(&session.brand_id, &req.message);
    session.add_turn("user", req.message);
    session.add_turn("assistant", response.clone());

    tracing::debug!(
        session_id = %req.session_id,
        history = session.history.len(),
        "Answered chat message"
    );

    Ok(Json(ChatResponse {
        response,
        related_products: Vec::new(),
    }))
}

/// Reply exercising every piece of markup the client formats
fn canned_reply(brand_id: &str, message: &str) -> String {
    let brand = brand_title(brand_id);
    let topic = message.trim();
    format!(
        "You asked about **{topic}**. Here is what {brand} has in stock:\n\
         1. [https://{brand_id}.example/products/starter-kit](https://{brand_id}.example/products/starter-kit)\n\
         2. [Gift card](/products/gift-card)\n\
         * Free shipping on orders over **$50**\n\
         * Ask me about ingredients or availability"
    )
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        tracing::warn!(status = %status, error = %message, "Request rejected");
        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
