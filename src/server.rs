use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::chat::{ChatError, ChatService};
use crate::config::AppConfig;
use crate::db::Database;
use crate::models::{ChatMessage, ChatReply, ChatRequest, CreateSessionRequest, SessionSummary};

#[derive(Clone)]
struct AppState {
    db: Database,
    chat: ChatService,
}

pub fn router(db: Database, chat: ChatService) -> Router {
    let state = AppState { db, chat };

    Router::new()
        .route("/api/sessions/", get(list_sessions).post(create_session))
        .route("/api/sessions/:session_id/messages/", get(session_messages))
        .route("/api/chat/", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: AppConfig, db: Database, chat: ChatService) -> Result<()> {
    let app = router(db, chat);

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn list_sessions(State(state): State<AppState>) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    Ok(Json(state.db.list_sessions().await?))
}

async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionSummary>), ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let session = state
        .db
        .create_session(request.title.as_deref().unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    if !state.db.session_exists(session_id).await? {
        return Err(ApiError::not_found(format!(
            "session not found: {}",
            session_id
        )));
    }
    Ok(Json(state.db.session_messages(session_id).await?))
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state.chat.handle(request).await?;
    Ok(Json(reply))
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        tracing::error!("request failed: {:#}", value);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(value: ChatError) -> Self {
        match value {
            ChatError::SessionNotFound => Self::not_found(value.to_string()),
            ChatError::EmptyMessage => Self {
                status: StatusCode::BAD_REQUEST,
                message: value.to_string(),
            },
            ChatError::Internal(err) => Self::from(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
