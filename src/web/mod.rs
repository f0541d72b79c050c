//! HTTP adapter for an external rendering layer (map, dashboard, modals).
//!
//! Every mutating route runs one engine action and then pushes a fresh
//! [`StateFrame`] to `/api/events` subscribers.

use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{broadcast, Mutex},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    dashboard::Dashboard,
    engine::{Engine, MonthReport, Receipt},
    error::{ActionError, EngineError},
    world::{LogEntry, Money, Property, PropertyId, PropertyType},
};

const LOG_TAIL: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct StateFrame {
    pub dashboard: Dashboard,
    pub filter: Option<PropertyType>,
    pub properties: Vec<Property>,
    pub log: Vec<LogEntry>,
}

impl StateFrame {
    pub fn capture(engine: &Engine) -> Self {
        Self {
            dashboard: engine.dashboard(),
            filter: engine.type_filter(),
            properties: engine.listings().into_iter().cloned().collect(),
            log: engine.state().log_tail(LOG_TAIL).to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ActionResponse {
    message: String,
    frame: StateFrame,
}

#[derive(Debug, Serialize)]
struct MonthResponse {
    report: MonthReport,
    frame: StateFrame,
}

#[derive(Deserialize)]
struct SettingsRequest {
    cash: Money,
    target_esg: i64,
    target_yield: i64,
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(rename = "type")]
    kind: Option<PropertyType>,
}

#[derive(Deserialize)]
struct FilterRequest {
    #[serde(rename = "type")]
    kind: Option<PropertyType>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        let status = match &value {
            EngineError::Action(ActionError::UnknownProperty(_)) => StatusCode::NOT_FOUND,
            EngineError::Action(_) => StatusCode::CONFLICT,
            EngineError::Save(_) | EngineError::Scenario(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

struct AppState {
    engine: Mutex<Engine>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    fn new(engine: Engine) -> Self {
        let (broadcaster, _) = broadcast::channel::<String>(64);
        Self {
            engine: Mutex::new(engine),
            broadcaster,
        }
    }

    fn publish(&self, frame: &StateFrame) {
        match serde_json::to_string(frame) {
            Ok(payload) => {
                // No subscribers is fine.
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => warn!("failed to encode state frame: {err}"),
        }
    }
}

pub struct WebServerConfig {
    pub engine: Engine,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig { engine, host, port } = config;
    let state = Arc::new(AppState::new(engine));
    let router = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("game API live at http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/properties", get(properties))
        .route("/api/properties/:id", get(property))
        .route("/api/properties/:id/buy", post(buy))
        .route("/api/properties/:id/sell", post(sell))
        .route("/api/properties/:id/renovate", post(renovate))
        .route("/api/new-game", post(new_game))
        .route("/api/next-month", post(next_month))
        .route("/api/settings", post(settings))
        .route("/api/filter", post(filter))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down game API");
}

async fn latest_state(State(app): State<Arc<AppState>>) -> Json<StateFrame> {
    let engine = app.engine.lock().await;
    Json(StateFrame::capture(&engine))
}

/// `?type=` narrows this one response; otherwise the engine's filter applies.
async fn properties(
    State(app): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Property>> {
    let engine = app.engine.lock().await;
    let listed = match query.kind {
        Some(kind) => engine
            .state()
            .properties
            .iter()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect(),
        None => engine.listings().into_iter().cloned().collect(),
    };
    Json(listed)
}

async fn property(
    State(app): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Property>, ApiError> {
    let id = PropertyId::new(id);
    let engine = app.engine.lock().await;
    engine
        .property(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| EngineError::from(ActionError::UnknownProperty(id)).into())
}

type Action = fn(&mut Engine, PropertyId) -> Result<Receipt, EngineError>;

async fn act(
    app: Arc<AppState>,
    id: u32,
    action: Action,
) -> Result<Json<ActionResponse>, ApiError> {
    let mut engine = app.engine.lock().await;
    let receipt = action(&mut engine, PropertyId::new(id))?;
    let frame = StateFrame::capture(&engine);
    app.publish(&frame);
    Ok(Json(ActionResponse {
        message: receipt.message,
        frame,
    }))
}

async fn buy(
    State(app): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<ActionResponse>, ApiError> {
    act(app, id, Engine::buy).await
}

async fn sell(
    State(app): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<ActionResponse>, ApiError> {
    act(app, id, Engine::sell).await
}

async fn renovate(
    State(app): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<ActionResponse>, ApiError> {
    act(app, id, Engine::renovate).await
}

async fn new_game(State(app): State<Arc<AppState>>) -> Result<Json<StateFrame>, ApiError> {
    let mut engine = app.engine.lock().await;
    engine.new_game()?;
    let frame = StateFrame::capture(&engine);
    app.publish(&frame);
    Ok(Json(frame))
}

async fn next_month(State(app): State<Arc<AppState>>) -> Result<Json<MonthResponse>, ApiError> {
    let mut engine = app.engine.lock().await;
    let report = engine.advance_month()?;
    let frame = StateFrame::capture(&engine);
    app.publish(&frame);
    Ok(Json(MonthResponse { report, frame }))
}

async fn settings(
    State(app): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<StateFrame>, ApiError> {
    let mut engine = app.engine.lock().await;
    engine.apply_settings(request.cash, request.target_esg, request.target_yield)?;
    let frame = StateFrame::capture(&engine);
    app.publish(&frame);
    Ok(Json(frame))
}

async fn filter(
    State(app): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> Json<StateFrame> {
    let mut engine = app.engine.lock().await;
    engine.set_type_filter(request.kind);
    Json(StateFrame::capture(&engine))
}

async fn stream_events(
    State(app): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
