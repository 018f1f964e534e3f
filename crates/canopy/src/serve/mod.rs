//! HTTP server for the viewer.
//!
//! Routes:
//! - `GET /api/parse/{*path}?<rule>` — raw syntax tree for a language file
//! - `GET /api/tree/{*path}?<rule>` — transformed display tree
//! - `GET /api/files` — recursive listing of the language root
//! - `GET /events` — SSE stream of viewer events
//! - anything else — static assets for the bundled viewer
//!
//! API responses are CORS-open so a viewer served from elsewhere (or a
//! hand-rolled curl session) can talk to the endpoints directly.

use axum::extract::{Path, RawQuery, State};
use axum::http::{Uri, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::Config;
use crate::events::EventChannel;
use crate::files::list_files;
use crate::parser::{ParseOutcome, ParseRequest, ParserBridge, Source};
use crate::syntax::SyntaxNode;
use crate::transform::transform;

pub mod statics;

/// Shared server state.
pub struct AppState {
    pub config: Config,
    pub bridge: ParserBridge,
    pub events: Arc<EventChannel>,
}

/// Bind and run until shutdown. Port 0 asks the OS for a free port; the
/// actual address is logged once the listener is open.
pub async fn run_server(state: Arc<AppState>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("started viewer on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/parse/{*path}", get(parse_syntax))
        .route("/api/tree/{*path}", get(parse_tree))
        .route("/api/files", get(file_list))
        .route("/events", get(event_stream))
        .fallback(get(static_assets))
        .with_state(state)
}

/// Run one parse for a root-relative file. Every failure degrades to `None`
/// after logging; the endpoints answer `{}` so the viewer keeps running.
async fn run_parse(state: &AppState, file: &str, rule: Option<String>) -> Option<SyntaxNode> {
    let request = ParseRequest {
        source: Source::Path(state.config.root.join(file)),
        entry: rule
            .filter(|r| !r.is_empty())
            .or_else(|| state.config.entry.clone()),
    };

    match state.bridge.parse(&request).await {
        Ok(ParseOutcome::Tree(node)) => Some(node),
        Ok(ParseOutcome::Failure { .. }) => None,
        Err(e) => {
            log::error!("parse of {file} failed: {e}");
            None
        }
    }
}

async fn parse_syntax(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(rule): RawQuery,
) -> Response {
    let value = match run_parse(&state, &path, rule).await {
        Some(node) => serde_json::to_value(node).unwrap_or_else(|_| serde_json::json!({})),
        None => serde_json::json!({}),
    };
    cors_json(value)
}

async fn parse_tree(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(rule): RawQuery,
) -> Response {
    let value = match run_parse(&state, &path, rule).await {
        Some(node) => {
            serde_json::to_value(transform(&node, None)).unwrap_or_else(|_| serde_json::json!({}))
        }
        None => serde_json::json!({}),
    };
    cors_json(value)
}

async fn file_list(State(state): State<Arc<AppState>>) -> Response {
    let files = list_files(&state.config.root);
    cors_json(serde_json::json!(files))
}

async fn event_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let frames = UnboundedReceiverStream::new(state.events.subscribe());
    let stream = frames.map(|frame| Ok(Event::default().data(frame)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn static_assets(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    statics::serve_file(&state.config.assets, path).await
}

fn cors_json(value: serde_json::Value) -> Response {
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(value),
    )
        .into_response()
}
