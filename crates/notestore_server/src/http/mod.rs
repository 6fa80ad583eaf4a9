//! HTTP front door: routing, access logging and CORS for `/api/*`.

pub mod error;
pub mod extract;
pub mod handlers;

use crate::NoteStore;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<NoteStore>,
    pub trust_proxy: bool,
}

impl AppState {
    pub fn new(store: NoteStore, trust_proxy: bool) -> Self {
        Self {
            store: Arc::new(store),
            trust_proxy,
        }
    }
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::status_handler))
        .route(
            "/notes",
            get(handlers::list_notes_handler).post(handlers::create_note_handler),
        )
        .route(
            "/notes/:id",
            get(handlers::get_note_handler)
                .put(handlers::update_note_handler)
                .delete(handlers::delete_note_handler),
        )
        .layer(cors);

    Router::new()
        .route("/", get(handlers::status_handler))
        .nest("/api", api)
        .fallback(handlers::not_found_handler)
        .layer(middleware::from_fn_with_state(state.clone(), access_log))
        .with_state(state)
}

async fn access_log(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client = client_address(&req, state.trust_proxy);

    let response = next.run(req).await;
    info!(
        "event=http_request module=http method={} path={} status={} client={} duration_ms={}",
        method,
        path,
        response.status().as_u16(),
        client,
        started_at.elapsed().as_millis()
    );
    response
}

fn client_address(req: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = first_forwarded_hop(req.headers()) {
            return forwarded;
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn first_forwarded_hop(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|hop| !hop.is_empty())
        .map(str::to_string)
}
