pub mod config;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use parley_api::auth::{AppState, AppStateInner};
use parley_core::{ConnectionRegistry, Services};
use parley_db::Database;
use parley_gateway::{auth, connection};

use crate::config::Config;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "parley=debug,parley_server=debug,parley_api=debug,\
parley_gateway=debug,parley_core=debug,parley_db=debug,tower_http=debug";

#[derive(Clone)]
struct GatewayState {
    services: Services,
    jwt_secret: String,
    outbound_buffer: usize,
}

#[derive(Debug, Deserialize)]
struct GatewayQuery {
    token: Option<String>,
}

/// Wire the store, registry and services together and build the full router.
pub fn build_app(db: Arc<Database>, config: &Config) -> Router {
    let registry = ConnectionRegistry::new(config.delivery_timeout);
    let services = Services::new(db, registry, config.fanout_scope);

    let app_state: AppState = Arc::new(AppStateInner {
        services: services.clone(),
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
    });

    let gateway_state = GatewayState {
        services,
        jwt_secret: config.jwt_secret.clone(),
        outbound_buffer: config.outbound_buffer,
    };

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(gateway_state);

    Router::new()
        .merge(parley_api::router(app_state))
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(
    State(state): State<GatewayState>,
    Query(query): Query<GatewayQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(user_id) = query
        .token
        .as_deref()
        .and_then(|token| auth::authenticate(&state.jwt_secret, token))
    else {
        warn!("gateway upgrade rejected: missing or invalid token");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.services, user_id, state.outbound_buffer)
    })
}
