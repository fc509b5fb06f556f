pub mod auth;
pub mod chats;
pub mod error;
pub mod messages;
pub mod middleware;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use auth::AppState;

/// Every HTTP route: public account endpoints plus the bearer-protected
/// chat and message endpoints.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/chats", get(chats::list_chats))
        .route("/chats/create", post(chats::create_chat))
        .route("/chats/update", post(chats::update_chat))
        .route("/messages/send", post(messages::send_message))
        .route("/messages/edit", put(messages::edit_message))
        .route("/messages/delete", delete(messages::delete_message))
        .route("/messages/receiving/{chat_id}", get(messages::get_messages))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
