// libs/consultation-chat-cell/src/router.rs
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_utils::extractor::dual_auth_middleware;

use crate::handlers::*;
use crate::state::ChatState;
use crate::ws::chat_ws_handler;

/// Creates the consultation chat routes. The websocket endpoint carries its
/// credentials in query parameters and authenticates inside the handler;
/// the REST surface goes through the dual-credential middleware.
pub fn consultation_chat_routes(state: ChatState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(chat_health_check))
        .route("/ws", get(chat_ws_handler));

    let protected_routes = Router::new()
        .route("/rooms/{appointment_id}/messages", get(get_room_history))
        .route("/rooms/{appointment_id}/end", post(end_room))
        .route("/rooms/{appointment_id}/attachments", post(upload_attachment))
        .route("/rooms/{appointment_id}", delete(delete_room))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            dual_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
