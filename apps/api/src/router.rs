use axum::{
    Router,
    routing::get,
};

use consultation_chat_cell::{consultation_chat_routes, ChatState};

pub fn create_router(chat_state: ChatState) -> Router {
    Router::new()
        .route("/", get(|| async { "Consultation API is running!" }))
        .nest("/chat", consultation_chat_routes(chat_state))
}
