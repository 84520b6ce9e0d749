// libs/consultation-chat-cell/src/lib.rs
//! # Consultation Chat Cell
//!
//! Room-scoped, bidirectional chat between the two parties of an
//! appointment: a patient and a clinician. Provides a websocket gateway for
//! live messaging and typing presence, a persisted message log, a
//! file-attachment upload path that re-injects into the live broadcast, and
//! the open/closed/deleted room lifecycle.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------+
//! |               Consultation Chat Cell                |
//! +-----------------------------------------------------+
//! |  handlers.rs    |  HTTP endpoint handlers           |
//! |  router.rs      |  Route definitions                |
//! |  ws.rs          |  WebSocket gateway                |
//! |  models.rs      |  Data structures & protocol       |
//! |  state.rs       |  Shared cell state                |
//! |  services/      |  Business logic layer             |
//! |    store.rs     |  Append-only message log          |
//! |    rooms.rs     |  Room directory                   |
//! |    lifecycle.rs |  Open/closed/deleted transitions  |
//! |    guard.rs     |  Room-membership authorization    |
//! |    hub.rs       |  Per-room broadcast fan-out       |
//! |    presence.rs  |  Live-connection registry         |
//! |    media.rs     |  Attachment blob storage          |
//! +-----------------------------------------------------+
//! ```
//!
//! ## Endpoints
//!
//! - `GET /chat/rooms/{appointment_id}/messages` - Room history
//! - `POST /chat/rooms/{appointment_id}/end` - Close the room (clinician)
//! - `POST /chat/rooms/{appointment_id}/attachments` - Upload a file message
//! - `DELETE /chat/rooms/{appointment_id}` - Delete a closed room (patient)
//! - `GET /chat/ws` - WebSocket gateway (`join`, `send`, `typing`,
//!   `stop-typing`)
//! - `GET /chat/health` - Health check

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod ws;

pub use error::ChatError;
pub use models::*;
pub use router::consultation_chat_routes;
pub use services::*;
pub use state::ChatState;
