pub mod guard;
pub mod hub;
pub mod lifecycle;
pub mod media;
pub mod presence;
pub mod rooms;
pub mod store;

pub use guard::*;
pub use hub::*;
pub use lifecycle::*;
pub use media::*;
pub use presence::*;
pub use rooms::*;
pub use store::*;
