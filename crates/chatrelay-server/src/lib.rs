//! chatrelay server: HTTP surface, sessions and the reply pipeline.

pub mod error;
pub mod responder;
pub mod routes;
pub mod session;
pub mod state;

pub use error::AppError;
pub use responder::Responder;
pub use routes::build_router;
pub use session::SessionStore;
pub use state::AppState;
