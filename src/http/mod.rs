//! HTTP server layer (feature `http-server`).
//!
//! REST API over the class lifecycle service: class CRUD, instance
//! operations, regeneration, and the merged calendar view.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
