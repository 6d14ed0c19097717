//! HTTP API for the chat frontend.
//!
//! Every response, success or failure, uses the JSON envelope defined in
//! [`response`].

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use response::{ApiResponse, RequestPath};
pub use routes::create_router;
pub use state::AppState;
