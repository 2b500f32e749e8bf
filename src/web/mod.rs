//! HTTP surface: the best-stories endpoint plus operational endpoints.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod status;
pub mod stories;

pub use routes::*;
