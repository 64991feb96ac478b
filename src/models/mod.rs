//! Models Module
//!
//! Request and response DTOs for the cache server API.

mod requests;
mod responses;

pub use requests::{InvalidatePatternRequest, SetRequest};
pub use responses::{
    ClearResponse, DeleteResponse, ErrorResponse, GetResponse, HealthResponse,
    InvalidatePatternResponse, SetResponse,
};
