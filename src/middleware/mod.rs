pub mod auth;
pub mod json;
pub mod response;

pub use auth::{require_role, OptionalUser};
pub use json::JsonBody;
pub use response::{ApiResponse, ApiResult};
