pub mod auth;
pub mod json;
pub mod response;

pub use auth::authenticate;
pub use json::JsonBody;
pub use response::{ApiResponse, ApiResult};
