//! HTTP adapters.

pub mod progress_http;

pub use progress_http::{
    ApiError, ErrorResponse, ProgressHttpConfig, ProgressHttpServer, RemoveUserResponse,
    SetCompletionRequest, UserId, USER_ID_HEADER,
};
