//! HTTP surface used by the gateway bridge.
//!
//! Chat events arrive here and are handed to the command handlers; slow work runs in
//! spawned tasks so the bridge is answered immediately.

mod components;
mod interactions;
mod messages;
mod tags;

pub use components::*;
pub use interactions::*;
pub use messages::*;
pub use tags::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            status: StatusCode::OK,
        }
    }

    /// Envelope for work that continues after the response.
    pub fn accepted(data: T) -> Self {
        Self {
            status: StatusCode::ACCEPTED,
            ..Self::new(data)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Acknowledgement for events handled in the background.
#[derive(Debug, Serialize)]
pub struct Accepted {
    pub accepted: bool,
}

pub fn accepted() -> ApiResult<Accepted> {
    Ok(ApiResponse::accepted(Accepted { accepted: true }))
}
