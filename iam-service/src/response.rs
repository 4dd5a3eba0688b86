//! Success envelope (§6): `{"success": true, "data": ..., "error": null}`,
//! the counterpart to `iam_core::error::AppError`'s `IntoResponse` impl
//! which produces the same shape with `success: false` on failure.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub error: Option<()>,
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn ok<T: Serialize>(data: T) -> Envelope<T> {
    Envelope { success: true, data, error: None }
}
