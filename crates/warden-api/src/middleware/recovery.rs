// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Panic recovery middleware.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::response::ErrorResponse;

/// Handler signature for converting a caught panic into a response.
pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Creates the panic recovery layer.
///
/// A panicking handler takes down its own request with a 500 instead of the
/// worker. The panic payload is logged in full; the response body carries no
/// detail beyond the generic message.
pub fn recovery_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");

    let body = ErrorResponse::new("INTERNAL_ERROR", "Internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

// =============================================================================
// Tests
// =============================================================================
