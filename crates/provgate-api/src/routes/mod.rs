//! # Route Modules
//!
//! Each module defines an Axum router for one surface. They are merged in
//! [`crate::app`].

pub mod home;
pub mod upload;

use axum::http::StatusCode;

/// 404 with the canonical reason phrase.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
