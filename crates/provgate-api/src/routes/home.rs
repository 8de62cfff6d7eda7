//! `GET /` static greeting.

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub const GREETING: &str = "Welcome to the home page!";

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home).fallback(super::not_found))
}

async fn home() -> &'static str {
    GREETING
}
