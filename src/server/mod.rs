//! HTTP surface for the orchestration layer.
//!
//! # Endpoints
//!
//! - `GET  /health`         — Liveness plus component status
//! - `POST /convert`        — Two-stage tone conversion
//! - `POST /rag/ask`        — Single grounded answer
//! - `POST /rag/ask-styles` — Grounded answer in three style variants
//! - `POST /feedback`       — Feedback adaptation

pub mod routes;

pub use routes::{app_router, AppState};
