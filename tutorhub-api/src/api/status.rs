//! API version 1 - Status endpoints
//!
//! This module provides health check and status endpoints for monitoring
//! the application's operational state and availability.

use rocket::{Route, serde::json::Json};
use serde::Serialize;
use ts_rs::TS;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize, TS)]
#[ts(export)]
pub struct HealthStatus {
    status: &'static str,
    version: &'static str,
    built: &'static str,
    git_commit: Option<&'static str>,
}

/// Health Status endpoint.
///
/// - **URL:** `/api/1/status`
/// - **Method:** `GET`
/// - **Purpose:** Returns the health status of the application
///
/// This endpoint provides a simple health check that indicates whether
/// the application is running and responsive. It always returns a "running"
/// status if the application is operational.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "status": "running",
///   "version": "0.2.1",
///   "built": "Thu, 27 Aug 2026 09:14:02 +0000",
///   "git_commit": "f3d1a9c2b8e7d4a1c6b5e2f9d8c7a4b1e0f3d2c9"
/// }
/// ```
///
/// # Returns
/// A JSON response containing the application's health status
#[rocket::get("/1/status")]
pub fn health_status() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        built: built_info::BUILT_TIME_UTC,
        git_commit: built_info::GIT_COMMIT_HASH,
    })
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![health_status]
}
