//! HTTP API surface.
//!
//! Each submodule owns one resource and exposes a `routes()` collector;
//! everything is mounted together under `/api` by `mount_api_routes`.

pub mod booking_request;
pub mod session;
pub mod status;
pub mod token;
pub mod user;

use rocket::Route;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::error::BookingError;

/// Error response structure for API failures.
#[derive(Serialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps a domain error to its HTTP response. Validation is a client bug
/// (400), missing records are 404, balance and terminal-state conflicts are
/// 409. Database internals stay in the server log; clients get a generic
/// 500 message.
pub(crate) fn booking_error_response(e: BookingError) -> Custom<Json<ErrorResponse>> {
    let http_status = match &e {
        BookingError::Validation(_) => Status::BadRequest,
        BookingError::NotFound(_) => Status::NotFound,
        BookingError::InsufficientBalance { .. } => Status::Conflict,
        BookingError::TerminalStatus { .. } => Status::Conflict,
        BookingError::Database(inner) => {
            eprintln!("Database error: {:?}", inner);
            Status::InternalServerError
        }
    };

    let message = match &e {
        BookingError::Database(_) => "Database error".to_string(),
        other => other.to_string(),
    };

    Custom(http_status, Json(ErrorResponse { error: message }))
}

/// Returns every route in the API, for mounting under `/api`.
pub fn routes() -> Vec<Route> {
    let mut all_routes = Vec::new();
    all_routes.extend(status::routes());
    all_routes.extend(user::routes());
    all_routes.extend(token::routes());
    all_routes.extend(session::routes());
    all_routes.extend(booking_request::routes());
    all_routes
}
