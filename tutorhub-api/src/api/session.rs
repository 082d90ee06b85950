//! API endpoints for the booking ledger.
//!
//! Booking writes exactly one calendar row and never touches the balance;
//! the caller debits through the token endpoints first. Cancellation
//! refunds and deletes in one transaction, then makes a best-effort pass at
//! the counterpart's mirror copy.

use chrono::Utc;
use rocket::Route;
use rocket::http::Status;
use rocket::response::{self, status};
use rocket::serde::json::Json;

use crate::api::{ErrorResponse, booking_error_response};
use crate::logged_json::LoggedJson;
use crate::models::{Cancellation, Session, SessionInput};
use crate::orm::DbConn;
use crate::orm::session::{cancel_session, get_user_sessions, insert_session};

/// Book Session endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>/Sessions`
/// - **Method:** `POST`
/// - **Purpose:** Writes one session onto a user's calendar
///
/// The owning user id comes from the URL. `cost` must equal the amount
/// already debited from the paying student; this endpoint performs no
/// balance mutation of its own.
///
/// # Request Format
///
/// ```json
/// {
///   "counterpart_id": 3,
///   "counterpart_name": "Tessa Tutor",
///   "student_email": "alice@example.com",
///   "subject": "Algebra",
///   "start_time": "2026-09-10T14:00:00",
///   "end_time": "2026-09-10T15:00:00",
///   "session_date": "2026-09-10",
///   "cost": 40,
///   "notes": null
/// }
/// ```
///
/// # Response
///
/// **Success (HTTP 201 Created):** the stored session, including its id.
///
/// **Failure (HTTP 400 Bad Request):**
/// ```json
/// { "error": "student email is required" }
/// ```
#[post("/1/Users/<user_id>/Sessions", data = "<new_session>")]
pub async fn book_session(
    db: DbConn,
    user_id: i32,
    new_session: LoggedJson<SessionInput>,
) -> Result<status::Created<Json<Session>>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        insert_session(conn, user_id, &new_session, None)
            .map(|session| status::Created::new("/").body(Json(session)))
            .map_err(booking_error_response)
    })
    .await
}

/// List Sessions endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>/Sessions`
/// - **Method:** `GET`
/// - **Purpose:** Returns a user's calendar, ordered by start time descending
///
/// A scheduled session whose end time has passed is reported with status
/// `completed`; the derivation happens here at read time and is never
/// persisted. Read failures are a 500, not an empty list — an empty
/// calendar and a failed read are different results.
#[get("/1/Users/<user_id>/Sessions")]
pub async fn list_sessions(
    db: DbConn,
    user_id: i32,
) -> Result<Json<Vec<Session>>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        let now = Utc::now().naive_utc();
        get_user_sessions(conn, user_id)
            .map(|rows| {
                Json(
                    rows.into_iter()
                        .map(|mut session| {
                            session.status = session.effective_status(now).to_string();
                            session
                        })
                        .collect(),
                )
            })
            .map_err(|e| {
                eprintln!("Error listing sessions for user {}: {:?}", user_id, e);
                let err = Json(ErrorResponse {
                    error: "Database error while listing sessions".to_string(),
                });
                response::status::Custom(Status::InternalServerError, err)
            })
    })
    .await
}

/// Cancel Session endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>/Sessions/<session_id>`
/// - **Method:** `DELETE`
/// - **Purpose:** Cancels a session and refunds its cost to the owner
///
/// The refund and the delete commit as one transaction. Cleanup of the
/// counterpart's mirror copy is best-effort and reported in
/// `mirror_removed`; a leftover mirror is repaired by the admin tooling,
/// not by retrying the cancel.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// { "session_id": 12, "refund_amount": 40, "new_balance": 100, "mirror_removed": true }
/// ```
///
/// **Failure (HTTP 404 Not Found):** the session does not exist (or was
/// already cancelled).
#[delete("/1/Users/<user_id>/Sessions/<session_id>")]
pub async fn cancel_session_endpoint(
    db: DbConn,
    user_id: i32,
    session_id: i32,
) -> Result<Json<Cancellation>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        cancel_session(conn, user_id, session_id)
            .map(Json)
            .map_err(booking_error_response)
    })
    .await
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![book_session, list_sessions, cancel_session_endpoint]
}
