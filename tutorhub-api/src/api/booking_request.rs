//! API endpoints for the booking request workflow.
//!
//! Requests move `pending → accepted | rejected` and stop. Accepting
//! materializes both calendar copies and stamps the request's `session_id`
//! in one transaction; rejecting refunds the student in one transaction. A
//! terminal request answers further transition attempts with 409.

use rocket::Route;
use rocket::http::Status;
use rocket::response::{self, status};
use rocket::serde::json::Json;

use crate::api::{ErrorResponse, booking_error_response};
use crate::logged_json::LoggedJson;
use crate::models::{Acceptance, BookingRequest, BookingRequestInput, Rejection};
use crate::orm::DbConn;
use crate::orm::booking_request::{
    accept_booking_request, create_booking_request, get_booking_request,
    get_student_booking_requests, get_tutor_booking_requests, reject_booking_request,
};

/// Create Booking Request endpoint.
///
/// - **URL:** `/api/1/BookingRequests`
/// - **Method:** `POST`
/// - **Purpose:** Files a student's proposal to a tutor
///
/// No tokens move here; the debit happened at the booking action that
/// preceded the request. The date, time, and duration are validated now so
/// an unparseable schedule is rejected before a tutor ever sees it.
///
/// # Request Format
///
/// ```json
/// {
///   "student_id": 7,
///   "student_name": "Alice Student",
///   "student_email": "alice@example.com",
///   "tutor_id": 3,
///   "tutor_name": "Tessa Tutor",
///   "subject": "Physics",
///   "topic": "Kinematics",
///   "session_date": "2026-10-01",
///   "session_time": "10:00",
///   "duration_minutes": 60,
///   "message": "Exam next week",
///   "urgency": "high",
///   "cost": 25
/// }
/// ```
///
/// # Response
///
/// **Success (HTTP 201 Created):** the stored request with status `pending`.
#[post("/1/BookingRequests", data = "<new_request>")]
pub async fn create_booking_request_endpoint(
    db: DbConn,
    new_request: LoggedJson<BookingRequestInput>,
) -> Result<status::Created<Json<BookingRequest>>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        create_booking_request(conn, new_request.into_inner())
            .map(|request| status::Created::new("/").body(Json(request)))
            .map_err(booking_error_response)
    })
    .await
}

/// Get Booking Request endpoint.
///
/// - **URL:** `/api/1/BookingRequests/<request_id>`
/// - **Method:** `GET`
#[get("/1/BookingRequests/<request_id>")]
pub async fn get_booking_request_endpoint(
    db: DbConn,
    request_id: i32,
) -> Result<Json<BookingRequest>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| match get_booking_request(conn, request_id) {
        Ok(Some(request)) => Ok(Json(request)),
        Ok(None) => {
            let err = Json(ErrorResponse {
                error: "booking request not found".to_string(),
            });
            Err(response::status::Custom(Status::NotFound, err))
        }
        Err(e) => {
            eprintln!("Error fetching booking request {}: {:?}", request_id, e);
            let err = Json(ErrorResponse {
                error: "Database error while fetching booking request".to_string(),
            });
            Err(response::status::Custom(Status::InternalServerError, err))
        }
    })
    .await
}

/// Tutor's Booking Requests endpoint.
///
/// - **URL:** `/api/1/BookingRequests/tutor/<tutor_id>`
/// - **Method:** `GET`
/// - **Purpose:** Requests addressed to a tutor, newest first
#[get("/1/BookingRequests/tutor/<tutor_id>")]
pub async fn list_tutor_booking_requests(
    db: DbConn,
    tutor_id: i32,
) -> Result<Json<Vec<BookingRequest>>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        get_tutor_booking_requests(conn, tutor_id).map(Json).map_err(|e| {
            eprintln!("Error listing requests for tutor {}: {:?}", tutor_id, e);
            let err = Json(ErrorResponse {
                error: "Database error while listing booking requests".to_string(),
            });
            response::status::Custom(Status::InternalServerError, err)
        })
    })
    .await
}

/// Student's Booking Requests endpoint.
///
/// - **URL:** `/api/1/BookingRequests/student/<student_id>`
/// - **Method:** `GET`
/// - **Purpose:** Requests created by a student, newest first
#[get("/1/BookingRequests/student/<student_id>")]
pub async fn list_student_booking_requests(
    db: DbConn,
    student_id: i32,
) -> Result<Json<Vec<BookingRequest>>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        get_student_booking_requests(conn, student_id).map(Json).map_err(|e| {
            eprintln!("Error listing requests for student {}: {:?}", student_id, e);
            let err = Json(ErrorResponse {
                error: "Database error while listing booking requests".to_string(),
            });
            response::status::Custom(Status::InternalServerError, err)
        })
    })
    .await
}

/// Accept Booking Request endpoint.
///
/// - **URL:** `/api/1/BookingRequests/<request_id>/accept`
/// - **Method:** `POST`
/// - **Purpose:** Converts a pending request into two mirrored sessions
///
/// One transaction writes the student session, the tutor mirror, both
/// cross-references, and the terminal `accepted` status with the student
/// session's id stamped on the request. There is no partial state: if any
/// step fails, nothing commits.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// { "request_id": 5, "student_session_id": 12, "tutor_session_id": 13 }
/// ```
///
/// **Failure (HTTP 409 Conflict):**
/// ```json
/// { "error": "booking request is already rejected" }
/// ```
#[post("/1/BookingRequests/<request_id>/accept")]
pub async fn accept_booking_request_endpoint(
    db: DbConn,
    request_id: i32,
) -> Result<Json<Acceptance>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        accept_booking_request(conn, request_id)
            .map(Json)
            .map_err(booking_error_response)
    })
    .await
}

/// Reject Booking Request endpoint.
///
/// - **URL:** `/api/1/BookingRequests/<request_id>/reject`
/// - **Method:** `POST`
/// - **Purpose:** Declines a pending request and refunds the student
///
/// The refund and the terminal status commit together; a rejected request
/// never carries a `session_id`.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// { "request_id": 5, "refund_amount": 25, "new_balance": 100 }
/// ```
#[post("/1/BookingRequests/<request_id>/reject")]
pub async fn reject_booking_request_endpoint(
    db: DbConn,
    request_id: i32,
) -> Result<Json<Rejection>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        reject_booking_request(conn, request_id)
            .map(Json)
            .map_err(booking_error_response)
    })
    .await
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![
        create_booking_request_endpoint,
        get_booking_request_endpoint,
        list_tutor_booking_requests,
        list_student_booking_requests,
        accept_booking_request_endpoint,
        reject_booking_request_endpoint
    ]
}
