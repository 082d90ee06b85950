//! API endpoints for managing users.
//!
//! This module provides HTTP endpoints for creating, fetching, and listing
//! the students and tutors of the marketplace.

use rocket::Route;
use rocket::http::Status;
use rocket::response::{self, status};
use rocket::serde::json::Json;

use crate::api::{ErrorResponse, booking_error_response};
use crate::logged_json::LoggedJson;
use crate::models::{User, UserInput};
use crate::orm::DbConn;
use crate::orm::user::{get_user, get_user_by_email, insert_user, list_all_users};

/// Create User endpoint.
///
/// - **URL:** `/api/1/Users`
/// - **Method:** `POST`
/// - **Purpose:** Creates a new student or tutor
///
/// # Request Format
///
/// ```json
/// {
///   "name": "Dana Lee",
///   "email": "dana@example.com",
///   "role": "student",
///   "token_balance": 100
/// }
/// ```
///
/// # Response
///
/// **Success (HTTP 201 Created):** the created user record.
///
/// **Failure (HTTP 400 Bad Request):**
/// ```json
/// { "error": "role must be 'student' or 'tutor', got 'admin'" }
/// ```
///
/// **Failure (HTTP 409 Conflict):**
/// ```json
/// { "error": "User with this email already exists" }
/// ```
#[post("/1/Users", data = "<new_user>")]
pub async fn create_user(
    db: DbConn,
    new_user: LoggedJson<UserInput>,
) -> Result<status::Created<Json<User>>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        // Check for an existing account first so the caller gets a 409
        // instead of a raw unique-constraint failure.
        match get_user_by_email(conn, &new_user.email) {
            Ok(Some(_existing)) => {
                let err = Json(ErrorResponse {
                    error: "User with this email already exists".to_string(),
                });
                return Err(response::status::Custom(Status::Conflict, err));
            }
            Ok(None) => {}
            Err(e) => {
                eprintln!("Error checking for existing user: {:?}", e);
                let err = Json(ErrorResponse {
                    error: "Database error while checking for existing user".to_string(),
                });
                return Err(response::status::Custom(Status::InternalServerError, err));
            }
        }

        insert_user(conn, new_user.into_inner())
            .map(|user| status::Created::new("/").body(Json(user)))
            .map_err(booking_error_response)
    })
    .await
}

/// List Users endpoint.
///
/// - **URL:** `/api/1/Users`
/// - **Method:** `GET`
/// - **Purpose:** Retrieves all users, ordered by ID ascending
#[get("/1/Users")]
pub async fn list_users(
    db: DbConn,
) -> Result<Json<Vec<User>>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(|conn| {
        list_all_users(conn).map(Json).map_err(|e| {
            eprintln!("Error listing users: {:?}", e);
            let err = Json(ErrorResponse {
                error: "Database error while listing users".to_string(),
            });
            response::status::Custom(Status::InternalServerError, err)
        })
    })
    .await
}

/// Get User endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>`
/// - **Method:** `GET`
/// - **Purpose:** Retrieves a single user by ID
#[get("/1/Users/<user_id>")]
pub async fn get_user_endpoint(
    db: DbConn,
    user_id: i32,
) -> Result<Json<User>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| match get_user(conn, user_id) {
        Ok(Some(user)) => Ok(Json(user)),
        Ok(None) => {
            let err = Json(ErrorResponse {
                error: "user not found".to_string(),
            });
            Err(response::status::Custom(Status::NotFound, err))
        }
        Err(e) => {
            eprintln!("Error fetching user {}: {:?}", user_id, e);
            let err = Json(ErrorResponse {
                error: "Database error while fetching user".to_string(),
            });
            Err(response::status::Custom(Status::InternalServerError, err))
        }
    })
    .await
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![create_user, list_users, get_user_endpoint]
}
