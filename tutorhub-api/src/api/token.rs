//! API endpoints for the token balance primitive.
//!
//! Debit and credit both run as a single database transaction that appends
//! an audit ledger row and updates the user's materialized balance. These
//! are the primitives the booking flows compose: the UI debits before
//! booking a session, and cancellation/rejection credit through the same
//! path.

use rocket::Route;
use rocket::http::Status;
use rocket::response::{self, status};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ErrorResponse, booking_error_response};
use crate::logged_json::LoggedJson;
use crate::models::{TokenLedgerEntry, TokenMutation};
use crate::orm::DbConn;
use crate::orm::token::{deduct_tokens, get_token_balance, get_token_ledger, refund_tokens};

/// Body of a deduct/refund call.
#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct TokenAmountRequest {
    pub amount: i32,
    pub reason: Option<String>,
}

/// A user's balance together with the audit trail behind it.
#[derive(Serialize, TS)]
#[ts(export)]
pub struct TokenAccount {
    pub user_id: i32,
    pub balance: i32,
    pub ledger: Vec<TokenLedgerEntry>,
}

/// Token Account endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>/Tokens`
/// - **Method:** `GET`
/// - **Purpose:** Returns the user's balance and ledger entries (newest first)
#[get("/1/Users/<user_id>/Tokens")]
pub async fn get_token_account(
    db: DbConn,
    user_id: i32,
) -> Result<Json<TokenAccount>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        let balance = get_token_balance(conn, user_id).map_err(booking_error_response)?;
        let ledger = get_token_ledger(conn, user_id).map_err(|e| {
            eprintln!("Error reading ledger for user {}: {:?}", user_id, e);
            let err = Json(ErrorResponse {
                error: "Database error while reading token ledger".to_string(),
            });
            response::status::Custom(Status::InternalServerError, err)
        })?;
        Ok(Json(TokenAccount { user_id, balance, ledger }))
    })
    .await
}

/// Deduct Tokens endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>/Tokens/deduct`
/// - **Method:** `POST`
/// - **Purpose:** Atomically debits tokens ahead of a booking
///
/// # Request Format
///
/// ```json
/// { "amount": 40, "reason": "booking: Algebra with Tessa" }
/// ```
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// { "user_id": 7, "amount": -40, "new_balance": 60 }
/// ```
///
/// **Failure (HTTP 409 Conflict):**
/// ```json
/// { "error": "insufficient token balance: have 30, need 40" }
/// ```
#[post("/1/Users/<user_id>/Tokens/deduct", data = "<request>")]
pub async fn deduct_tokens_endpoint(
    db: DbConn,
    user_id: i32,
    request: LoggedJson<TokenAmountRequest>,
) -> Result<Json<TokenMutation>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        let reason = request.reason.clone().unwrap_or_else(|| "token deduction".to_string());
        deduct_tokens(conn, user_id, request.amount, &reason)
            .map(Json)
            .map_err(booking_error_response)
    })
    .await
}

/// Refund Tokens endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>/Tokens/refund`
/// - **Method:** `POST`
/// - **Purpose:** Atomically credits tokens back to a user
#[post("/1/Users/<user_id>/Tokens/refund", data = "<request>")]
pub async fn refund_tokens_endpoint(
    db: DbConn,
    user_id: i32,
    request: LoggedJson<TokenAmountRequest>,
) -> Result<Json<TokenMutation>, response::status::Custom<Json<ErrorResponse>>> {
    db.run(move |conn| {
        let reason = request.reason.clone().unwrap_or_else(|| "token refund".to_string());
        refund_tokens(conn, user_id, request.amount, &reason)
            .map(Json)
            .map_err(booking_error_response)
    })
    .await
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![get_token_account, deduct_tokens_endpoint, refund_tokens_endpoint]
}
