use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::users;

#[derive(Deserialize, Queryable, Identifiable, QueryableByName, Debug, Serialize, TS, Clone)]
#[diesel(table_name = users)]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String, // Will be unique
    pub role: String,  // "student" or "tutor"
    pub token_balance: i32,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub token_balance: i32,
}

/// Payload for creating a user. `token_balance` defaults to zero so the
/// signup form doesn't have to send it.
#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub token_balance: i32,
}
