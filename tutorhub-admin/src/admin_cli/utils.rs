use diesel::{prelude::*, sqlite::SqliteConnection};
use dotenvy::dotenv;
use tutorhub_api::models::User;
use tutorhub_api::orm::set_foreign_keys;
use tutorhub_api::orm::user::{get_user, get_user_by_email};

/// Opens the database named by `DATABASE_URL` with foreign keys enabled.
/// SQLite leaves them off per connection, and the user/session/ledger
/// integrity checks depend on them.
pub fn establish_connection() -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut conn = SqliteConnection::establish(&database_url)?;
    set_foreign_keys(&mut conn);
    Ok(conn)
}

/// Resolve a user identifier (either a numeric ID or an email address) to
/// the user row. If the input parses as a number, treat it as an ID;
/// otherwise look it up by email (case-insensitive).
pub fn resolve_user(
    conn: &mut SqliteConnection,
    user_identifier: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    if let Ok(id) = user_identifier.parse::<i32>() {
        match get_user(conn, id)? {
            Some(user) => Ok(user),
            None => Err(format!("User with ID {} does not exist", id).into()),
        }
    } else {
        match get_user_by_email(conn, user_identifier)? {
            Some(user) => Ok(user),
            None => Err(format!("User with email '{}' does not exist", user_identifier).into()),
        }
    }
}
