use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::error::BookingError;
use crate::models::{NewUser, User, UserInput};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Inserts a new user. `role` must be "student" or "tutor"; the starting
/// token balance may not be negative.
pub fn insert_user(
    conn: &mut SqliteConnection,
    new_user: UserInput,
) -> Result<User, BookingError> {
    use crate::schema::users::dsl::*;

    if new_user.name.trim().is_empty() {
        return Err(BookingError::Validation("name is required".to_string()));
    }
    if new_user.email.trim().is_empty() {
        return Err(BookingError::Validation("email is required".to_string()));
    }
    if new_user.role != "student" && new_user.role != "tutor" {
        return Err(BookingError::Validation(format!(
            "role must be 'student' or 'tutor', got '{}'",
            new_user.role
        )));
    }
    if new_user.token_balance < 0 {
        return Err(BookingError::Validation(
            "token_balance may not be negative".to_string(),
        ));
    }

    let insertable_user = NewUser {
        name: new_user.name,
        email: new_user.email,
        role: new_user.role,
        token_balance: new_user.token_balance,
    };

    diesel::insert_into(users)
        .values(&insertable_user)
        .execute(conn)?;

    let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid;

    let user = users.filter(id.eq(last_id as i32)).first::<User>(conn)?;
    Ok(user)
}

/// Returns all users in ascending order by id.
pub fn list_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.order(id.asc()).load::<User>(conn)
}

/// Gets a single user by ID.
pub fn get_user(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.filter(id.eq(user_id)).first::<User>(conn).optional()
}

/// Gets a single user by email (case-insensitive).
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    user_email: &str,
) -> Result<Option<User>, diesel::result::Error> {
    diesel::sql_query("SELECT * FROM users WHERE LOWER(email) = LOWER(?)")
        .bind::<diesel::sql_types::Text, _>(user_email)
        .get_result::<User>(conn)
        .optional()
}

/// Deletes a user by ID. Fails if sessions, requests, or ledger entries
/// still reference the user (foreign keys are on).
pub fn delete_user(conn: &mut SqliteConnection, user_id: i32) -> Result<usize, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    diesel::delete(users.filter(id.eq(user_id))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::establish_test_connection;

    fn student_input(email_addr: &str) -> UserInput {
        UserInput {
            name: "Test Student".to_string(),
            email: email_addr.to_string(),
            role: "student".to_string(),
            token_balance: 50,
        }
    }

    #[test]
    fn insert_and_fetch_user() {
        let mut conn = establish_test_connection();
        let user = insert_user(&mut conn, student_input("s1@example.com")).unwrap();
        assert_eq!(user.token_balance, 50);

        let fetched = get_user(&mut conn, user.id).unwrap().unwrap();
        assert_eq!(fetched.email, "s1@example.com");

        let by_email = get_user_by_email(&mut conn, "S1@EXAMPLE.COM").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[test]
    fn insert_rejects_bad_role() {
        let mut conn = establish_test_connection();
        let mut input = student_input("s2@example.com");
        input.role = "admin".to_string();
        let err = insert_user(&mut conn, input).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn insert_rejects_negative_balance() {
        let mut conn = establish_test_connection();
        let mut input = student_input("s3@example.com");
        input.token_balance = -10;
        let err = insert_user(&mut conn, input).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }
}
