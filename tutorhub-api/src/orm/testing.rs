//! Test support: in-memory Rocket instances and database connections.
//!
//! Production never touches this module; tests build throwaway SQLite
//! databases here instead of sharing state on disk.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rand::prelude::IndexedRandom;
use rand::rng;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket, fairing::AdHoc};
use rocket_sync_db_pools::diesel;

use super::db::{DbConn, run_pending_migrations, set_foreign_keys};
use crate::models::UserInput;
use crate::orm::user::{get_user_by_email, insert_user};

/// Configures SQLite with performance-optimized settings for testing.
///
/// Sets the following PRAGMAs:
/// - `synchronous = OFF`: Disables synchronous writes for faster performance
/// - `journal_mode = OFF`: Disables rollback journal
///
/// These settings make SQLite faster but less durable - only use for testing.
fn set_sqlite_test_pragmas(conn: &mut diesel::SqliteConnection) {
    conn.batch_execute(
        r#"
        PRAGMA synchronous = OFF;
        PRAGMA journal_mode = OFF;
        "#,
    )
    .expect("Failed to set SQLite PRAGMAs");
}

fn set_sqlite_test_pragmas_fairing() -> AdHoc {
    AdHoc::on_ignite("Set SQLite Test Pragmas", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for migration");
        conn.run(|c| {
            set_sqlite_test_pragmas(c);
        })
        .await;
        rocket
    })
}

/// Creates a Rocket fairing that initializes standard test data.
///
/// Seeds a consistent set of students and tutors that all tests can rely
/// on: two students with a starting balance and one tutor.
fn test_data_init_fairing() -> AdHoc {
    AdHoc::on_ignite("Test Data Initialization", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test data initialization");

        conn.run(|c| {
            if let Err(e) = create_test_data(c) {
                eprintln!("[test-data-init] ERROR: Failed to create test data: {:?}", e);
            }
        })
        .await;

        rocket
    })
}

/// Creates standard test data for all tests to use.
pub fn create_test_data(conn: &mut SqliteConnection) -> Result<(), crate::error::BookingError> {
    find_or_create_user(conn, "Alice Student", "alice@example.com", "student", 100)?;
    find_or_create_user(conn, "Ben Student", "ben@example.com", "student", 100)?;
    find_or_create_user(conn, "Tessa Tutor", "tessa@example.com", "tutor", 0)?;
    Ok(())
}

fn find_or_create_user(
    conn: &mut SqliteConnection,
    user_name: &str,
    user_email: &str,
    user_role: &str,
    balance: i32,
) -> Result<(), crate::error::BookingError> {
    if get_user_by_email(conn, user_email)?.is_none() {
        insert_user(
            conn,
            UserInput {
                name: user_name.to_string(),
                email: user_email.to_string(),
                role: user_role.to_string(),
                token_balance: balance,
            },
        )?;
    }
    Ok(())
}

/// Picks a random (subject, topic) pair for generated test requests.
pub fn random_subject_topic() -> (&'static str, &'static str) {
    let pairs = [
        ("Algebra", "Quadratic equations"),
        ("Calculus", "Integration by parts"),
        ("Physics", "Kinematics"),
        ("Chemistry", "Stoichiometry"),
        ("Biology", "Cell division"),
        ("English", "Essay structure"),
        ("History", "Primary sources"),
        ("Computer Science", "Recursion"),
    ];
    let mut rng = rng();
    *pairs.choose(&mut rng).expect("non-empty subject list")
}

/// Builds a Rocket instance backed by a unique in-memory SQLite database,
/// with migrations run and standard test data seeded. Each call gets its
/// own database, so tests never observe each other's writes.
pub fn test_rocket() -> Rocket<Build> {
    use uuid::Uuid;

    // Shared-cache in-memory DB, unique per test instance.
    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };

    let databases = map!["tutorhub_db" => db_config];

    let figment = rocket::Config::figment().merge(("databases", databases));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(super::db::set_foreign_keys_fairing())
        .attach(set_sqlite_test_pragmas_fairing())
        .attach(super::db::run_migrations_fairing())
        .attach(test_data_init_fairing());

    crate::mount_api_routes(rocket)
}

/// Creates a synchronous in-memory SQLite connection for ORM unit tests,
/// with foreign keys on and all migrations applied.
pub fn establish_test_connection() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to open in-memory SQLite database");
    set_foreign_keys(&mut conn);
    run_pending_migrations(&mut conn);
    conn
}
