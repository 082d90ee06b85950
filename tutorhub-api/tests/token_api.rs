#[macro_use]
extern crate time_test;

use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;

use tutorhub_api::models::{TokenMutation, User};
use tutorhub_api::orm::testing::test_rocket;

/// Helper to fetch a seeded user by email.
async fn get_user_by_email(client: &Client, email: &str) -> User {
    let response = client.get("/api/1/Users").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let users: Vec<User> = response.into_json().await.expect("valid users JSON");
    users
        .into_iter()
        .find(|u| u.email == email)
        .unwrap_or_else(|| panic!("User '{}' should exist from test data initialization", email))
}

async fn mutate<'a>(client: &'a Client, user_id: i32, op: &str, amount: i32) -> rocket::local::asynchronous::LocalResponse<'a> {
    client
        .post(format!("/api/1/Users/{}/Tokens/{}", user_id, op))
        .header(ContentType::JSON)
        .body(json!({ "amount": amount, "reason": "test mutation" }).to_string())
        .dispatch()
        .await
}

#[rocket::async_test]
async fn test_deduct_and_refund() {
    time_test!("test_deduct_and_refund");
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "alice@example.com").await;

    let response = mutate(&client, student.id, "deduct", 40).await;
    assert_eq!(response.status(), Status::Ok);
    let debit: TokenMutation = response.into_json().await.expect("valid TokenMutation JSON");
    assert_eq!(debit.amount, -40);
    assert_eq!(debit.new_balance, 60);

    let response = mutate(&client, student.id, "refund", 15).await;
    assert_eq!(response.status(), Status::Ok);
    let credit: TokenMutation = response.into_json().await.expect("valid TokenMutation JSON");
    assert_eq!(credit.amount, 15);
    assert_eq!(credit.new_balance, 75);

    let refreshed = get_user_by_email(&client, "alice@example.com").await;
    assert_eq!(refreshed.token_balance, 75);
}

#[rocket::async_test]
async fn test_overdraft_is_rejected_at_commit() {
    time_test!("test_overdraft_is_rejected_at_commit");
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "ben@example.com").await;

    let response = mutate(&client, student.id, "deduct", 101).await;
    assert_eq!(response.status(), Status::Conflict);

    // A failed debit changes nothing.
    let refreshed = get_user_by_email(&client, "ben@example.com").await;
    assert_eq!(refreshed.token_balance, 100);
}

#[rocket::async_test]
async fn test_ledger_records_every_mutation() {
    time_test!("test_ledger_records_every_mutation");
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "alice@example.com").await;

    mutate(&client, student.id, "deduct", 30).await;
    mutate(&client, student.id, "refund", 10).await;

    let response = client
        .get(format!("/api/1/Users/{}/Tokens", student.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let account: serde_json::Value = response.into_json().await.expect("valid TokenAccount JSON");
    assert_eq!(account["balance"], 80);

    let ledger = account["ledger"].as_array().expect("ledger array");
    assert_eq!(ledger.len(), 2);
    // Newest first, with running balance snapshots.
    assert_eq!(ledger[0]["amount"], 10);
    assert_eq!(ledger[0]["balance_after"], 80);
    assert_eq!(ledger[1]["amount"], -30);
    assert_eq!(ledger[1]["balance_after"], 70);
}

#[rocket::async_test]
async fn test_mutations_against_unknown_user() {
    time_test!("test_mutations_against_unknown_user");
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let response = mutate(&client, 9999, "deduct", 10).await;
    assert_eq!(response.status(), Status::NotFound);

    let response = mutate(&client, 9999, "refund", 10).await;
    assert_eq!(response.status(), Status::NotFound);

    let response = client.get("/api/1/Users/9999/Tokens").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_invalid_amounts_are_rejected() {
    time_test!("test_invalid_amounts_are_rejected");
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "alice@example.com").await;

    let response = mutate(&client, student.id, "deduct", 0).await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = mutate(&client, student.id, "refund", -5).await;
    assert_eq!(response.status(), Status::BadRequest);
}
