use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;

use tutorhub_api::models::{Cancellation, Session, TokenMutation, User};
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

/// Helper to debit tokens ahead of a booking.
async fn deduct(client: &Client, user_id: i32, amount: i32) -> TokenMutation {
    let response = client
        .post(format!("/api/1/Users/{}/Tokens/deduct", user_id))
        .header(ContentType::JSON)
        .body(json!({ "amount": amount, "reason": "session booking" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json().await.expect("valid TokenMutation JSON")
}

fn session_body(tutor: &User, student: &User, cost: i32) -> serde_json::Value {
    json!({
        "counterpart_id": tutor.id,
        "counterpart_name": tutor.name,
        "student_email": student.email,
        "subject": "Algebra",
        "start_time": "2099-09-10T14:00:00",
        "end_time": "2099-09-10T15:00:00",
        "session_date": "2099-09-10",
        "cost": cost,
        "notes": null
    })
}

#[rocket::async_test]
async fn test_book_cancel_round_trip() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "alice@example.com").await;
    let tutor = get_user_by_email(&client, "tessa@example.com").await;
    assert_eq!(student.token_balance, 100);

    // Debit first: booking itself never touches the balance.
    let debit = deduct(&client, student.id, 40).await;
    assert_eq!(debit.new_balance, 60);

    let response = client
        .post(format!("/api/1/Users/{}/Sessions", student.id))
        .header(ContentType::JSON)
        .body(session_body(&tutor, &student, 40).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let session: Session = response.into_json().await.expect("valid Session JSON");
    assert_eq!(session.cost, 40);
    assert_eq!(session.status, "scheduled");

    let response = client
        .get(format!("/api/1/Users/{}/Sessions", student.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let listed: Vec<Session> = response.into_json().await.expect("valid sessions JSON");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, "scheduled");

    // Cancel restores the exact pre-booking balance.
    let response = client
        .delete(format!("/api/1/Users/{}/Sessions/{}", student.id, session.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let cancellation: Cancellation = response.into_json().await.expect("valid Cancellation JSON");
    assert_eq!(cancellation.refund_amount, 40);
    assert_eq!(cancellation.new_balance, 100);

    let listed: Vec<Session> = client
        .get(format!("/api/1/Users/{}/Sessions", student.id))
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid sessions JSON");
    assert!(listed.is_empty());
}

#[rocket::async_test]
async fn test_double_cancel_is_rejected() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "alice@example.com").await;
    let tutor = get_user_by_email(&client, "tessa@example.com").await;

    deduct(&client, student.id, 40).await;
    let session: Session = client
        .post(format!("/api/1/Users/{}/Sessions", student.id))
        .header(ContentType::JSON)
        .body(session_body(&tutor, &student, 40).to_string())
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid Session JSON");

    let response = client
        .delete(format!("/api/1/Users/{}/Sessions/{}", student.id, session.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // Second cancel: NotFound, and the balance is credited only once.
    let response = client
        .delete(format!("/api/1/Users/{}/Sessions/{}", student.id, session.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let refreshed = get_user_by_email(&client, "alice@example.com").await;
    assert_eq!(refreshed.token_balance, 100);
}

#[rocket::async_test]
async fn test_booking_requires_identifying_fields() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "alice@example.com").await;
    let tutor = get_user_by_email(&client, "tessa@example.com").await;

    let mut body = session_body(&tutor, &student, 40);
    body["student_email"] = json!("");
    let response = client
        .post(format!("/api/1/Users/{}/Sessions", student.id))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let mut body = session_body(&tutor, &student, 40);
    body["counterpart_id"] = json!(0);
    let response = client
        .post(format!("/api/1/Users/{}/Sessions", student.id))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn test_cancel_removes_directly_booked_mirror_by_proximity() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "alice@example.com").await;
    let tutor = get_user_by_email(&client, "tessa@example.com").await;

    // Direct booking flow: the UI books the student copy and the tutor copy
    // as two independent writes, with no cross-reference between them.
    deduct(&client, student.id, 40).await;
    let student_session: Session = client
        .post(format!("/api/1/Users/{}/Sessions", student.id))
        .header(ContentType::JSON)
        .body(session_body(&tutor, &student, 40).to_string())
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid Session JSON");

    let tutor_body = json!({
        "counterpart_id": student.id,
        "counterpart_name": student.name,
        "student_email": student.email,
        "subject": "Algebra",
        "start_time": "2099-09-10T14:00:00",
        "end_time": "2099-09-10T15:00:00",
        "session_date": "2099-09-10",
        "cost": 40,
        "notes": null
    });
    let response = client
        .post(format!("/api/1/Users/{}/Sessions", tutor.id))
        .header(ContentType::JSON)
        .body(tutor_body.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    // Cancelling the student copy finds the tutor copy by email and
    // start-time proximity even without a stored cross-reference.
    let cancellation: Cancellation = client
        .delete(format!("/api/1/Users/{}/Sessions/{}", student.id, student_session.id))
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid Cancellation JSON");
    assert!(cancellation.mirror_removed);

    let tutor_sessions: Vec<Session> = client
        .get(format!("/api/1/Users/{}/Sessions", tutor.id))
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid sessions JSON");
    assert!(tutor_sessions.is_empty());
}

#[rocket::async_test]
async fn test_past_sessions_read_as_completed() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let student = get_user_by_email(&client, "ben@example.com").await;
    let tutor = get_user_by_email(&client, "tessa@example.com").await;

    deduct(&client, student.id, 10).await;
    let body = json!({
        "counterpart_id": tutor.id,
        "counterpart_name": tutor.name,
        "student_email": student.email,
        "subject": "History",
        "start_time": "2020-01-06T09:00:00",
        "end_time": "2020-01-06T10:00:00",
        "session_date": "2020-01-06",
        "cost": 10,
        "notes": "make-up lesson"
    });
    let response = client
        .post(format!("/api/1/Users/{}/Sessions", student.id))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    let listed: Vec<Session> = client
        .get(format!("/api/1/Users/{}/Sessions", student.id))
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid sessions JSON");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, "completed");
}
