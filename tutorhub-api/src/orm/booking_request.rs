//! Booking request workflow: create, list, and the terminal accept/reject
//! transitions.
//!
//! Acceptance and rejection each commit as one transaction. Acceptance
//! writes the student session, the tutor mirror, both cross-references, and
//! the terminal status together; there is no partial state to reconcile
//! afterwards. Rejection folds the refund and the status flip into the same
//! unit.

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::error::BookingError;
use crate::models::{
    Acceptance, BookingRequest, BookingRequestInput, NewBookingRequest, Rejection, RequestStatus,
    SessionInput, TokenMutation,
};
use crate::orm::session::{create_session_times, insert_session};
use crate::orm::token::{get_token_balance, refund_tokens};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Inserts a new pending request. No tokens move here; the debit happened
/// at the booking action that preceded the request.
pub fn create_booking_request(
    conn: &mut SqliteConnection,
    input: BookingRequestInput,
) -> Result<BookingRequest, BookingError> {
    use crate::schema::booking_requests::dsl::*;

    if input.student_id <= 0 {
        return Err(BookingError::Validation("student id is required".to_string()));
    }
    if input.tutor_id <= 0 {
        return Err(BookingError::Validation("tutor id is required".to_string()));
    }
    if input.student_email.trim().is_empty() {
        return Err(BookingError::Validation("student email is required".to_string()));
    }
    if input.cost < 0 {
        return Err(BookingError::Validation("cost may not be negative".to_string()));
    }
    // Reject unparseable schedules at create time rather than at acceptance.
    create_session_times(&input.session_date, &input.session_time, input.duration_minutes as i64)?;

    let new_request = NewBookingRequest {
        student_id: input.student_id,
        student_name: input.student_name,
        student_email: input.student_email,
        tutor_id: input.tutor_id,
        tutor_name: input.tutor_name,
        subject: input.subject,
        topic: input.topic,
        session_date: input.session_date,
        session_time: input.session_time,
        duration_minutes: input.duration_minutes,
        message: input.message,
        urgency: input.urgency,
        status: RequestStatus::Pending.as_str().to_string(),
        cost: input.cost,
    };

    diesel::insert_into(booking_requests)
        .values(&new_request)
        .execute(conn)?;

    let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid;

    let request = booking_requests
        .filter(id.eq(last_id as i32))
        .first::<BookingRequest>(conn)?;
    Ok(request)
}

/// Gets one request by id.
pub fn get_booking_request(
    conn: &mut SqliteConnection,
    request_id: i32,
) -> Result<Option<BookingRequest>, diesel::result::Error> {
    use crate::schema::booking_requests::dsl::*;
    booking_requests
        .filter(id.eq(request_id))
        .first::<BookingRequest>(conn)
        .optional()
        .map(|found| found.map(normalize_status))
}

/// Returns all requests addressed to a tutor, newest first.
pub fn get_tutor_booking_requests(
    conn: &mut SqliteConnection,
    target_tutor_id: i32,
) -> Result<Vec<BookingRequest>, diesel::result::Error> {
    use crate::schema::booking_requests::dsl::*;
    let rows = booking_requests
        .filter(tutor_id.eq(target_tutor_id))
        .order(id.desc())
        .load::<BookingRequest>(conn)?;
    Ok(rows.into_iter().map(normalize_status).collect())
}

/// Returns all requests created by a student, newest first.
pub fn get_student_booking_requests(
    conn: &mut SqliteConnection,
    target_student_id: i32,
) -> Result<Vec<BookingRequest>, diesel::result::Error> {
    use crate::schema::booking_requests::dsl::*;
    let rows = booking_requests
        .filter(student_id.eq(target_student_id))
        .order(id.desc())
        .load::<BookingRequest>(conn)?;
    Ok(rows.into_iter().map(normalize_status).collect())
}

/// Returns every request in the system, newest first.
pub fn list_all_booking_requests(
    conn: &mut SqliteConnection,
) -> Result<Vec<BookingRequest>, diesel::result::Error> {
    use crate::schema::booking_requests::dsl::*;
    let rows = booking_requests.order(id.desc()).load::<BookingRequest>(conn)?;
    Ok(rows.into_iter().map(normalize_status).collect())
}

/// Maps drifted status strings ("accept", "Reject", ...) to canonical form
/// for display. Unrecognized values pass through unchanged.
fn normalize_status(mut request: BookingRequest) -> BookingRequest {
    if let Some(parsed) = RequestStatus::parse(&request.status) {
        request.status = parsed.as_str().to_string();
    }
    request
}

/// Writes a status transition, enforcing the closed enum and terminality:
/// only a pending request may transition, and writes emit canonical
/// strings only. `linked_session_id` is stamped on acceptance.
pub fn update_booking_request_status(
    conn: &mut SqliteConnection,
    request_id: i32,
    new_status: RequestStatus,
    linked_session_id: Option<i32>,
) -> Result<BookingRequest, BookingError> {
    use crate::schema::booking_requests::dsl::*;

    conn.transaction(|conn| {
        let request = booking_requests
            .filter(id.eq(request_id))
            .first::<BookingRequest>(conn)
            .optional()?
            .ok_or(BookingError::NotFound("booking request"))?;

        let current = RequestStatus::parse(&request.status).ok_or_else(|| {
            BookingError::Validation(format!(
                "request {} has unrecognized status '{}'",
                request_id, request.status
            ))
        })?;
        if current.is_terminal() {
            return Err(BookingError::TerminalStatus {
                status: current.as_str().to_string(),
            });
        }

        diesel::update(booking_requests.filter(id.eq(request_id)))
            .set((
                status.eq(new_status.as_str()),
                session_id.eq(linked_session_id),
            ))
            .execute(conn)?;

        let updated = booking_requests
            .filter(id.eq(request_id))
            .first::<BookingRequest>(conn)?;
        Ok(updated)
    })
}

/// Accepts a pending request, materializing both calendar copies.
///
/// One transaction covers the student session, the tutor mirror with its
/// back-reference, the student session's forward reference, and the
/// terminal status with `session_id` stamped. All-or-nothing.
pub fn accept_booking_request(
    conn: &mut SqliteConnection,
    request_id: i32,
) -> Result<Acceptance, BookingError> {
    conn.transaction(|conn| {
        let request = get_booking_request(conn, request_id)?
            .ok_or(BookingError::NotFound("booking request"))?;

        let (start, end) = create_session_times(
            &request.session_date,
            &request.session_time,
            request.duration_minutes as i64,
        )?;

        // Student-side copy: the tutor is the counterpart.
        let student_session = insert_session(
            conn,
            request.student_id,
            &SessionInput {
                counterpart_id: request.tutor_id,
                counterpart_name: request.tutor_name.clone(),
                student_email: request.student_email.clone(),
                subject: request.subject.clone(),
                start_time: start,
                end_time: end,
                session_date: request.session_date.clone(),
                cost: request.cost,
                notes: request.message.clone(),
            },
            None,
        )?;

        // Tutor-side mirror carries the back-reference at creation.
        let tutor_session = insert_session(
            conn,
            request.tutor_id,
            &SessionInput {
                counterpart_id: request.student_id,
                counterpart_name: request.student_name.clone(),
                student_email: request.student_email.clone(),
                subject: request.subject.clone(),
                start_time: start,
                end_time: end,
                session_date: request.session_date.clone(),
                cost: request.cost,
                notes: request.message.clone(),
            },
            Some(student_session.id),
        )?;

        {
            use crate::schema::sessions::dsl::*;
            diesel::update(sessions.filter(id.eq(student_session.id)))
                .set(mirror_session_id.eq(tutor_session.id))
                .execute(conn)?;
        }

        update_booking_request_status(
            conn,
            request_id,
            RequestStatus::Accepted,
            Some(student_session.id),
        )?;

        Ok(Acceptance {
            request_id,
            student_session_id: student_session.id,
            tutor_session_id: tutor_session.id,
        })
    })
}

/// Rejects a pending request and refunds its cost to the student in the
/// same transaction. No `session_id` is ever set on a rejected request.
pub fn reject_booking_request(
    conn: &mut SqliteConnection,
    request_id: i32,
) -> Result<Rejection, BookingError> {
    conn.transaction(|conn| {
        let request = get_booking_request(conn, request_id)?
            .ok_or(BookingError::NotFound("booking request"))?;

        // Terminality is enforced by the status update below, but checking
        // before the refund keeps the error message ahead of side effects.
        let current = RequestStatus::parse(&request.status).ok_or_else(|| {
            BookingError::Validation(format!(
                "request {} has unrecognized status '{}'",
                request_id, request.status
            ))
        })?;
        if current.is_terminal() {
            return Err(BookingError::TerminalStatus {
                status: current.as_str().to_string(),
            });
        }

        // Zero-cost requests have nothing to refund; skip the ledger write
        // so the rejection still lands.
        let mutation = if request.cost > 0 {
            refund_tokens(
                conn,
                request.student_id,
                request.cost,
                &format!("refund for rejected booking request {}", request_id),
            )?
        } else {
            TokenMutation {
                user_id: request.student_id,
                amount: 0,
                new_balance: get_token_balance(conn, request.student_id)?,
            }
        };

        update_booking_request_status(conn, request_id, RequestStatus::Rejected, None)?;

        Ok(Rejection {
            request_id,
            refund_amount: request.cost,
            new_balance: mutation.new_balance,
        })
    })
}
