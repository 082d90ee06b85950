//! Booking ledger operations: session writes, calendar reads, and the
//! transactional cancel/refund path.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::error::BookingError;
use crate::models::{Cancellation, NewSession, Session, SessionInput, SessionStatus, TokenMutation};
use crate::orm::token::{get_token_balance, refund_tokens};

/// How far apart two start times may be for the proximity fallback to treat
/// a counterpart session as the mirror of a cancelled one.
pub fn mirror_match_window() -> Duration {
    Duration::hours(1)
}

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Combines a `YYYY-MM-DD` date and `HH:MM` time-of-day into UTC start and
/// end instants. All stored instants are UTC; display timezones are a
/// frontend concern.
pub fn create_session_times(
    date: &str,
    time: &str,
    duration_minutes: i64,
) -> Result<(NaiveDateTime, NaiveDateTime), BookingError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| BookingError::Validation(format!("invalid date '{}': {}", date, e)))?;
    let time_of_day = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|e| BookingError::Validation(format!("invalid time '{}': {}", time, e)))?;

    if duration_minutes <= 0 {
        return Err(BookingError::Validation(format!(
            "duration must be positive, got {} minutes",
            duration_minutes
        )));
    }

    let start = NaiveDateTime::new(day, time_of_day);
    let end = start + Duration::minutes(duration_minutes);
    Ok((start, end))
}

/// Inserts one session row on `owner_id`'s calendar. Exactly one write and
/// no balance effect: the caller debits the paying student first. The
/// mirror cross-reference is stamped at creation when the counterpart copy
/// already exists.
pub fn insert_session(
    conn: &mut SqliteConnection,
    owner_id: i32,
    input: &SessionInput,
    mirror_of: Option<i32>,
) -> Result<Session, BookingError> {
    use crate::schema::sessions::dsl::*;

    if owner_id <= 0 {
        return Err(BookingError::Validation("owning user id is required".to_string()));
    }
    if input.counterpart_id <= 0 {
        return Err(BookingError::Validation("counterpart id is required".to_string()));
    }
    if input.student_email.trim().is_empty() {
        return Err(BookingError::Validation("student email is required".to_string()));
    }
    if input.cost < 0 {
        return Err(BookingError::Validation("cost may not be negative".to_string()));
    }
    if input.end_time <= input.start_time {
        return Err(BookingError::Validation(
            "end time must be after start time".to_string(),
        ));
    }

    let new_session = NewSession {
        user_id: owner_id,
        counterpart_id: input.counterpart_id,
        counterpart_name: input.counterpart_name.clone(),
        student_email: input.student_email.clone(),
        subject: input.subject.clone(),
        start_time: input.start_time,
        end_time: input.end_time,
        session_date: input.session_date.clone(),
        status: SessionStatus::Scheduled.as_str().to_string(),
        cost: input.cost,
        notes: input.notes.clone(),
        mirror_session_id: mirror_of,
    };

    diesel::insert_into(sessions).values(&new_session).execute(conn)?;

    let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid;

    let session = sessions.filter(id.eq(last_id as i32)).first::<Session>(conn)?;
    Ok(session)
}

/// Returns all sessions on a user's calendar, ordered by start time
/// descending. Read failures propagate; an empty calendar and a failed
/// read are different results.
pub fn get_user_sessions(
    conn: &mut SqliteConnection,
    owner_id: i32,
) -> Result<Vec<Session>, diesel::result::Error> {
    use crate::schema::sessions::dsl::*;
    sessions
        .filter(user_id.eq(owner_id))
        .order(start_time.desc())
        .load::<Session>(conn)
}

/// Gets one session by owner and id.
pub fn get_session(
    conn: &mut SqliteConnection,
    owner_id: i32,
    session_id: i32,
) -> Result<Option<Session>, diesel::result::Error> {
    use crate::schema::sessions::dsl::*;
    sessions
        .filter(id.eq(session_id).and(user_id.eq(owner_id)))
        .first::<Session>(conn)
        .optional()
}

/// Gets one session by id regardless of owner. Admin tooling uses this to
/// follow mirror cross-references.
pub fn get_session_by_id(
    conn: &mut SqliteConnection,
    session_id: i32,
) -> Result<Option<Session>, diesel::result::Error> {
    use crate::schema::sessions::dsl::*;
    sessions.filter(id.eq(session_id)).first::<Session>(conn).optional()
}

/// Returns every session in the system, ordered by start time descending.
pub fn list_all_sessions(
    conn: &mut SqliteConnection,
) -> Result<Vec<Session>, diesel::result::Error> {
    use crate::schema::sessions::dsl::*;
    sessions.order(start_time.desc()).load::<Session>(conn)
}

/// Overwrites a session's mirror cross-reference. Used by the admin repair
/// pass to stamp or clear references on rows the best-effort cleanup missed.
pub fn set_mirror_reference(
    conn: &mut SqliteConnection,
    session_id: i32,
    mirror: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::sessions::dsl::*;
    diesel::update(sessions.filter(id.eq(session_id)))
        .set(mirror_session_id.eq(mirror))
        .execute(conn)
}

/// Cancels a session and refunds its cost to the owning user.
///
/// The refund (ledger row + materialized balance) and the session delete
/// commit in one transaction; a second cancel of the same id fails with
/// `NotFound` and credits nothing. Mirror cleanup on the counterpart's
/// calendar runs after commit and is best-effort: a failure there is
/// logged and reported as `mirror_removed: false`, never rolled back.
pub fn cancel_session(
    conn: &mut SqliteConnection,
    owner_id: i32,
    session_id: i32,
) -> Result<Cancellation, BookingError> {
    let (cancelled, mutation) = conn.transaction::<_, BookingError, _>(|conn| {
        let session =
            get_session(conn, owner_id, session_id)?.ok_or(BookingError::NotFound("session"))?;

        // Zero-cost sessions have nothing to credit; the ledger only
        // records real movements.
        let mutation = if session.cost > 0 {
            refund_tokens(
                conn,
                owner_id,
                session.cost,
                &format!("refund for cancelled session {}", session.id),
            )?
        } else {
            TokenMutation {
                user_id: owner_id,
                amount: 0,
                new_balance: get_token_balance(conn, owner_id)?,
            }
        };

        {
            use crate::schema::sessions::dsl::*;
            diesel::delete(sessions.filter(id.eq(session.id))).execute(conn)?;
        }

        Ok((session, mutation))
    })?;

    let mirror_removed = match remove_mirror_session(conn, &cancelled) {
        Ok(removed) => removed,
        Err(e) => {
            eprintln!(
                "Failed to remove mirror of session {} from user {}'s calendar: {:?}",
                cancelled.id, cancelled.counterpart_id, e
            );
            false
        }
    };

    Ok(Cancellation {
        session_id: cancelled.id,
        refund_amount: mutation.amount,
        new_balance: mutation.new_balance,
        mirror_removed,
    })
}

/// Deletes the counterpart's copy of a cancelled session. Prefers the
/// stored cross-reference; rows predating the cross-reference fall back to
/// matching by student email and start-time proximity. Returns whether a
/// mirror row was deleted.
pub fn remove_mirror_session(
    conn: &mut SqliteConnection,
    cancelled: &Session,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::sessions::dsl::*;

    if let Some(mirror_id) = cancelled.mirror_session_id {
        let deleted = diesel::delete(
            sessions.filter(id.eq(mirror_id).and(user_id.eq(cancelled.counterpart_id))),
        )
        .execute(conn)?;
        if deleted > 0 {
            return Ok(true);
        }
        // Dangling reference; fall through to the repair path.
    }

    match find_mirror_by_proximity(conn, cancelled)? {
        Some(mirror) => {
            let deleted = diesel::delete(sessions.filter(id.eq(mirror.id))).execute(conn)?;
            Ok(deleted > 0)
        }
        None => Ok(false),
    }
}

/// Repair-path lookup: finds the counterpart's session matching a given
/// session by student email and a start time within [`mirror_match_window`].
pub fn find_mirror_by_proximity(
    conn: &mut SqliteConnection,
    original: &Session,
) -> Result<Option<Session>, diesel::result::Error> {
    use crate::schema::sessions::dsl::*;

    let window_start = original.start_time - mirror_match_window();
    let window_end = original.start_time + mirror_match_window();

    sessions
        .filter(user_id.eq(original.counterpart_id))
        .filter(student_email.eq(&original.student_email))
        .filter(start_time.ge(window_start).and(start_time.le(window_end)))
        .order(id.asc())
        .first::<Session>(conn)
        .optional()
}
