use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::sessions;

/// Closed set of persisted session states. `Completed` is never written by
/// the booking flow itself; it is derived at read time when a scheduled
/// session's end time has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<SessionStatus> {
        match value.to_lowercase().as_str() {
            "scheduled" => Some(SessionStatus::Scheduled),
            "completed" | "complete" => Some(SessionStatus::Completed),
            "cancelled" | "canceled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }
}

/// One calendar copy of a committed appointment. A paid session appears as
/// two rows, one owned by the student and one by the tutor, linked through
/// `mirror_session_id`.
#[derive(Deserialize, Queryable, Identifiable, Debug, Serialize, TS, Clone)]
#[diesel(table_name = sessions)]
#[ts(export)]
pub struct Session {
    pub id: i32,
    pub user_id: i32,
    pub counterpart_id: i32,
    pub counterpart_name: String,
    pub student_email: String,
    pub subject: String,
    #[ts(type = "string")]
    pub start_time: NaiveDateTime,
    #[ts(type = "string")]
    pub end_time: NaiveDateTime,
    pub session_date: String, // redundant YYYY-MM-DD string kept for display
    pub status: String,
    pub cost: i32,
    pub notes: Option<String>,
    pub mirror_session_id: Option<i32>,
}

impl Session {
    /// Status as shown on a calendar: a scheduled session whose end time has
    /// passed reads as completed. Never persisted.
    pub fn effective_status(&self, now: NaiveDateTime) -> &'static str {
        match SessionStatus::parse(&self.status) {
            Some(SessionStatus::Scheduled) if self.end_time < now => {
                SessionStatus::Completed.as_str()
            }
            Some(status) => status.as_str(),
            None => SessionStatus::Scheduled.as_str(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub user_id: i32,
    pub counterpart_id: i32,
    pub counterpart_name: String,
    pub student_email: String,
    pub subject: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub session_date: String,
    pub status: String,
    pub cost: i32,
    pub notes: Option<String>,
    pub mirror_session_id: Option<i32>,
}

/// Payload for booking a session on a user's calendar. The owning user id
/// comes from the URL; the caller is responsible for debiting `cost` tokens
/// beforehand.
#[derive(Deserialize, Serialize, TS, Clone)]
#[ts(export)]
pub struct SessionInput {
    pub counterpart_id: i32,
    pub counterpart_name: String,
    pub student_email: String,
    pub subject: String,
    #[ts(type = "string")]
    pub start_time: NaiveDateTime,
    #[ts(type = "string")]
    pub end_time: NaiveDateTime,
    pub session_date: String,
    pub cost: i32,
    pub notes: Option<String>,
}

/// Result of a cancellation. The refund and the session delete are a single
/// transaction; mirror cleanup on the counterpart's calendar is best-effort
/// and reported here rather than guaranteed.
#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct Cancellation {
    pub session_id: i32,
    pub refund_amount: i32,
    pub new_balance: i32,
    pub mirror_removed: bool,
}
