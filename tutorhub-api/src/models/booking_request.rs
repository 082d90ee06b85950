use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::booking_requests;

/// Request workflow states. Pending is the only state that may transition;
/// accepted and rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Parses a persisted status string. Older records drifted from the
    /// canonical values ("accept", "reject", mixed case), so the legacy
    /// forms are mapped here before any state-machine logic runs. All
    /// writes emit canonical strings only.
    pub fn parse(value: &str) -> Option<RequestStatus> {
        match value.to_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "accepted" | "accept" => Some(RequestStatus::Accepted),
            "rejected" | "reject" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student's proposal to a tutor that has not yet become a session.
/// `session_id` points at the student-side session once accepted.
#[derive(Deserialize, Queryable, Identifiable, Debug, Serialize, TS, Clone)]
#[diesel(table_name = booking_requests)]
#[ts(export)]
pub struct BookingRequest {
    pub id: i32,
    pub student_id: i32,
    pub student_name: String,
    pub student_email: String,
    pub tutor_id: i32,
    pub tutor_name: String,
    pub subject: String,
    pub topic: String,
    pub session_date: String, // YYYY-MM-DD
    pub session_time: String, // HH:MM
    pub duration_minutes: i32,
    pub message: Option<String>,
    pub urgency: Option<String>,
    pub status: String,
    pub cost: i32,
    pub session_id: Option<i32>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = booking_requests)]
pub struct NewBookingRequest {
    pub student_id: i32,
    pub student_name: String,
    pub student_email: String,
    pub tutor_id: i32,
    pub tutor_name: String,
    pub subject: String,
    pub topic: String,
    pub session_date: String,
    pub session_time: String,
    pub duration_minutes: i32,
    pub message: Option<String>,
    pub urgency: Option<String>,
    pub status: String,
    pub cost: i32,
}

/// Payload for creating a booking request. No tokens move at this point;
/// the debit happened at the booking action that preceded the request.
#[derive(Deserialize, Serialize, TS, Clone)]
#[ts(export)]
pub struct BookingRequestInput {
    pub student_id: i32,
    pub student_name: String,
    pub student_email: String,
    pub tutor_id: i32,
    pub tutor_name: String,
    pub subject: String,
    pub topic: String,
    pub session_date: String,
    pub session_time: String,
    pub duration_minutes: i32,
    pub message: Option<String>,
    pub urgency: Option<String>,
    pub cost: i32,
}

/// Result of accepting a request: both calendar copies, cross-referenced.
#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct Acceptance {
    pub request_id: i32,
    pub student_session_id: i32,
    pub tutor_session_id: i32,
}

/// Result of rejecting a request: the student's refund.
#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct Rejection {
    pub request_id: i32,
    pub refund_amount: i32,
    pub new_balance: i32,
}
