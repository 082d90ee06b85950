use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use tutorhub_api::models::RequestStatus;
use tutorhub_api::orm::booking_request::list_all_booking_requests;

#[derive(Subcommand)]
pub enum RequestAction {
    #[command(about = "List booking requests, optionally filtered by status")]
    Ls {
        #[arg(short, long, help = "Filter by status: pending, accepted, or rejected")]
        status: Option<String>,
    },
}

pub fn handle_request_command_with_conn(
    conn: &mut SqliteConnection,
    action: RequestAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RequestAction::Ls { status } => {
            list_requests_impl(conn, status)?;
        }
    }
    Ok(())
}

pub fn list_requests_impl(
    conn: &mut SqliteConnection,
    status_filter: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let wanted = match status_filter {
        Some(raw) => Some(
            RequestStatus::parse(&raw)
                .ok_or_else(|| format!("Unknown status '{}'; expected pending, accepted, or rejected", raw))?,
        ),
        None => None,
    };

    let requests = list_all_booking_requests(conn)?;
    let filtered: Vec<_> = match wanted {
        Some(status) => requests
            .into_iter()
            .filter(|request| request.status == status.as_str())
            .collect(),
        None => requests,
    };

    if filtered.is_empty() {
        println!("No booking requests found.");
        return Ok(());
    }

    println!("Booking requests, newest first:");
    for request in filtered {
        let session = match request.session_id {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        println!(
            "  ID: {}, Student: {} ({}), Tutor: {} ({}), Subject: {}, When: {} {}, Status: {}, Cost: {}, Session: {}",
            request.id,
            request.student_name,
            request.student_id,
            request.tutor_name,
            request.tutor_id,
            request.subject,
            request.session_date,
            request.session_time,
            request.status,
            request.cost,
            session
        );
    }

    Ok(())
}
