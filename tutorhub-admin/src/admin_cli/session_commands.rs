use chrono::Utc;
use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use tutorhub_api::orm::session::{
    find_mirror_by_proximity, get_session_by_id, get_user_sessions, list_all_sessions,
    set_mirror_reference,
};

use crate::admin_cli::utils::resolve_user;

#[derive(Subcommand)]
pub enum SessionAction {
    #[command(about = "List sessions, optionally for one user")]
    Ls {
        #[arg(help = "User ID or email address (omit for all sessions)")]
        user: Option<String>,
    },
    #[command(about = "Find and repair orphaned mirror cross-references")]
    ReconcileMirrors {
        #[arg(long, help = "Report what would change without writing anything")]
        dry_run: bool,
    },
}

pub fn handle_session_command_with_conn(
    conn: &mut SqliteConnection,
    action: SessionAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Ls { user } => {
            list_sessions_impl(conn, user)?;
        }
        SessionAction::ReconcileMirrors { dry_run } => {
            reconcile_mirrors_impl(conn, dry_run)?;
        }
    }
    Ok(())
}

pub fn list_sessions_impl(
    conn: &mut SqliteConnection,
    user_identifier: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = match user_identifier {
        Some(identifier) => {
            let user = resolve_user(conn, &identifier)?;
            get_user_sessions(conn, user.id)?
        }
        None => list_all_sessions(conn)?,
    };

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    let now = Utc::now().naive_utc();
    println!("Sessions:");
    for session in sessions {
        let mirror = match session.mirror_session_id {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        println!(
            "  ID: {}, User: {}, Counterpart: {} ({}), Subject: {}, Start: {}, Status: {}, Cost: {}, Mirror: {}",
            session.id,
            session.user_id,
            session.counterpart_name,
            session.counterpart_id,
            session.subject,
            session.start_time,
            session.effective_status(now),
            session.cost,
            mirror
        );
    }

    Ok(())
}

/// Walks every session and fixes mirror cross-references in three cases:
/// a reference pointing at a deleted row is re-resolved or cleared, and a
/// row with no reference gets one stamped when a proximity match exists.
pub fn reconcile_mirrors_impl(
    conn: &mut SqliteConnection,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = list_all_sessions(conn)?;
    let mut repaired = 0;
    let mut cleared = 0;
    let mut stamped = 0;

    for session in &sessions {
        match session.mirror_session_id {
            Some(mirror_id) => {
                if get_session_by_id(conn, mirror_id)?.is_some() {
                    continue;
                }
                // Dangling reference: the counterpart row is gone.
                match find_mirror_by_proximity(conn, session)? {
                    Some(mirror) => {
                        println!(
                            "Session {}: mirror {} missing, re-pointing to {}",
                            session.id, mirror_id, mirror.id
                        );
                        if !dry_run {
                            set_mirror_reference(conn, session.id, Some(mirror.id))?;
                        }
                        repaired += 1;
                    }
                    None => {
                        println!(
                            "Session {}: mirror {} missing, no replacement found; clearing",
                            session.id, mirror_id
                        );
                        if !dry_run {
                            set_mirror_reference(conn, session.id, None)?;
                        }
                        cleared += 1;
                    }
                }
            }
            None => {
                if let Some(mirror) = find_mirror_by_proximity(conn, session)? {
                    println!(
                        "Session {}: no cross-reference, stamping mirror {}",
                        session.id, mirror.id
                    );
                    if !dry_run {
                        set_mirror_reference(conn, session.id, Some(mirror.id))?;
                    }
                    stamped += 1;
                }
            }
        }
    }

    let prefix = if dry_run { "Would change" } else { "Changed" };
    println!(
        "{}: {} repaired, {} cleared, {} stamped ({} sessions scanned).",
        prefix,
        repaired,
        cleared,
        stamped,
        sessions.len()
    );

    Ok(())
}
