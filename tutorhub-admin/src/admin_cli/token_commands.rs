use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use tutorhub_api::orm::token::{get_token_ledger, refund_tokens};

use crate::admin_cli::utils::resolve_user;

#[derive(Subcommand)]
pub enum TokenAction {
    #[command(about = "Show a user's current token balance")]
    Balance {
        #[arg(help = "User ID or email address")]
        user: String,
    },
    #[command(about = "Credit tokens to a user (recorded in the ledger)")]
    Grant {
        #[arg(help = "User ID or email address")]
        user: String,
        #[arg(short, long, help = "Number of tokens to credit")]
        amount: i32,
        #[arg(short, long, default_value = "admin grant", help = "Ledger reason")]
        reason: String,
    },
    #[command(about = "Show a user's ledger entries, newest first")]
    Ledger {
        #[arg(help = "User ID or email address")]
        user: String,
        #[arg(short, long, help = "Limit to the most recent N entries")]
        limit: Option<usize>,
    },
}

pub fn handle_token_command_with_conn(
    conn: &mut SqliteConnection,
    action: TokenAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TokenAction::Balance { user } => {
            balance_impl(conn, &user)?;
        }
        TokenAction::Grant { user, amount, reason } => {
            grant_impl(conn, &user, amount, &reason)?;
        }
        TokenAction::Ledger { user, limit } => {
            ledger_impl(conn, &user, limit)?;
        }
    }
    Ok(())
}

pub fn balance_impl(
    conn: &mut SqliteConnection,
    user_identifier: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = resolve_user(conn, user_identifier)?;
    println!("{} (ID: {}): {} tokens", user.email, user.id, user.token_balance);
    Ok(())
}

pub fn grant_impl(
    conn: &mut SqliteConnection,
    user_identifier: &str,
    amount: i32,
    reason: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = resolve_user(conn, user_identifier)?;
    let mutation = refund_tokens(conn, user.id, amount, reason)?;
    println!(
        "Credited {} tokens to {} (ID: {}). New balance: {}",
        amount, user.email, user.id, mutation.new_balance
    );
    Ok(())
}

pub fn ledger_impl(
    conn: &mut SqliteConnection,
    user_identifier: &str,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = resolve_user(conn, user_identifier)?;
    let entries = get_token_ledger(conn, user.id)?;

    if entries.is_empty() {
        println!("No ledger entries for {} (ID: {}).", user.email, user.id);
        return Ok(());
    }

    println!("Ledger for {} (ID: {}), newest first:", user.email, user.id);
    let shown = match limit {
        Some(n) => &entries[..entries.len().min(n)],
        None => &entries[..],
    };
    for entry in shown {
        println!(
            "  {} {:+} -> {} ({}) at {}",
            entry.id, entry.amount, entry.balance_after, entry.reason, entry.created_at
        );
    }
    if let Some(n) = limit {
        if entries.len() > n {
            println!("  ... {} older entries not shown", entries.len() - n);
        }
    }

    Ok(())
}
