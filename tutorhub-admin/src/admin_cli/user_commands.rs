use std::io::{self, Write};

use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use regex::Regex;
use tutorhub_api::models::{User, UserInput};
use tutorhub_api::orm::user::{delete_user, insert_user, list_all_users};

#[derive(Subcommand)]
pub enum UserAction {
    #[command(about = "Add a new user")]
    Add {
        #[arg(short, long, help = "Display name")]
        name: String,
        #[arg(short, long, help = "Email address")]
        email: String,
        #[arg(short, long, help = "Role: student or tutor")]
        role: String,
        #[arg(short, long, default_value_t = 0, help = "Starting token balance")]
        balance: i32,
    },
    #[command(about = "List users, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
    },
    #[command(about = "Remove users matching search term")]
    Rm {
        #[arg(
            help = "Search term to match users for removal (regex by default, use -F for fixed string)"
        )]
        search_term: String,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

pub fn handle_user_command_with_conn(
    conn: &mut SqliteConnection,
    action: UserAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserAction::Add { name, email, role, balance } => {
            add_user_impl(conn, name, email, role, balance)?;
        }
        UserAction::Ls { search_term, fixed_string } => {
            list_users_impl(conn, search_term, fixed_string)?;
        }
        UserAction::Rm { search_term, fixed_string, yes } => {
            remove_users_impl(conn, search_term, fixed_string, yes)?;
        }
    }
    Ok(())
}

/// Filters users by email against a regex or fixed-string search term.
fn filter_users(
    users: Vec<User>,
    search_term: &str,
    fixed_string: bool,
) -> Result<Vec<User>, Box<dyn std::error::Error>> {
    if fixed_string {
        Ok(users.into_iter().filter(|user| user.email.contains(search_term)).collect())
    } else {
        let regex = Regex::new(search_term)
            .map_err(|e| format!("Invalid regex pattern '{}': {}", search_term, e))?;
        Ok(users.into_iter().filter(|user| regex.is_match(&user.email)).collect())
    }
}

pub fn add_user_impl(
    conn: &mut SqliteConnection,
    name: String,
    email: String,
    role: String,
    balance: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let created = insert_user(conn, UserInput { name, email, role, token_balance: balance })?;

    println!("User created successfully!");
    println!("ID: {}", created.id);
    println!("Name: {}", created.name);
    println!("Email: {}", created.email);
    println!("Role: {}", created.role);
    println!("Token balance: {}", created.token_balance);

    Ok(())
}

pub fn list_users_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let users = list_all_users(conn)?;

    let filtered_users = match search_term {
        Some(term) => filter_users(users, &term, fixed_string)?,
        None => users,
    };

    if filtered_users.is_empty() {
        println!("No users found.");
    } else {
        println!("Users:");
        for user in filtered_users {
            println!(
                "  ID: {}, Name: {}, Email: {}, Role: {}, Balance: {}, Created: {}",
                user.id, user.name, user.email, user.role, user.token_balance, user.created_at
            );
        }
    }

    Ok(())
}

pub fn remove_users_impl(
    conn: &mut SqliteConnection,
    search_term: String,
    fixed_string: bool,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let users = list_all_users(conn)?;
    let matching_users = filter_users(users, &search_term, fixed_string)?;

    if matching_users.is_empty() {
        println!("No users found matching the search term.");
        return Ok(());
    }

    println!("Found {} user(s) matching the search term:", matching_users.len());
    for user in &matching_users {
        println!("  ID: {}, Email: {}, Role: {}", user.id, user.email, user.role);
    }

    if !yes {
        print!(
            "Are you sure you want to delete these {} user(s)? [y/N]: ",
            matching_users.len()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let mut deleted_count = 0;
    let mut errors = Vec::new();

    for user in matching_users {
        match delete_user(conn, user.id) {
            Ok(rows_affected) => {
                if rows_affected > 0 {
                    deleted_count += 1;
                    println!("Deleted user: {} (ID: {})", user.email, user.id);
                }
            }
            Err(e) => {
                // Foreign keys block deletion while sessions, requests, or
                // ledger rows still reference the user.
                errors.push(format!(
                    "Failed to delete user {} (ID: {}): {}",
                    user.email, user.id, e
                ));
            }
        }
    }

    println!("Successfully deleted {} user(s).", deleted_count);

    if !errors.is_empty() {
        println!("Errors encountered:");
        for error in errors {
            println!("  {}", error);
        }
        return Err("Some deletions failed".into());
    }

    Ok(())
}
