// tutorhub-admin/src/main.rs

use clap::{Parser, Subcommand};

mod admin_cli;

use admin_cli::request_commands::{RequestAction, handle_request_command_with_conn};
use admin_cli::session_commands::{SessionAction, handle_session_command_with_conn};
use admin_cli::token_commands::{TokenAction, handle_token_command_with_conn};
use admin_cli::user_commands::{UserAction, handle_user_command_with_conn};
use admin_cli::utils::establish_connection;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "tutorhub-admin")]
#[command(about = "Administration CLI for the TutorHub database")]
#[command(version)]
struct Cli {
    /// Show extended version information
    #[arg(long, action = clap::ArgAction::SetTrue)]
    version_info: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Manage users")]
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    #[command(about = "Inspect and adjust token balances")]
    Tokens {
        #[command(subcommand)]
        action: TokenAction,
    },
    #[command(about = "Inspect sessions and repair mirror cross-references")]
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    #[command(about = "Inspect booking requests")]
    Request {
        #[command(subcommand)]
        action: RequestAction,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.version_info {
        println!("tutorhub-admin {}", built_info::PKG_VERSION);
        println!("Built: {}", built_info::BUILT_TIME_UTC);
        if let Some(commit) = built_info::GIT_COMMIT_HASH {
            println!("Git commit: {}", commit);
        }
        return;
    }

    let Some(command) = cli.command else {
        eprintln!("No command given; run with --help for usage.");
        std::process::exit(2);
    };

    let result = establish_connection().and_then(|mut conn| match command {
        Commands::User { action } => handle_user_command_with_conn(&mut conn, action),
        Commands::Tokens { action } => handle_token_command_with_conn(&mut conn, action),
        Commands::Session { action } => handle_session_command_with_conn(&mut conn, action),
        Commands::Request { action } => handle_request_command_with_conn(&mut conn, action),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
