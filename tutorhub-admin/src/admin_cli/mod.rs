pub mod request_commands;
pub mod session_commands;
pub mod token_commands;
pub mod user_commands;
pub mod utils;
