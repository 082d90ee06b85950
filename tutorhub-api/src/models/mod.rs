pub mod booking_request;
pub mod session;
pub mod token_ledger;
pub mod user;

// Re-export models for easier access
pub use booking_request::*;
pub use session::*;
pub use token_ledger::*;
pub use user::*;
