pub mod booking_request;
mod db;
pub mod session;
pub mod testing;
pub mod token;
pub mod user;

pub use db::*;
