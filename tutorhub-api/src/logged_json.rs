//! A `Json` data guard that logs deserialization failures.
//!
//! Rocket's stock `Json<T>` guard rejects malformed bodies with a 422 but
//! leaves nothing in the server log, which makes client-side payload bugs
//! invisible. `LoggedJson<T>` behaves identically while recording the
//! request URI and parse error before the rejection propagates.

use rocket::data::{Data, FromData, Outcome};
use rocket::request::Request;
use rocket::serde::json::Json;
use serde::Deserialize;

pub struct LoggedJson<T>(Json<T>);

impl<T> LoggedJson<T> {
    pub fn into_inner(self) -> T {
        self.0.into_inner()
    }
}

impl<T> std::ops::Deref for LoggedJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T: Deserialize<'r>> FromData<'r> for LoggedJson<T> {
    type Error = rocket::serde::json::Error<'r>;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            Outcome::Success(json) => Outcome::Success(LoggedJson(json)),
            Outcome::Error((status, err)) => {
                warn!("Failed to parse JSON body for {}: {:?}", req.uri(), err);
                Outcome::Error((status, err))
            }
            Outcome::Forward(forward) => Outcome::Forward(forward),
        }
    }
}
