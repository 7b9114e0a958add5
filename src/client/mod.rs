//! Rental API client
//!
//! Typed HTTP access to the rental endpoints, the client-side error
//! taxonomy, and the persisted session.

mod api;
mod error;
mod session;

pub use api::RentalApiClient;
pub use error::{ActionOutcome, ClientError, NETWORK_ERROR_MESSAGE};
pub use session::{Session, SessionError};
