//! API handlers for the Rentwear backend

mod health;
mod rental;
mod wallet;

pub use health::health_check;
pub use rental::*;
pub use wallet::*;

pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};
