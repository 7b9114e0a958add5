//! Rental domain module
//!
//! The rental lifecycle and delivery state machines, overlap resolution,
//! pricing, and the service that persists them.

pub mod delivery;
pub mod lifecycle;
mod model;
pub mod overlap;
pub mod pricing;
mod service;
pub mod settlement;

pub use delivery::{DeliveryStep, PartnerLoad};
pub use lifecycle::{Effect, LifecycleError, Party, Transition};
pub use model::*;
pub use overlap::{OverlapPolicy, AUTO_REJECT_REASON};
pub use pricing::{PriceQuote, PricingError, PricingInput, ProductCategory, SERVICE_FEE};
pub use service::{Actor, Approval, RentalService};
