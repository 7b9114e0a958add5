//! Rental status state machine
//!
//! `requested -> approved -> active -> returned -> completed`, with
//! `rejected` and `cancelled` as terminal off-ramps. Every function here is
//! pure: it checks a proposed change against a loaded [`Rental`] and returns
//! the change plus the side effects the service must persist with it.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::model::{DeliveryStatus, PaymentStatus, Rental, RentalStatus};
use super::pricing;

/// Reason stored when an owner declines without giving one
pub const DEFAULT_REJECTION_REASON: &str = "Request declined by owner";

/// Who is acting on a rental
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Renter,
    Owner,
    DeliveryPartner,
    Admin,
    /// Background settlement and implicit transitions
    System,
}

impl Party {
    /// Resolve the acting user's relation to the rental. Admins always act as
    /// admins so that their override applies.
    pub fn of(rental: &Rental, user_id: Uuid, is_admin: bool) -> Option<Party> {
        if is_admin {
            Some(Party::Admin)
        } else if rental.owner_id == user_id {
            Some(Party::Owner)
        } else if rental.renter_id == user_id {
            Some(Party::Renter)
        } else if rental.delivery_partner_id == Some(user_id) {
            Some(Party::DeliveryPartner)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Renter => "renter",
            Party::Owner => "owner",
            Party::DeliveryPartner => "delivery partner",
            Party::Admin => "admin",
            Party::System => "system",
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, Party::Admin | Party::System)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Cannot move rental from {from} to {to}")]
    InvalidTransition { from: RentalStatus, to: RentalStatus },

    #[error("Rental is {0}; this action requires an active rental")]
    NotActive(RentalStatus),

    #[error("Delivery cannot move from {from} to {to}")]
    InvalidDeliveryStep {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("A {party} may not {action}")]
    Forbidden { party: Party, action: &'static str },

    #[error("Invalid extension: {0}")]
    InvalidExtension(String),
}

/// Side effect that must be persisted together with a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Return captured payment to the renter
    Refund { amount: f64 },
    /// Return the deposit minus any damage deduction
    ReleaseDeposit {
        refund_amount: f64,
        damage_deduction: f64,
    },
    /// Settle the rent component with the owner
    CreditOwner { amount: f64 },
    /// Pick a delivery partner for the outbound leg
    AssignDelivery,
    /// Product becomes `on_rent`
    OccupyProduct,
    /// Product becomes `active` again
    ReleaseProduct,
}

/// A checked status change
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub rental_id: Uuid,
    pub from: RentalStatus,
    pub to: RentalStatus,
    pub rejection_reason: Option<String>,
    pub effects: Vec<Effect>,
}

impl Transition {
    /// Repeating a status update to the current status changes nothing
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    /// Apply the change to an in-memory rental
    pub fn apply(&self, rental: &mut Rental) {
        if self.is_noop() {
            return;
        }
        rental.status = self.to;
        if let Some(reason) = &self.rejection_reason {
            rental.rejection_reason = Some(reason.clone());
        }
        for effect in &self.effects {
            match effect {
                Effect::Refund { amount } => {
                    rental.payment_status = PaymentStatus::Refunded;
                    rental.refund_amount = Some(*amount);
                }
                Effect::ReleaseDeposit { refund_amount, .. } => {
                    rental.refund_amount = Some(*refund_amount);
                }
                _ => {}
            }
        }
        rental.updated_at = Utc::now();
    }
}

impl RentalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RentalStatus::Completed | RentalStatus::Rejected | RentalStatus::Cancelled
        )
    }

    /// Approved and active rentals hold the product exclusively
    pub fn occupies_product(&self) -> bool {
        matches!(self, RentalStatus::Approved | RentalStatus::Active)
    }

    /// The product was taken for this rental and has not been released yet.
    /// Wider than [`Self::occupies_product`]: a returned rental still holds
    /// the product until it settles.
    pub fn holds_product(&self) -> bool {
        self.occupies_product() || *self == RentalStatus::Returned
    }

    /// Structural legality, before considering who is acting
    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        use RentalStatus::*;
        match (*self, next) {
            (Requested, Approved) | (Requested, Rejected) => true,
            (Approved, Active) => true,
            (Active, Returned) => true,
            (Returned, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

fn authorize(party: Party, from: RentalStatus, to: RentalStatus) -> Result<(), LifecycleError> {
    use RentalStatus::*;
    let allowed = match party {
        Party::Admin => true,
        Party::System => matches!(to, Rejected | Active | Returned | Completed),
        Party::Owner => match to {
            Approved | Rejected | Active | Returned => true,
            Cancelled => matches!(from, Requested | Approved),
            _ => false,
        },
        Party::Renter => to == Cancelled && matches!(from, Requested | Approved),
        Party::DeliveryPartner => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(LifecycleError::Forbidden {
            party,
            action: match to {
                Approved => "approve this rental",
                Rejected => "reject this rental",
                Active => "activate this rental",
                Returned => "mark this rental returned",
                Completed => "complete this rental",
                Cancelled => "cancel this rental",
                Requested => "reopen this rental",
            },
        })
    }
}

/// Check a status change and derive its side effects.
///
/// Updating to the status the rental already has yields a no-op transition
/// without effects, so a repeated rejection never refunds twice.
pub fn plan_status_change(
    rental: &Rental,
    party: Party,
    target: RentalStatus,
    rejection_reason: Option<String>,
    damage_deduction: Option<f64>,
) -> Result<Transition, LifecycleError> {
    let from = rental.status;
    let mut transition = Transition {
        rental_id: rental.id,
        from,
        to: target,
        rejection_reason: None,
        effects: Vec::new(),
    };

    if from == target {
        return Ok(transition);
    }
    if !from.can_transition_to(target) {
        return Err(LifecycleError::InvalidTransition { from, to: target });
    }
    authorize(party, from, target)?;

    match target {
        RentalStatus::Approved => {
            transition.effects.push(Effect::OccupyProduct);
            if rental.delivery_status == DeliveryStatus::NotAssigned {
                transition.effects.push(Effect::AssignDelivery);
            }
        }
        RentalStatus::Rejected => {
            let reason = rejection_reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());
            transition.rejection_reason = Some(reason);
            if rental.payment_status == PaymentStatus::Paid {
                transition.effects.push(Effect::Refund {
                    amount: rental.total_amount,
                });
            }
        }
        RentalStatus::Cancelled => {
            if rental.payment_status == PaymentStatus::Paid {
                // once the item has gone out only the deposit comes back
                let amount = match from {
                    RentalStatus::Requested | RentalStatus::Approved => rental.total_amount,
                    _ => rental.security_deposit,
                };
                transition.effects.push(Effect::Refund { amount });
            }
            if from.holds_product() {
                transition.effects.push(Effect::ReleaseProduct);
            }
        }
        RentalStatus::Completed => {
            let damage = damage_deduction
                .unwrap_or(0.0)
                .clamp(0.0, rental.security_deposit);
            transition.effects.push(Effect::ReleaseDeposit {
                refund_amount: rental.security_deposit - damage,
                damage_deduction: damage,
            });
            transition.effects.push(Effect::CreditOwner {
                amount: rental.total_rent,
            });
            transition.effects.push(Effect::ReleaseProduct);
        }
        RentalStatus::Active | RentalStatus::Returned | RentalStatus::Requested => {}
    }

    Ok(transition)
}

/// A checked extension of an active rental
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub rental_id: Uuid,
    pub additional_hours: i64,
    pub additional_cost: f64,
    pub new_end_date: DateTime<Utc>,
    pub new_duration_hours: i64,
    pub new_total_rent: f64,
    pub new_total_amount: f64,
}

impl Extension {
    pub fn apply(&self, rental: &mut Rental) {
        rental.end_date = self.new_end_date;
        rental.duration_hours = self.new_duration_hours;
        rental.total_rent = self.new_total_rent;
        rental.total_amount = self.new_total_amount;
        rental.updated_at = Utc::now();
    }
}

/// Extend an active rental. Status is unchanged.
pub fn plan_extension(
    rental: &Rental,
    party: Party,
    additional_hours: i64,
) -> Result<Extension, LifecycleError> {
    if !matches!(party, Party::Renter | Party::Admin) {
        return Err(LifecycleError::Forbidden {
            party,
            action: "extend this rental",
        });
    }
    if rental.status != RentalStatus::Active {
        return Err(LifecycleError::NotActive(rental.status));
    }
    if additional_hours <= 0 {
        return Err(LifecycleError::InvalidExtension(
            "additional hours must be positive".to_string(),
        ));
    }

    let additional_cost = pricing::extension_cost(rental.hourly_price, additional_hours);
    Ok(Extension {
        rental_id: rental.id,
        additional_hours,
        additional_cost,
        new_end_date: rental.end_date + Duration::hours(additional_hours),
        new_duration_hours: rental.duration_hours + additional_hours,
        new_total_rent: rental.total_rent + additional_cost,
        new_total_amount: rental.total_amount + additional_cost,
    })
}

/// Renter asks for the item to be collected.
///
/// Status stays `active` so the return leg of the delivery machine can run;
/// returns `false` when a return was already requested.
pub fn plan_return_request(rental: &Rental, party: Party) -> Result<bool, LifecycleError> {
    if !matches!(party, Party::Renter | Party::Admin) {
        return Err(LifecycleError::Forbidden {
            party,
            action: "request a return",
        });
    }
    if rental.status != RentalStatus::Active {
        return Err(LifecycleError::NotActive(rental.status));
    }
    Ok(!rental.pickup_requested)
}
