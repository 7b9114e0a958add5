//! Delivery sub-state machine and partner assignment
//!
//! Linear, no skipping:
//! `not_assigned -> assigned -> picked_from_seller -> in_transit_to_buyer ->
//! delivered_to_buyer -> picked_from_buyer -> in_transit_to_seller ->
//! returned_to_seller`. The return leg starts only after the renter asked for
//! a pickup. Admins may jump to any step.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::{LifecycleError, Party};
use super::model::{DeliveryStatus, Rental, RentalStatus};

impl DeliveryStatus {
    /// The status a rental must be in before moving to `self`
    pub fn required_predecessor(&self) -> Option<DeliveryStatus> {
        use DeliveryStatus::*;
        match self {
            NotAssigned => None,
            Assigned => Some(NotAssigned),
            PickedFromSeller => Some(Assigned),
            InTransitToBuyer => Some(PickedFromSeller),
            DeliveredToBuyer => Some(InTransitToBuyer),
            PickedFromBuyer => Some(DeliveredToBuyer),
            InTransitToSeller => Some(PickedFromBuyer),
            ReturnedToSeller => Some(InTransitToSeller),
        }
    }

    /// Steps of the buyer-to-seller leg
    pub fn is_return_leg(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::PickedFromBuyer
                | DeliveryStatus::InTransitToSeller
                | DeliveryStatus::ReturnedToSeller
        )
    }
}

/// A checked delivery change
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryStep {
    pub rental_id: Uuid,
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
    pub notes: Option<String>,
    /// Set when the step is an assignment
    pub partner_id: Option<Uuid>,
    /// Rental status change implied by the step
    pub implied_status: Option<RentalStatus>,
}

impl DeliveryStep {
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.partner_id.is_none()
    }

    pub fn apply(&self, rental: &mut Rental) {
        if self.is_noop() {
            return;
        }
        rental.delivery_status = self.to;
        if let Some(partner_id) = self.partner_id {
            rental.delivery_partner_id = Some(partner_id);
        }
        if let Some(status) = self.implied_status {
            rental.status = status;
        }
        rental.updated_at = Utc::now();
    }
}

fn implied_status(rental: &Rental, to: DeliveryStatus) -> Option<RentalStatus> {
    match (to, rental.status) {
        (DeliveryStatus::DeliveredToBuyer, RentalStatus::Approved) => Some(RentalStatus::Active),
        (DeliveryStatus::ReturnedToSeller, RentalStatus::Active) => Some(RentalStatus::Returned),
        _ => None,
    }
}

/// Check a delivery status update from a delivery partner (or an admin
/// override) and derive the rental status it implies.
pub fn plan_delivery_step(
    rental: &Rental,
    party: Party,
    target: DeliveryStatus,
    notes: Option<String>,
) -> Result<DeliveryStep, LifecycleError> {
    let from = rental.delivery_status;
    let step = DeliveryStep {
        rental_id: rental.id,
        from,
        to: target,
        notes,
        partner_id: None,
        implied_status: implied_status(rental, target),
    };

    if !matches!(party, Party::DeliveryPartner | Party::Admin) {
        return Err(LifecycleError::Forbidden {
            party,
            action: "update delivery status",
        });
    }
    if from == target {
        return Ok(DeliveryStep {
            implied_status: None,
            ..step
        });
    }
    if rental.status.is_terminal() {
        return Err(LifecycleError::InvalidDeliveryStep { from, to: target });
    }
    if party == Party::Admin {
        return Ok(step);
    }

    let in_order = target.required_predecessor() == Some(from);
    let leg_allowed = if target.is_return_leg() {
        // the return leg needs an active rental with a pickup requested
        target != DeliveryStatus::PickedFromBuyer
            || (rental.status == RentalStatus::Active && rental.pickup_requested)
    } else {
        // assignment goes through `plan_assignment`
        target != DeliveryStatus::Assigned
            && matches!(rental.status, RentalStatus::Approved | RentalStatus::Active)
    };

    if in_order && leg_allowed {
        Ok(step)
    } else {
        Err(LifecycleError::InvalidDeliveryStep { from, to: target })
    }
}

/// Assign (or reassign, before pickup) a delivery partner
pub fn plan_assignment(
    rental: &Rental,
    party: Party,
    partner_id: Uuid,
) -> Result<DeliveryStep, LifecycleError> {
    if !matches!(party, Party::Owner | Party::Admin | Party::System) {
        return Err(LifecycleError::Forbidden {
            party,
            action: "assign a delivery partner",
        });
    }
    let from = rental.delivery_status;
    let rejected = LifecycleError::InvalidDeliveryStep {
        from,
        to: DeliveryStatus::Assigned,
    };
    if rental.status.is_terminal() {
        return Err(rejected);
    }

    let before_pickup = matches!(from, DeliveryStatus::NotAssigned | DeliveryStatus::Assigned);
    let status_ok = matches!(rental.status, RentalStatus::Approved | RentalStatus::Active);
    let to = if before_pickup && status_ok {
        DeliveryStatus::Assigned
    } else if party.is_privileged() && from != DeliveryStatus::NotAssigned {
        // reassigning mid-route keeps the current leg
        from
    } else {
        return Err(rejected);
    };

    Ok(DeliveryStep {
        rental_id: rental.id,
        from,
        to,
        notes: None,
        partner_id: Some(partner_id),
        implied_status: None,
    })
}

/// Open assignment count for one delivery partner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PartnerLoad {
    pub partner_id: Uuid,
    pub open_assignments: i64,
}

/// Least loaded partner, ties broken by id so the choice is deterministic
pub fn pick_partner(loads: &[PartnerLoad]) -> Option<Uuid> {
    loads
        .iter()
        .min_by_key(|load| (load.open_assignments, load.partner_id))
        .map(|load| load.partner_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::lifecycle::tests::rental;

    fn at(status: RentalStatus, delivery: DeliveryStatus) -> Rental {
        let mut r = rental(status);
        r.delivery_status = delivery;
        r.delivery_partner_id = Some(Uuid::new_v4());
        r
    }

    #[test]
    fn test_outbound_leg_in_order() {
        let r = at(RentalStatus::Approved, DeliveryStatus::Assigned);
        let step =
            plan_delivery_step(&r, Party::DeliveryPartner, DeliveryStatus::PickedFromSeller, None)
                .unwrap();
        assert_eq!(step.implied_status, None);

        let r = at(RentalStatus::Approved, DeliveryStatus::Assigned);
        assert!(plan_delivery_step(
            &r,
            Party::DeliveryPartner,
            DeliveryStatus::InTransitToBuyer,
            None
        )
        .is_err());
    }

    #[test]
    fn test_delivery_activates_rental() {
        let mut r = at(RentalStatus::Approved, DeliveryStatus::InTransitToBuyer);
        let step = plan_delivery_step(
            &r,
            Party::DeliveryPartner,
            DeliveryStatus::DeliveredToBuyer,
            Some("left with guard".to_string()),
        )
        .unwrap();
        assert_eq!(step.implied_status, Some(RentalStatus::Active));
        step.apply(&mut r);
        assert_eq!(r.status, RentalStatus::Active);
        assert_eq!(r.delivery_status, DeliveryStatus::DeliveredToBuyer);
    }

    #[test]
    fn test_pickup_from_buyer_needs_return_request() {
        let r = at(RentalStatus::Active, DeliveryStatus::Assigned);
        let err =
            plan_delivery_step(&r, Party::DeliveryPartner, DeliveryStatus::PickedFromBuyer, None)
                .unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidDeliveryStep {
                from: DeliveryStatus::Assigned,
                to: DeliveryStatus::PickedFromBuyer
            }
        );

        let mut r = at(RentalStatus::Active, DeliveryStatus::DeliveredToBuyer);
        assert!(plan_delivery_step(
            &r,
            Party::DeliveryPartner,
            DeliveryStatus::PickedFromBuyer,
            None
        )
        .is_err());
        r.pickup_requested = true;
        assert!(plan_delivery_step(
            &r,
            Party::DeliveryPartner,
            DeliveryStatus::PickedFromBuyer,
            None
        )
        .is_ok());
    }

    #[test]
    fn test_return_to_seller_marks_returned() {
        let mut r = at(RentalStatus::Active, DeliveryStatus::InTransitToSeller);
        r.pickup_requested = true;
        let step =
            plan_delivery_step(&r, Party::DeliveryPartner, DeliveryStatus::ReturnedToSeller, None)
                .unwrap();
        assert_eq!(step.implied_status, Some(RentalStatus::Returned));
    }

    #[test]
    fn test_admin_override_skips_steps() {
        let r = at(RentalStatus::Approved, DeliveryStatus::Assigned);
        let step =
            plan_delivery_step(&r, Party::Admin, DeliveryStatus::DeliveredToBuyer, None).unwrap();
        assert_eq!(step.implied_status, Some(RentalStatus::Active));
    }

    #[test]
    fn test_renter_cannot_update_delivery() {
        let r = at(RentalStatus::Approved, DeliveryStatus::Assigned);
        assert!(matches!(
            plan_delivery_step(&r, Party::Renter, DeliveryStatus::PickedFromSeller, None),
            Err(LifecycleError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_repeated_update_is_noop() {
        let r = at(RentalStatus::Approved, DeliveryStatus::PickedFromSeller);
        let step =
            plan_delivery_step(&r, Party::DeliveryPartner, DeliveryStatus::PickedFromSeller, None)
                .unwrap();
        assert!(step.is_noop());
    }

    #[test]
    fn test_assignment() {
        let r = rental(RentalStatus::Approved);
        let partner = Uuid::new_v4();
        let step = plan_assignment(&r, Party::Owner, partner).unwrap();
        assert_eq!(step.to, DeliveryStatus::Assigned);
        assert_eq!(step.partner_id, Some(partner));

        let r = rental(RentalStatus::Requested);
        assert!(plan_assignment(&r, Party::Owner, partner).is_err());

        let r = at(RentalStatus::Active, DeliveryStatus::InTransitToBuyer);
        assert!(plan_assignment(&r, Party::Owner, partner).is_err());
        let step = plan_assignment(&r, Party::Admin, partner).unwrap();
        assert_eq!(step.to, DeliveryStatus::InTransitToBuyer);
    }

    #[test]
    fn test_pick_partner_least_loaded() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);
        let loads = [
            PartnerLoad { partner_id: c, open_assignments: 1 },
            PartnerLoad { partner_id: b, open_assignments: 0 },
            PartnerLoad { partner_id: a, open_assignments: 0 },
        ];
        assert_eq!(pick_partner(&loads), Some(a));
        assert_eq!(pick_partner(&[]), None);
    }
}
