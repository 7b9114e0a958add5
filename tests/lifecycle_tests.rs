//! Rental Lifecycle Scenario Tests
//!
//! Walks rentals through the pure planning functions end to end: pricing,
//! approval with sibling rejection, both delivery legs, extension and
//! settlement.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use rentwear_server::rental::delivery::{plan_assignment, plan_delivery_step};
use rentwear_server::rental::lifecycle::{plan_extension, plan_return_request, plan_status_change};
use rentwear_server::rental::overlap::{intervals_overlap, resolve_approval};
use rentwear_server::rental::pricing::quote_window;
use rentwear_server::rental::{
    DeliveryStatus, Effect, LifecycleError, OverlapPolicy, Party, PaymentStatus, PricingInput,
    ProductCategory, Rental, RentalStatus, AUTO_REJECT_REASON,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
}

fn jacket() -> PricingInput {
    PricingInput {
        hourly_price: 100.0,
        retail_price: 2000.0,
        category: ProductCategory::Jackets,
        deposit_override: None,
    }
}

fn request(product_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Rental {
    let quote = quote_window(&jacket(), start, end).unwrap();
    Rental {
        id: Uuid::new_v4(),
        product_id,
        renter_id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        owner_username: "meera".to_string(),
        start_date: start,
        end_date: end,
        duration_hours: quote.duration_hours,
        hourly_price: quote.hourly_price,
        total_rent: quote.total_rent,
        service_fee: quote.service_fee,
        security_deposit: quote.security_deposit,
        total_amount: quote.final_total,
        refund_amount: None,
        status: RentalStatus::Requested,
        delivery_status: DeliveryStatus::NotAssigned,
        delivery_partner_id: None,
        pickup_requested: false,
        payment_status: PaymentStatus::Paid,
        delivery_address: "12 MG Road".to_string(),
        pickup_address: None,
        pickup_notes: None,
        rejection_reason: None,
        created_at: start - Duration::days(2),
        updated_at: start - Duration::days(2),
    }
}

fn step(rental: &mut Rental, party: Party, to: DeliveryStatus) {
    plan_delivery_step(rental, party, to, None)
        .unwrap()
        .apply(rental);
}

// ============================================================================
// Pricing
// ============================================================================

#[test]
fn test_ten_hour_jacket_quote() {
    let quote = quote_window(&jacket(), at(1, 10), at(1, 20)).unwrap();
    assert_eq!(quote.duration_hours, 10);
    assert_eq!(quote.total_rent, 1000.0);
    assert_eq!(quote.service_fee, 50.0);
    // min(1000 * 1.0, 2000 * 0.4)
    assert_eq!(quote.security_deposit, 800.0);
    assert_eq!(quote.final_total, 1850.0);
    assert!(quote.ensure_matches(1850.0).is_ok());
    assert!(quote.ensure_matches(1800.0).is_err());
}

// ============================================================================
// Approval and overlap resolution
// ============================================================================

#[test]
fn test_approval_rejects_every_pending_sibling() {
    let product = Uuid::new_v4();
    let mut rentals = vec![
        request(product, at(1, 10), at(1, 20)),
        request(product, at(1, 15), at(2, 10)),
        request(product, at(10, 10), at(11, 10)),
    ];
    let target = rentals[0].id;

    let outcome =
        resolve_approval(&mut rentals, target, Party::Owner, OverlapPolicy::AllPending).unwrap();

    assert_eq!(outcome.rejected_count(), 2);
    assert_eq!(rentals[0].status, RentalStatus::Approved);
    for sibling in &rentals[1..] {
        assert_eq!(sibling.status, RentalStatus::Rejected);
        assert_eq!(sibling.rejection_reason.as_deref(), Some(AUTO_REJECT_REASON));
        assert_eq!(sibling.payment_status, PaymentStatus::Refunded);
        assert_eq!(sibling.refund_amount, Some(sibling.total_amount));
    }
    assert!(outcome.approved.effects.contains(&Effect::OccupyProduct));
    assert!(outcome.approved.effects.contains(&Effect::AssignDelivery));
}

#[test]
fn test_interval_policy_keeps_disjoint_requests() {
    let product = Uuid::new_v4();
    let mut rentals = vec![
        request(product, at(1, 10), at(1, 20)),
        request(product, at(1, 15), at(2, 10)),
        request(product, at(10, 10), at(11, 10)),
    ];
    let target = rentals[0].id;

    let outcome =
        resolve_approval(&mut rentals, target, Party::Owner, OverlapPolicy::Interval).unwrap();

    assert_eq!(outcome.rejected_count(), 1);
    assert_eq!(rentals[1].status, RentalStatus::Rejected);
    assert_eq!(rentals[2].status, RentalStatus::Requested);
}

#[test]
fn test_touching_intervals_overlap() {
    assert!(intervals_overlap(at(1, 10), at(1, 20), at(1, 20), at(2, 10)));
    assert!(!intervals_overlap(at(1, 10), at(1, 20), at(1, 21), at(2, 10)));
}

#[test]
fn test_renter_cannot_approve() {
    let product = Uuid::new_v4();
    let mut rentals = vec![
        request(product, at(1, 10), at(1, 20)),
        request(product, at(1, 15), at(2, 10)),
    ];
    let target = rentals[0].id;

    let err = resolve_approval(&mut rentals, target, Party::Renter, OverlapPolicy::AllPending)
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Forbidden { .. }));
    assert!(rentals.iter().all(|r| r.status == RentalStatus::Requested));
}

#[test]
fn test_repeated_rejection_does_not_refund_twice() {
    let mut rental = request(Uuid::new_v4(), at(1, 10), at(1, 20));

    let first = plan_status_change(&rental, Party::Owner, RentalStatus::Rejected, None, None)
        .unwrap();
    assert_eq!(first.effects.len(), 1);
    first.apply(&mut rental);

    let second = plan_status_change(&rental, Party::Owner, RentalStatus::Rejected, None, None)
        .unwrap();
    assert!(second.is_noop());
    assert!(second.effects.is_empty());
}

#[test]
fn test_approved_rental_cannot_be_approved_again() {
    let product = Uuid::new_v4();
    let mut rentals = vec![request(product, at(1, 10), at(1, 20))];
    rentals[0].status = RentalStatus::Approved;
    let target = rentals[0].id;

    let err = resolve_approval(&mut rentals, target, Party::Owner, OverlapPolicy::AllPending)
        .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::InvalidTransition {
            from: RentalStatus::Approved,
            to: RentalStatus::Approved,
        }
    );
}

// ============================================================================
// Full lifecycle
// ============================================================================

#[test]
fn test_rental_from_request_to_completion() {
    let product = Uuid::new_v4();
    let partner = Uuid::new_v4();
    let mut rentals = vec![request(product, at(1, 10), at(1, 20))];
    let target = rentals[0].id;
    resolve_approval(&mut rentals, target, Party::Owner, OverlapPolicy::AllPending).unwrap();
    let mut rental = rentals.remove(0);

    plan_assignment(&rental, Party::System, partner)
        .unwrap()
        .apply(&mut rental);
    assert_eq!(rental.delivery_status, DeliveryStatus::Assigned);
    assert_eq!(
        Party::of(&rental, partner, false),
        Some(Party::DeliveryPartner)
    );

    step(&mut rental, Party::DeliveryPartner, DeliveryStatus::PickedFromSeller);
    step(&mut rental, Party::DeliveryPartner, DeliveryStatus::InTransitToBuyer);
    step(&mut rental, Party::DeliveryPartner, DeliveryStatus::DeliveredToBuyer);
    assert_eq!(rental.status, RentalStatus::Active);

    let extension = plan_extension(&rental, Party::Renter, 5).unwrap();
    assert_eq!(extension.additional_cost, 500.0);
    extension.apply(&mut rental);
    assert_eq!(rental.end_date, at(2, 1));
    assert_eq!(rental.total_amount, 2350.0);
    assert_eq!(rental.status, RentalStatus::Active);

    // no pickup before the renter asks for one
    assert!(plan_delivery_step(
        &rental,
        Party::DeliveryPartner,
        DeliveryStatus::PickedFromBuyer,
        None
    )
    .is_err());

    assert!(plan_return_request(&rental, Party::Renter).unwrap());
    rental.pickup_requested = true;
    assert!(!plan_return_request(&rental, Party::Renter).unwrap());
    assert_eq!(rental.status, RentalStatus::Active);

    step(&mut rental, Party::DeliveryPartner, DeliveryStatus::PickedFromBuyer);
    step(&mut rental, Party::DeliveryPartner, DeliveryStatus::InTransitToSeller);
    step(&mut rental, Party::DeliveryPartner, DeliveryStatus::ReturnedToSeller);
    assert_eq!(rental.status, RentalStatus::Returned);

    let settle =
        plan_status_change(&rental, Party::System, RentalStatus::Completed, None, Some(100.0))
            .unwrap();
    assert_eq!(
        settle.effects,
        vec![
            Effect::ReleaseDeposit {
                refund_amount: 700.0,
                damage_deduction: 100.0,
            },
            Effect::CreditOwner { amount: 1500.0 },
            Effect::ReleaseProduct,
        ]
    );
    settle.apply(&mut rental);
    assert_eq!(rental.status, RentalStatus::Completed);
    assert_eq!(rental.refund_amount, Some(700.0));
}

#[test]
fn test_delivery_steps_cannot_be_skipped() {
    let mut rental = request(Uuid::new_v4(), at(1, 10), at(1, 20));
    rental.status = RentalStatus::Approved;
    rental.delivery_status = DeliveryStatus::Assigned;

    let err = plan_delivery_step(
        &rental,
        Party::DeliveryPartner,
        DeliveryStatus::DeliveredToBuyer,
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::InvalidDeliveryStep {
            from: DeliveryStatus::Assigned,
            to: DeliveryStatus::DeliveredToBuyer,
        }
    );

    // admins may jump
    let jump =
        plan_delivery_step(&rental, Party::Admin, DeliveryStatus::DeliveredToBuyer, None).unwrap();
    assert_eq!(jump.implied_status, Some(RentalStatus::Active));
}

#[test]
fn test_extension_requires_active_rental() {
    let rental = request(Uuid::new_v4(), at(1, 10), at(1, 20));
    assert_eq!(
        plan_extension(&rental, Party::Renter, 4).unwrap_err(),
        LifecycleError::NotActive(RentalStatus::Requested)
    );
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancellation_before_and_after_handover() {
    let mut rental = request(Uuid::new_v4(), at(1, 10), at(1, 20));
    rental.status = RentalStatus::Approved;

    let early = plan_status_change(&rental, Party::Renter, RentalStatus::Cancelled, None, None)
        .unwrap();
    assert_eq!(
        early.effects,
        vec![
            Effect::Refund { amount: 1850.0 },
            Effect::ReleaseProduct,
        ]
    );

    rental.status = RentalStatus::Active;
    assert!(matches!(
        plan_status_change(&rental, Party::Renter, RentalStatus::Cancelled, None, None),
        Err(LifecycleError::Forbidden { .. })
    ));

    let forced = plan_status_change(&rental, Party::Admin, RentalStatus::Cancelled, None, None)
        .unwrap();
    assert_eq!(
        forced.effects,
        vec![Effect::Refund { amount: 800.0 }, Effect::ReleaseProduct]
    );
}
