//! Resolution of competing rental requests for the same product.
//!
//! Approving one request rejects its pending siblings. By default every other
//! pending request of the product is rejected regardless of dates; the
//! `Interval` policy narrows this to requests whose dates intersect. Outside
//! that policy [`intervals_overlap`] is advisory and only used for display.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use uuid::Uuid;

use super::lifecycle::{plan_status_change, LifecycleError, Party, Transition};
use super::model::{PendingRequestView, Rental, RentalStatus};

/// Reason stored on requests rejected by someone else's approval
pub const AUTO_REJECT_REASON: &str = "auto-rejected: overlapping approval";

/// Closed intervals intersect: `start1 <= end2 && end1 >= start2`
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 <= end2 && end1 >= start2
}

fn rentals_overlap(a: &Rental, b: &Rental) -> bool {
    intervals_overlap(a.start_date, a.end_date, b.start_date, b.end_date)
}

/// Which siblings an approval rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Every other pending request of the product
    #[default]
    AllPending,
    /// Only pending requests whose dates intersect the approved one
    Interval,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all_pending" | "all" => Ok(OverlapPolicy::AllPending),
            "interval" => Ok(OverlapPolicy::Interval),
            other => Err(format!(
                "Invalid overlap policy: '{}'. Expected: all_pending or interval",
                other
            )),
        }
    }
}

/// Result of an approval over a product's loaded requests
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalOutcome {
    pub approved: Transition,
    pub rejected: Vec<Transition>,
}

impl ApprovalOutcome {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Approve `target_id` and reject its siblings among `rentals`.
///
/// Every transition is checked before any rental is touched, so on error the
/// slice is left unchanged.
pub fn resolve_approval(
    rentals: &mut [Rental],
    target_id: Uuid,
    party: Party,
    policy: OverlapPolicy,
) -> Result<ApprovalOutcome, LifecycleError> {
    let target = rentals
        .iter()
        .find(|r| r.id == target_id)
        .cloned()
        .ok_or(LifecycleError::InvalidTransition {
            from: RentalStatus::Requested,
            to: RentalStatus::Approved,
        })?;

    if target.status != RentalStatus::Requested {
        return Err(LifecycleError::InvalidTransition {
            from: target.status,
            to: RentalStatus::Approved,
        });
    }
    let approved = plan_status_change(&target, party, RentalStatus::Approved, None, None)?;

    let mut rejected = Vec::new();
    for sibling in rentals.iter().filter(|r| {
        r.id != target.id
            && r.product_id == target.product_id
            && r.status == RentalStatus::Requested
            && (policy == OverlapPolicy::AllPending || rentals_overlap(r, &target))
    }) {
        rejected.push(plan_status_change(
            sibling,
            Party::System,
            RentalStatus::Rejected,
            Some(AUTO_REJECT_REASON.to_string()),
            None,
        )?);
    }

    for rental in rentals.iter_mut() {
        if rental.id == approved.rental_id {
            approved.apply(rental);
        } else if let Some(t) = rejected.iter().find(|t| t.rental_id == rental.id) {
            t.apply(rental);
        }
    }

    Ok(ApprovalOutcome { approved, rejected })
}

/// Pair each pending request with the ids of the others it intersects
pub fn annotate_pending(pending: Vec<Rental>) -> Vec<PendingRequestView> {
    let ids: Vec<(Uuid, Vec<Uuid>)> = pending
        .iter()
        .map(|r| {
            let overlaps = pending
                .iter()
                .filter(|o| o.id != r.id && rentals_overlap(r, o))
                .map(|o| o.id)
                .collect();
            (r.id, overlaps)
        })
        .collect();

    pending
        .into_iter()
        .zip(ids)
        .map(|(rental, (_, overlaps_with))| PendingRequestView {
            rental,
            overlaps_with,
        })
        .collect()
}
