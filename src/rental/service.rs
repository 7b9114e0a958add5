//! Rental service layer - authoritative rental lifecycle over PostgreSQL
//!
//! Every mutation locks the affected rows (`FOR UPDATE`), checks the change
//! with the pure state machines, and persists the rental, its ledger entries
//! and product status in a single transaction.

use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use super::delivery::{plan_assignment, plan_delivery_step, pick_partner, DeliveryStep, PartnerLoad};
use super::lifecycle::{
    plan_extension, plan_return_request, plan_status_change, Effect, Party, Transition,
};
use super::model::{
    ApproveWithRejectionResponse, CreateRentalRequest, DeliveryEvent, DeliveryStatusUpdate,
    ExtendRentalResponse, InitiateReturnRequest, PaymentStatus, PendingRequestView, QuoteRequest,
    Rental, RentalStatus, UpdateStatusRequest,
};
use super::overlap::{annotate_pending, resolve_approval, OverlapPolicy};
use super::pricing::{quote_window, PriceQuote, PricingInput};
use crate::error::{ApiError, ApiResult};
use crate::models::{Product, ProductStatus, User};
use crate::wallet::{record_transaction, TransactionType};

/// Who is calling into the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User { id: Uuid, is_admin: bool },
    /// Settlement loop
    System,
}

impl Actor {
    fn party_for(&self, rental: &Rental) -> ApiResult<Party> {
        match self {
            Actor::System => Ok(Party::System),
            Actor::User { id, is_admin } => Party::of(rental, *id, *is_admin).ok_or_else(|| {
                ApiError::Forbidden("You are not a party to this rental".to_string())
            }),
        }
    }

    fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::System => None,
        }
    }
}

/// Result of an approval: the response plus every rental it changed
#[derive(Debug, Clone)]
pub struct Approval {
    pub response: ApproveWithRejectionResponse,
    pub approved: Rental,
    pub rejected: Vec<Rental>,
}

/// Rental service for managing the rental lifecycle
#[derive(Clone)]
pub struct RentalService {
    db_pool: PgPool,
    overlap_policy: OverlapPolicy,
}

impl RentalService {
    /// Create new rental service instance
    pub fn new(db_pool: PgPool, overlap_policy: OverlapPolicy) -> Self {
        Self {
            db_pool,
            overlap_policy,
        }
    }

    // ===== Reads =====

    /// Get a rental the actor is a party to
    pub async fn get_rental_for(&self, id: Uuid, actor: Actor) -> ApiResult<Rental> {
        let rental = self.get_rental(id).await?;
        actor.party_for(&rental)?;
        Ok(rental)
    }

    /// Get a single rental by ID
    pub async fn get_rental(&self, id: Uuid) -> ApiResult<Rental> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Rental {} not found", id)))
    }

    /// Rentals placed by a renter, newest first
    pub async fn list_for_renter(&self, renter_id: Uuid) -> ApiResult<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(
            "SELECT * FROM rentals WHERE renter_id = $1 ORDER BY created_at DESC",
        )
        .bind(renter_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rentals)
    }

    /// Rentals of products owned by `owner_username`, newest first
    pub async fn list_for_owner(&self, owner_username: &str) -> ApiResult<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(
            "SELECT * FROM rentals WHERE owner_username = $1 ORDER BY created_at DESC",
        )
        .bind(owner_username)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rentals)
    }

    /// Pending requests for a product with advisory overlap annotations.
    /// Only the product's owner (or an admin) may list them.
    pub async fn pending_for_product(
        &self,
        product_id: Uuid,
        actor: Actor,
    ) -> ApiResult<Vec<PendingRequestView>> {
        let product = self.get_product(product_id).await?;
        if let Actor::User { id, is_admin: false } = actor {
            if product.owner_id != id {
                return Err(ApiError::Forbidden(
                    "Only the product owner can view its requests".to_string(),
                ));
            }
        }

        let pending = sqlx::query_as::<_, Rental>(
            r#"
            SELECT * FROM rentals
            WHERE product_id = $1 AND status = 'requested'
            ORDER BY created_at ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(annotate_pending(pending))
    }

    /// Recorded delivery transitions for a rental
    pub async fn delivery_events(&self, rental_id: Uuid) -> ApiResult<Vec<DeliveryEvent>> {
        let events = sqlx::query_as::<_, DeliveryEvent>(
            "SELECT * FROM delivery_events WHERE rental_id = $1 ORDER BY created_at ASC",
        )
        .bind(rental_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(events)
    }

    /// Load a user by ID
    pub async fn get_user(&self, id: Uuid) -> ApiResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
    }

    async fn get_product(&self, id: Uuid) -> ApiResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", id)))
    }

    /// Price preview for a product and date window
    pub async fn quote(&self, request: &QuoteRequest) -> ApiResult<PriceQuote> {
        let product = self.get_product(request.product_id).await?;
        Ok(quote_window(
            &PricingInput::from(&product),
            request.start_date,
            request.end_date,
        )?)
    }

    // ===== Mutations =====

    /// Place a rental request (buyer checkout). Payment capture is mocked:
    /// the rental is stored as paid and the deposit hold is booked.
    pub async fn create_rental(
        &self,
        renter_id: Uuid,
        request: CreateRentalRequest,
    ) -> ApiResult<Rental> {
        request.validate()?;

        let renter = self.get_user(renter_id).await?;
        renter.ensure_can_rent()?;

        let product = self.get_product(request.product_id).await?;
        if !product.status.accepts_requests() {
            return Err(ApiError::BadRequest(
                "Product is not available for rent".to_string(),
            ));
        }
        if product.owner_id == renter.id {
            return Err(ApiError::BadRequest(
                "You cannot rent your own product".to_string(),
            ));
        }
        let owner = self.get_user(product.owner_id).await?;

        let quote = quote_window(
            &PricingInput::from(&product),
            request.start_date,
            request.end_date,
        )?;
        if let Some(expected) = request.expected_total {
            quote.ensure_matches(expected)?;
        }

        let mut tx = self.db_pool.begin().await?;
        let now = Utc::now();
        let rental = sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (
                id, product_id, renter_id, owner_id, owner_username,
                start_date, end_date, duration_hours, hourly_price,
                total_rent, service_fee, security_deposit, total_amount, refund_amount,
                status, delivery_status, delivery_partner_id, pickup_requested, payment_status,
                delivery_address, pickup_address, pickup_notes, rejection_reason,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NULL,
                    'requested', 'not_assigned', NULL, FALSE, $14, $15, NULL, NULL, NULL, $16, $16)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product.id)
        .bind(renter.id)
        .bind(owner.id)
        .bind(&owner.username)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(quote.duration_hours)
        .bind(quote.hourly_price)
        .bind(quote.total_rent)
        .bind(quote.service_fee)
        .bind(quote.security_deposit)
        .bind(quote.final_total)
        .bind(PaymentStatus::Paid)
        .bind(&request.delivery_address)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        record_transaction(
            &mut tx,
            renter.id,
            Some(rental.id),
            TransactionType::SecurityDepositHold,
            rental.security_deposit,
            "Security deposit held at checkout",
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            rental_id = %rental.id,
            product_id = %product.id,
            renter_id = %renter.id,
            total = rental.total_amount,
            "Rental requested"
        );
        Ok(rental)
    }

    /// Approve a request and reject the product's other pending requests,
    /// all in one transaction.
    pub async fn approve_with_rejection(&self, id: Uuid, actor: Actor) -> ApiResult<Approval> {
        let product_id: Option<(Uuid,)> =
            sqlx::query_as("SELECT product_id FROM rentals WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await?;
        let (product_id,) =
            product_id.ok_or_else(|| ApiError::NotFound(format!("Rental {} not found", id)))?;

        let mut tx = self.db_pool.begin().await?;

        // every competing approval locks the same rows in the same order
        let candidates = sqlx::query_as::<_, Rental>(
            r#"
            SELECT * FROM rentals
            WHERE product_id = $1 AND (status IN ('requested', 'approved', 'active') OR id = $2)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(product_id)
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let target = candidates
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Rental {} not found", id)))?;
        let party = actor.party_for(&target)?;
        if party == Party::Owner {
            self.get_user(target.owner_id).await?.ensure_can_list()?;
        }

        if let Some(other) = candidates
            .iter()
            .find(|r| r.id != target.id && r.status.occupies_product())
        {
            return Err(ApiError::Conflict(format!(
                "Product is already rented under rental {}",
                other.id
            )));
        }

        let mut pending: Vec<Rental> = candidates
            .into_iter()
            .filter(|r| r.status == RentalStatus::Requested || r.id == target.id)
            .collect();
        pending.sort_by_key(|r| r.created_at);

        let outcome = resolve_approval(&mut pending, target.id, party, self.overlap_policy)?;

        let mut approved = pending
            .iter()
            .find(|r| r.id == target.id)
            .cloned()
            .ok_or_else(|| ApiError::InternalError("Approved rental vanished".to_string()))?;

        if outcome.approved.effects.contains(&Effect::AssignDelivery) {
            auto_assign(&mut tx, &mut approved).await?;
        }
        let approved = save_rental(&mut tx, &approved).await?;
        apply_effects(&mut tx, &approved, &outcome.approved).await?;

        let mut rejected = Vec::with_capacity(outcome.rejected.len());
        for transition in &outcome.rejected {
            if let Some(sibling) = pending.iter().find(|r| r.id == transition.rental_id) {
                let saved = save_rental(&mut tx, sibling).await?;
                apply_effects(&mut tx, &saved, transition).await?;
                rejected.push(saved);
            }
        }

        tx.commit().await?;

        tracing::info!(
            rental_id = %approved.id,
            product_id = %approved.product_id,
            rejected_count = rejected.len(),
            delivery_partner_id = ?approved.delivery_partner_id,
            "Rental approved"
        );

        Ok(Approval {
            response: ApproveWithRejectionResponse {
                rental_id: approved.id,
                rejected_count: rejected.len(),
                delivery_partner_id: approved.delivery_partner_id,
            },
            approved,
            rejected,
        })
    }

    /// Reject or otherwise move a rental to a new status.
    ///
    /// Approvals are routed through [`Self::approve_with_rejection`] so that
    /// siblings are always resolved. Repeating the current status is a no-op.
    pub async fn update_status(
        &self,
        id: Uuid,
        actor: Actor,
        request: UpdateStatusRequest,
    ) -> ApiResult<Rental> {
        request.validate()?;

        if request.status == RentalStatus::Approved {
            let current = self.get_rental(id).await?;
            if current.status == RentalStatus::Requested {
                return Ok(self.approve_with_rejection(id, actor).await?.approved);
            }
        }

        let mut tx = self.db_pool.begin().await?;
        let mut rental = lock_rental(&mut tx, id).await?;
        let party = actor.party_for(&rental)?;

        let transition = plan_status_change(
            &rental,
            party,
            request.status,
            request.rejection_reason,
            request.damage_deduction,
        )?;
        if transition.is_noop() {
            tx.commit().await?;
            return Ok(rental);
        }

        transition.apply(&mut rental);
        let rental = save_rental(&mut tx, &rental).await?;
        apply_effects(&mut tx, &rental, &transition).await?;
        tx.commit().await?;

        tracing::info!(
            rental_id = %rental.id,
            from = %transition.from,
            to = %transition.to,
            party = %party,
            "Rental status updated"
        );
        Ok(rental)
    }

    /// Extend an active rental by whole hours
    pub async fn extend(
        &self,
        id: Uuid,
        actor: Actor,
        additional_hours: i64,
    ) -> ApiResult<(ExtendRentalResponse, Rental)> {
        let mut tx = self.db_pool.begin().await?;
        let mut rental = lock_rental(&mut tx, id).await?;
        let party = actor.party_for(&rental)?;

        let extension = plan_extension(&rental, party, additional_hours)?;
        extension.apply(&mut rental);
        let rental = save_rental(&mut tx, &rental).await?;
        tx.commit().await?;

        tracing::info!(
            rental_id = %rental.id,
            additional_hours,
            additional_cost = extension.additional_cost,
            "Rental extended"
        );

        Ok((
            ExtendRentalResponse {
                additional_cost: extension.additional_cost,
                end_date: rental.end_date,
                total_amount: rental.total_amount,
            },
            rental,
        ))
    }

    /// Renter asks for the item to be collected
    pub async fn initiate_return(
        &self,
        id: Uuid,
        actor: Actor,
        request: InitiateReturnRequest,
    ) -> ApiResult<Rental> {
        request.validate()?;

        let mut tx = self.db_pool.begin().await?;
        let mut rental = lock_rental(&mut tx, id).await?;
        let party = actor.party_for(&rental)?;

        let first_request = plan_return_request(&rental, party)?;
        rental.pickup_requested = true;
        rental.pickup_address = Some(request.pickup_address);
        rental.pickup_notes = request.pickup_notes;
        rental.updated_at = Utc::now();
        let rental = save_rental(&mut tx, &rental).await?;
        tx.commit().await?;

        if first_request {
            tracing::info!(rental_id = %rental.id, "Return requested");
        } else {
            tracing::debug!(rental_id = %rental.id, "Return request updated");
        }
        Ok(rental)
    }

    /// Delivery partner (or admin) moves the delivery machine one step
    pub async fn update_delivery_status(
        &self,
        id: Uuid,
        actor: Actor,
        update: DeliveryStatusUpdate,
    ) -> ApiResult<Rental> {
        update.validate()?;

        let mut tx = self.db_pool.begin().await?;
        let mut rental = lock_rental(&mut tx, id).await?;
        let party = actor.party_for(&rental)?;

        let step = plan_delivery_step(&rental, party, update.delivery_status, update.notes)?;
        if step.is_noop() {
            tx.commit().await?;
            return Ok(rental);
        }

        step.apply(&mut rental);
        let rental = save_rental(&mut tx, &rental).await?;
        record_delivery_event(&mut tx, &step, actor.user_id()).await?;
        tx.commit().await?;

        tracing::info!(
            rental_id = %rental.id,
            from = %step.from,
            to = %step.to,
            status = %rental.status,
            "Delivery status updated"
        );
        Ok(rental)
    }

    /// Assign a specific delivery partner
    pub async fn assign_delivery(
        &self,
        id: Uuid,
        actor: Actor,
        partner_id: Uuid,
    ) -> ApiResult<Rental> {
        let mut tx = self.db_pool.begin().await?;
        let mut rental = lock_rental(&mut tx, id).await?;
        let party = actor.party_for(&rental)?;

        let active: Option<(bool,)> =
            sqlx::query_as("SELECT active FROM delivery_partners WHERE id = $1")
                .bind(partner_id)
                .fetch_optional(&mut *tx)
                .await?;
        match active {
            Some((true,)) => {}
            Some((false,)) => {
                return Err(ApiError::BadRequest(
                    "Delivery partner is not active".to_string(),
                ))
            }
            None => {
                return Err(ApiError::NotFound(format!(
                    "Delivery partner {} not found",
                    partner_id
                )))
            }
        }

        let step = plan_assignment(&rental, party, partner_id)?;
        step.apply(&mut rental);
        let rental = save_rental(&mut tx, &rental).await?;
        record_delivery_event(&mut tx, &step, actor.user_id()).await?;
        tx.commit().await?;

        tracing::info!(rental_id = %rental.id, partner_id = %partner_id, "Delivery partner assigned");
        Ok(rental)
    }

    /// Admin hard delete
    pub async fn force_delete(&self, id: Uuid) -> ApiResult<Rental> {
        let mut tx = self.db_pool.begin().await?;
        let rental = sqlx::query_as::<_, Rental>("DELETE FROM rentals WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Rental {} not found", id)))?;

        if rental.status.holds_product() {
            release_product(&mut tx, rental.product_id).await?;
        }
        tx.commit().await?;

        tracing::warn!(rental_id = %id, status = %rental.status, "Rental force-deleted");
        Ok(rental)
    }

    /// Complete every returned rental whose item is back with the seller
    pub async fn settle_returned(&self) -> ApiResult<Vec<Rental>> {
        let due: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM rentals
            WHERE status = 'returned' AND delivery_status = 'returned_to_seller'
            ORDER BY updated_at ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let mut settled = Vec::with_capacity(due.len());
        for (id,) in due {
            let request = UpdateStatusRequest {
                status: RentalStatus::Completed,
                rejection_reason: None,
                damage_deduction: None,
            };
            match self.update_status(id, Actor::System, request).await {
                Ok(rental) => settled.push(rental),
                Err(e) => tracing::error!(rental_id = %id, "Failed to settle rental: {}", e),
            }
        }

        Ok(settled)
    }
}

// ===== Private Helpers =====

async fn lock_rental(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> ApiResult<Rental> {
    sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Rental {} not found", id)))
}

async fn save_rental(tx: &mut Transaction<'_, Postgres>, rental: &Rental) -> ApiResult<Rental> {
    let saved = sqlx::query_as::<_, Rental>(
        r#"
        UPDATE rentals SET
            end_date = $2, duration_hours = $3, total_rent = $4, total_amount = $5,
            refund_amount = $6, status = $7, delivery_status = $8, delivery_partner_id = $9,
            pickup_requested = $10, payment_status = $11, pickup_address = $12,
            pickup_notes = $13, rejection_reason = $14, updated_at = $15
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(rental.id)
    .bind(rental.end_date)
    .bind(rental.duration_hours)
    .bind(rental.total_rent)
    .bind(rental.total_amount)
    .bind(rental.refund_amount)
    .bind(rental.status)
    .bind(rental.delivery_status)
    .bind(rental.delivery_partner_id)
    .bind(rental.pickup_requested)
    .bind(rental.payment_status)
    .bind(&rental.pickup_address)
    .bind(&rental.pickup_notes)
    .bind(&rental.rejection_reason)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(saved)
}

async fn occupy_product(conn: &mut PgConnection, product_id: Uuid) -> ApiResult<()> {
    sqlx::query("UPDATE products SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(ProductStatus::OnRent)
        .bind(Utc::now())
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Put the product back on the shelf unless another rental has taken it
/// in the meantime. Must run after the releasing rental has been saved.
async fn release_product(conn: &mut PgConnection, product_id: Uuid) -> ApiResult<()> {
    sqlx::query(
        r#"
        UPDATE products SET status = $1, updated_at = $2
        WHERE id = $3
          AND status = $4
          AND NOT EXISTS (
              SELECT 1 FROM rentals
              WHERE product_id = $3 AND status IN ('approved', 'active')
          )
        "#,
    )
    .bind(ProductStatus::Active)
    .bind(Utc::now())
    .bind(product_id)
    .bind(ProductStatus::OnRent)
    .execute(conn)
    .await?;
    Ok(())
}

/// Persist the side effects of a status transition
async fn apply_effects(
    tx: &mut Transaction<'_, Postgres>,
    rental: &Rental,
    transition: &Transition,
) -> ApiResult<()> {
    for effect in &transition.effects {
        match effect {
            Effect::Refund { amount } => {
                record_transaction(
                    tx,
                    rental.renter_id,
                    Some(rental.id),
                    TransactionType::Refund,
                    *amount,
                    &format!("Refund on {}", transition.to),
                )
                .await?;
            }
            Effect::ReleaseDeposit {
                refund_amount,
                damage_deduction,
            } => {
                record_transaction(
                    tx,
                    rental.renter_id,
                    Some(rental.id),
                    TransactionType::SecurityDepositRelease,
                    *refund_amount,
                    "Security deposit released",
                )
                .await?;
                if *damage_deduction > 0.0 {
                    record_transaction(
                        tx,
                        rental.owner_id,
                        Some(rental.id),
                        TransactionType::DamageDeduction,
                        *damage_deduction,
                        "Damage deducted from deposit",
                    )
                    .await?;
                }
            }
            Effect::CreditOwner { amount } => {
                record_transaction(
                    tx,
                    rental.owner_id,
                    Some(rental.id),
                    TransactionType::RentalEarning,
                    *amount,
                    "Rental earning",
                )
                .await?;
            }
            Effect::OccupyProduct => {
                occupy_product(tx, rental.product_id).await?;
            }
            Effect::ReleaseProduct => {
                release_product(tx, rental.product_id).await?;
            }
            // handled before the rental is saved
            Effect::AssignDelivery => {}
        }
    }
    Ok(())
}

/// Give the rental to the least loaded active delivery partner, if any
async fn auto_assign(tx: &mut Transaction<'_, Postgres>, rental: &mut Rental) -> ApiResult<()> {
    let loads = sqlx::query_as::<_, PartnerLoad>(
        r#"
        SELECT dp.id AS partner_id, COUNT(r.id) AS open_assignments
        FROM delivery_partners dp
        LEFT JOIN rentals r
            ON r.delivery_partner_id = dp.id
           AND r.status IN ('approved', 'active', 'returned')
        WHERE dp.active
        GROUP BY dp.id
        "#,
    )
    .fetch_all(&mut **tx)
    .await?;

    let Some(partner_id) = pick_partner(&loads) else {
        tracing::warn!(rental_id = %rental.id, "No active delivery partner available");
        return Ok(());
    };

    let step = plan_assignment(rental, Party::System, partner_id)?;
    step.apply(rental);
    record_delivery_event(tx, &step, None).await?;
    Ok(())
}

async fn record_delivery_event(
    tx: &mut Transaction<'_, Postgres>,
    step: &DeliveryStep,
    actor_id: Option<Uuid>,
) -> ApiResult<()> {
    sqlx::query(
        r#"
        INSERT INTO delivery_events (id, rental_id, from_status, to_status, notes, actor_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(step.rental_id)
    .bind(step.from)
    .bind(step.to)
    .bind(&step.notes)
    .bind(actor_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
