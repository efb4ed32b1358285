use crate::{
    error::{AppError, AppResult},
    models::{
        booking, homestay, room, user, Booking, BookingModel, Homestay, HomestayModel, Room,
        RoomStatus, User, UserModel, VerificationStatus,
    },
    services::email::EmailService,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, TransactionTrait,
};

pub struct BookingService {
    db: DatabaseConnection,
}

pub struct NewBooking {
    pub homestay_id: i32,
    pub check_in: chrono::NaiveDateTime,
    pub check_out: chrono::NaiveDateTime,
    pub adults: i32,
    pub children: Option<i32>,
    pub total_people: i32,
}

/// Generic field patch. Deliberately excludes total_people: changing it here
/// would desynchronize the homestay capacity counter.
pub struct BookingPatch {
    pub check_in: Option<chrono::NaiveDateTime>,
    pub check_out: Option<chrono::NaiveDateTime>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
}

impl BookingService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a PENDING booking and reserve its capacity.
    ///
    /// The capacity check and the counter increment run in one transaction
    /// with the homestay row locked, so two concurrent requests against a
    /// near-full homestay cannot jointly overbook it.
    pub async fn create(&self, guest_id: i32, new: NewBooking) -> AppResult<BookingModel> {
        let txn = self.db.begin().await?;

        let homestay = Homestay::find_by_id(new.homestay_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let remaining = homestay.total_capacity - homestay.total_booked;
        if new.total_people > remaining {
            return Err(AppError::CapacityExceeded { remaining });
        }

        let now = chrono::Utc::now().naive_utc();
        let model = booking::ActiveModel {
            homestay_id: sea_orm::ActiveValue::Set(new.homestay_id),
            guest_id: sea_orm::ActiveValue::Set(guest_id),
            check_in: sea_orm::ActiveValue::Set(new.check_in),
            check_out: sea_orm::ActiveValue::Set(new.check_out),
            adults: sea_orm::ActiveValue::Set(new.adults),
            children: sea_orm::ActiveValue::Set(new.children),
            total_people: sea_orm::ActiveValue::Set(new.total_people),
            status: sea_orm::ActiveValue::Set(VerificationStatus::Pending),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        let created = model.insert(&txn).await?;

        self.adjust_total_booked(&txn, new.homestay_id, new.total_people)
            .await?;

        txn.commit().await?;

        tracing::info!(
            booking_id = created.id,
            homestay_id = created.homestay_id,
            total_people = created.total_people,
            "Booking created"
        );
        Ok(created)
    }

    /// All bookings against homestays owned by `owner_id`, with the homestay
    /// and a restricted guest profile for each.
    pub async fn list_for_owner(
        &self,
        owner_id: i32,
    ) -> AppResult<Vec<(BookingModel, HomestayModel, UserModel)>> {
        let rows: Vec<(BookingModel, Option<HomestayModel>)> = Booking::find()
            .find_also_related(Homestay)
            .filter(homestay::Column::OwnerId.eq(owner_id))
            .all(&self.db)
            .await?;

        let guest_ids: Vec<i32> = rows.iter().map(|(b, _)| b.guest_id).collect();
        let guests: Vec<UserModel> = User::find()
            .filter(user::Column::Id.is_in(guest_ids))
            .all(&self.db)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (booking, homestay) in rows {
            let homestay = homestay.ok_or(AppError::NotFound)?;
            let guest = guests
                .iter()
                .find(|g| g.id == booking.guest_id)
                .cloned()
                .ok_or(AppError::NotFound)?;
            out.push((booking, homestay, guest));
        }
        Ok(out)
    }

    pub async fn get(&self, id: i32) -> AppResult<BookingModel> {
        Booking::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Patch dates and party composition. Capacity counters are untouched;
    /// total_people is not mutable through this path.
    pub async fn update(&self, id: i32, patch: BookingPatch) -> AppResult<BookingModel> {
        let existing = self.get(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: booking::ActiveModel = existing.into();
        if let Some(check_in) = patch.check_in {
            active.check_in = sea_orm::ActiveValue::Set(check_in);
        }
        if let Some(check_out) = patch.check_out {
            active.check_out = sea_orm::ActiveValue::Set(check_out);
        }
        if let Some(adults) = patch.adults {
            active.adults = sea_orm::ActiveValue::Set(adults);
        }
        if let Some(children) = patch.children {
            active.children = sea_orm::ActiveValue::Set(Some(children));
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Delete a booking and restore its reserved capacity, atomically.
    pub async fn remove(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        let booking = Booking::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        Booking::delete_by_id(booking.id).exec(&txn).await?;
        self.adjust_total_booked(&txn, booking.homestay_id, -booking.total_people)
            .await?;

        txn.commit().await?;
        tracing::info!(booking_id = id, "Booking removed, capacity restored");
        Ok(())
    }

    /// Approve or reject a pending booking. A canceled booking is terminal
    /// and cannot be re-verified. On approval the guest gets a best-effort
    /// confirmation email.
    pub async fn verify(
        &self,
        id: i32,
        status: VerificationStatus,
        email_service: &EmailService,
    ) -> AppResult<BookingModel> {
        if !matches!(
            status,
            VerificationStatus::Approved | VerificationStatus::Rejected
        ) {
            return Err(AppError::Validation(
                "Status must be APPROVED or REJECTED".to_string(),
            ));
        }

        let booking = self.get(id).await?;
        if booking.status == VerificationStatus::Canceled {
            return Err(AppError::Conflict(
                "Cannot update status. Booking is already canceled".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: booking::ActiveModel = booking.into();
        active.status = sea_orm::ActiveValue::Set(status);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let updated = active.update(&self.db).await?;

        if status == VerificationStatus::Approved {
            self.notify_guest_approved(&updated, email_service).await;
        }

        Ok(updated)
    }

    /// Cancel a booking: mark it CANCELED with reason and timestamp, release
    /// its capacity, and reset rooms to AVAILABLE when no active bookings
    /// remain. All writes commit atomically; the owner notification goes out
    /// only after the commit and its failure is logged, not propagated.
    pub async fn cancel(
        &self,
        id: i32,
        reason: &str,
        email_service: &EmailService,
    ) -> AppResult<BookingModel> {
        let txn = self.db.begin().await?;

        let booking = Booking::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if booking.status == VerificationStatus::Canceled {
            return Err(AppError::Conflict(
                "Booking is already canceled".to_string(),
            ));
        }

        let homestay_id = booking.homestay_id;
        let total_people = booking.total_people;
        let now = chrono::Utc::now().naive_utc();

        let mut active: booking::ActiveModel = booking.into();
        active.status = sea_orm::ActiveValue::Set(VerificationStatus::Canceled);
        active.cancellation_reason = sea_orm::ActiveValue::Set(Some(reason.to_string()));
        active.canceled_at = sea_orm::ActiveValue::Set(Some(now));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let canceled = active.update(&txn).await?;

        self.adjust_total_booked(&txn, homestay_id, -total_people)
            .await?;

        let active_bookings = Booking::find()
            .filter(booking::Column::HomestayId.eq(homestay_id))
            .filter(booking::Column::Status.ne(VerificationStatus::Canceled))
            .count(&txn)
            .await?;

        if active_bookings == 0 {
            Room::update_many()
                .col_expr(
                    room::Column::Status,
                    Expr::value(RoomStatus::Available),
                )
                .filter(room::Column::HomestayId.eq(homestay_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        tracing::info!(
            booking_id = id,
            homestay_id,
            "Booking canceled, capacity released"
        );

        self.notify_owner_canceled(homestay_id, reason, email_service)
            .await;

        Ok(canceled)
    }

    async fn adjust_total_booked<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        homestay_id: i32,
        delta: i32,
    ) -> AppResult<()> {
        Homestay::update_many()
            .col_expr(
                homestay::Column::TotalBooked,
                Expr::col(homestay::Column::TotalBooked).add(delta),
            )
            .filter(homestay::Column::Id.eq(homestay_id))
            .exec(conn)
            .await?;
        Ok(())
    }

    async fn notify_guest_approved(&self, booking: &BookingModel, email_service: &EmailService) {
        let result: AppResult<(HomestayModel, UserModel)> = async {
            let homestay = Homestay::find_by_id(booking.homestay_id)
                .one(&self.db)
                .await?
                .ok_or(AppError::NotFound)?;
            let guest = User::find_by_id(booking.guest_id)
                .one(&self.db)
                .await?
                .ok_or(AppError::NotFound)?;
            Ok((homestay, guest))
        }
        .await;

        match result {
            Ok((homestay, guest)) => {
                if let Err(e) = email_service
                    .send_booking_confirmation(&guest.email, &homestay.name, booking.check_in)
                    .await
                {
                    tracing::warn!("Failed to send booking confirmation: {e}");
                }
            }
            Err(e) => tracing::warn!("Could not resolve booking parties for email: {e}"),
        }
    }

    async fn notify_owner_canceled(
        &self,
        homestay_id: i32,
        reason: &str,
        email_service: &EmailService,
    ) {
        let result: AppResult<(HomestayModel, UserModel)> = async {
            let homestay = Homestay::find_by_id(homestay_id)
                .one(&self.db)
                .await?
                .ok_or(AppError::NotFound)?;
            let owner = User::find_by_id(homestay.owner_id)
                .one(&self.db)
                .await?
                .ok_or(AppError::NotFound)?;
            Ok((homestay, owner))
        }
        .await;

        match result {
            Ok((homestay, owner)) => {
                if let Err(e) = email_service
                    .send_cancellation_notice(&owner.email, &homestay.name, reason)
                    .await
                {
                    tracing::warn!("Failed to send cancellation notice: {e}");
                }
            }
            Err(e) => tracing::warn!("Could not resolve homestay owner for email: {e}"),
        }
    }
}
