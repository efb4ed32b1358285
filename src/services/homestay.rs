use crate::{
    error::{AppError, AppResult},
    models::{
        booking, facility, homestay, homestay_facility, room, Booking, Facility, Homestay,
        HomestayModel, Role, RoomStatus, VerificationStatus,
    },
};
use sea_orm::{
    sea_query::{extension::postgres::PgExpr, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};

pub struct HomestayService {
    db: DatabaseConnection,
}

pub struct NewHomestay {
    pub name: String,
    pub description: String,
    pub location: String,
    pub total_capacity: i32,
    pub check_in: chrono::NaiveDateTime,
    pub check_out: chrono::NaiveDateTime,
    pub images: Option<Vec<String>>,
    pub rooms: Vec<NewRoom>,
    pub facilities: Vec<String>,
}

pub struct NewRoom {
    pub name: String,
    pub description: String,
    pub price: i32,
    pub adults: i32,
    pub children: Option<i32>,
    pub total_people: i32,
    pub images: Option<Vec<String>>,
}

pub struct HomestayPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub total_capacity: Option<i32>,
    pub status: Option<VerificationStatus>,
    pub check_in: Option<chrono::NaiveDateTime>,
    pub check_out: Option<chrono::NaiveDateTime>,
    pub images: Option<Vec<String>>,
}

impl HomestayService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a listing with its nested rooms and facilities in one
    /// transaction. An OWNER may own at most one listing;
    /// COMMUNITY_OWNER and SUPERUSER are unrestricted.
    pub async fn create(
        &self,
        owner_id: i32,
        role: Role,
        new: NewHomestay,
    ) -> AppResult<HomestayModel> {
        if role == Role::Owner {
            let existing = Homestay::find()
                .filter(homestay::Column::OwnerId.eq(owner_id))
                .one(&self.db)
                .await?;
            if existing.is_some() {
                return Err(AppError::Forbidden);
            }
        }

        let now = chrono::Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let model = homestay::ActiveModel {
            owner_id: sea_orm::ActiveValue::Set(owner_id),
            name: sea_orm::ActiveValue::Set(new.name),
            description: sea_orm::ActiveValue::Set(new.description),
            location: sea_orm::ActiveValue::Set(new.location),
            total_capacity: sea_orm::ActiveValue::Set(new.total_capacity),
            total_booked: sea_orm::ActiveValue::Set(0),
            status: sea_orm::ActiveValue::Set(VerificationStatus::Pending),
            check_in: sea_orm::ActiveValue::Set(new.check_in),
            check_out: sea_orm::ActiveValue::Set(new.check_out),
            images: sea_orm::ActiveValue::Set(new.images.map(|v| serde_json::json!(v))),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        let created = model.insert(&txn).await?;

        if !new.rooms.is_empty() {
            tracing::info!(homestay_id = created.id, "Creating rooms");
            let rooms: Vec<room::ActiveModel> = new
                .rooms
                .into_iter()
                .map(|r| room::ActiveModel {
                    homestay_id: sea_orm::ActiveValue::Set(created.id),
                    name: sea_orm::ActiveValue::Set(r.name),
                    description: sea_orm::ActiveValue::Set(r.description),
                    price: sea_orm::ActiveValue::Set(r.price),
                    adults: sea_orm::ActiveValue::Set(r.adults),
                    children: sea_orm::ActiveValue::Set(r.children),
                    total_people: sea_orm::ActiveValue::Set(r.total_people),
                    images: sea_orm::ActiveValue::Set(r.images.map(|v| serde_json::json!(v))),
                    status: sea_orm::ActiveValue::Set(RoomStatus::Available),
                    ..Default::default()
                })
                .collect();
            crate::models::Room::insert_many(rooms).exec(&txn).await?;
        }

        if !new.facilities.is_empty() {
            self.attach_facilities(&txn, created.id, &new.facilities)
                .await?;
        }

        txn.commit().await?;
        Ok(created)
    }

    /// SUPERUSER sees every listing; everyone else only their own.
    pub async fn list_mine(&self, owner_id: i32, role: Role) -> AppResult<Vec<HomestayModel>> {
        let query = if role == Role::Superuser {
            Homestay::find()
        } else {
            Homestay::find().filter(homestay::Column::OwnerId.eq(owner_id))
        };
        Ok(query.all(&self.db).await?)
    }

    /// Public catalog for guests.
    pub async fn list_all(&self) -> AppResult<Vec<HomestayModel>> {
        Ok(Homestay::find().all(&self.db).await?)
    }

    /// Case-insensitive substring match on the location field.
    pub async fn search(&self, location: &str) -> AppResult<Vec<HomestayModel>> {
        Ok(Homestay::find()
            .filter(Expr::col(homestay::Column::Location).ilike(format!("%{}%", location)))
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> AppResult<HomestayModel> {
        Homestay::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update(&self, id: i32, patch: HomestayPatch) -> AppResult<HomestayModel> {
        let existing = self.get(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: homestay::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = sea_orm::ActiveValue::Set(name);
        }
        if let Some(description) = patch.description {
            active.description = sea_orm::ActiveValue::Set(description);
        }
        if let Some(location) = patch.location {
            active.location = sea_orm::ActiveValue::Set(location);
        }
        if let Some(total_capacity) = patch.total_capacity {
            active.total_capacity = sea_orm::ActiveValue::Set(total_capacity);
        }
        if let Some(status) = patch.status {
            active.status = sea_orm::ActiveValue::Set(status);
        }
        if let Some(check_in) = patch.check_in {
            active.check_in = sea_orm::ActiveValue::Set(check_in);
        }
        if let Some(check_out) = patch.check_out {
            active.check_out = sea_orm::ActiveValue::Set(check_out);
        }
        if let Some(images) = patch.images {
            active.images = sea_orm::ActiveValue::Set(Some(serde_json::json!(images)));
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Delete a listing. Bookings are removed explicitly first; rooms and
    /// facility joins cascade at the schema level.
    pub async fn remove(&self, id: i32) -> AppResult<()> {
        let existing = self.get(id).await?;

        let txn = self.db.begin().await?;
        Booking::delete_many()
            .filter(booking::Column::HomestayId.eq(existing.id))
            .exec(&txn)
            .await?;
        Homestay::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(homestay_id = id, "Homestay removed with its bookings");
        Ok(())
    }

    /// Insert any facilities not yet known (dedup by name), then join all of
    /// them to the homestay.
    async fn attach_facilities<C: ConnectionTrait>(
        &self,
        conn: &C,
        homestay_id: i32,
        names: &[String],
    ) -> AppResult<()> {
        let existing = Facility::find()
            .filter(facility::Column::Name.is_in(names.iter().cloned()))
            .all(conn)
            .await?;

        let known: Vec<&str> = existing.iter().map(|f| f.name.as_str()).collect();
        let missing: Vec<facility::ActiveModel> = names
            .iter()
            .filter(|n| !known.contains(&n.as_str()))
            .map(|n| facility::ActiveModel {
                name: sea_orm::ActiveValue::Set(n.clone()),
                ..Default::default()
            })
            .collect();

        if !missing.is_empty() {
            tracing::info!("Creating new facilities");
            Facility::insert_many(missing).exec(conn).await?;
        }

        let all = Facility::find()
            .filter(facility::Column::Name.is_in(names.iter().cloned()))
            .all(conn)
            .await?;

        let joins: Vec<homestay_facility::ActiveModel> = all
            .into_iter()
            .map(|f| homestay_facility::ActiveModel {
                homestay_id: sea_orm::ActiveValue::Set(homestay_id),
                facility_id: sea_orm::ActiveValue::Set(f.id),
            })
            .collect();
        crate::models::HomestayFacility::insert_many(joins)
            .exec(conn)
            .await?;

        Ok(())
    }
}
