use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    HomestayId,
    GuestId,
    CheckIn,
    CheckOut,
    Adults,
    Children,
    TotalPeople,
    Status,
    CancellationReason,
    CanceledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Homestays {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::HomestayId).integer().not_null())
                    .col(ColumnDef::new(Bookings::GuestId).integer().not_null())
                    .col(ColumnDef::new(Bookings::CheckIn).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::CheckOut).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::Adults).integer().not_null())
                    .col(ColumnDef::new(Bookings::Children).integer().null())
                    .col(ColumnDef::new(Bookings::TotalPeople).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Bookings::CancellationReason)
                            .string_len(500)
                            .null(),
                    )
                    .col(ColumnDef::new(Bookings::CanceledAt).timestamp().null())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // No ON DELETE CASCADE: bookings are deleted explicitly
                    // before their homestay so capacity stays accounted for.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_homestay")
                            .from(Bookings::Table, Bookings::HomestayId)
                            .to(Homestays::Table, Homestays::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_guest")
                            .from(Bookings::Table, Bookings::GuestId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_homestay_id")
                    .table(Bookings::Table)
                    .col(Bookings::HomestayId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_guest_id")
                    .table(Bookings::Table)
                    .col(Bookings::GuestId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}
