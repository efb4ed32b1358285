use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Homestays {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    Location,
    TotalCapacity,
    TotalBooked,
    Status,
    CheckIn,
    CheckOut,
    Images,
    CreatedAt,
    UpdatedAt,
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
                    .table(Homestays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Homestays::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Homestays::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Homestays::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Homestays::Description)
                            .string_len(2000)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Homestays::Location)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Homestays::TotalCapacity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Homestays::TotalBooked)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Homestays::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Homestays::CheckIn).timestamp().not_null())
                    .col(ColumnDef::new(Homestays::CheckOut).timestamp().not_null())
                    .col(ColumnDef::new(Homestays::Images).json().null())
                    .col(
                        ColumnDef::new(Homestays::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Homestays::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_homestays_owner")
                            .from(Homestays::Table, Homestays::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_homestays_owner_id")
                    .table(Homestays::Table)
                    .col(Homestays::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Homestays::Table).to_owned())
            .await
    }
}
