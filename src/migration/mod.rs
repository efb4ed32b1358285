use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_homestays_table;
mod m20250301_000003_create_rooms_table;
mod m20250301_000004_create_facilities_tables;
mod m20250301_000005_create_bookings_table;
mod m20250301_000006_create_password_reset_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_homestays_table::Migration),
            Box::new(m20250301_000003_create_rooms_table::Migration),
            Box::new(m20250301_000004_create_facilities_tables::Migration),
            Box::new(m20250301_000005_create_bookings_table::Migration),
            Box::new(m20250301_000006_create_password_reset_tokens::Migration),
        ]
    }
}
