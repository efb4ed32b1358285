use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE facilities (
                id SERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL UNIQUE
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE homestay_facilities (
                homestay_id INTEGER NOT NULL REFERENCES homestays(id) ON DELETE CASCADE,
                facility_id INTEGER NOT NULL REFERENCES facilities(id) ON DELETE CASCADE,
                PRIMARY KEY (homestay_id, facility_id)
            )",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS homestay_facilities")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS facilities")
            .await?;
        Ok(())
    }
}
