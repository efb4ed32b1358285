use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Rooms belong exclusively to a homestay and die with it.
        db.execute_unprepared(
            "CREATE TABLE rooms (
                id SERIAL PRIMARY KEY,
                homestay_id INTEGER NOT NULL REFERENCES homestays(id) ON DELETE CASCADE,
                name VARCHAR(200) NOT NULL,
                description VARCHAR(2000) NOT NULL,
                price INTEGER NOT NULL,
                adults INTEGER NOT NULL,
                children INTEGER,
                total_people INTEGER NOT NULL,
                images JSON,
                status VARCHAR(20) NOT NULL DEFAULT 'AVAILABLE'
            )",
        )
        .await?;

        db.execute_unprepared("CREATE INDEX idx_rooms_homestay_id ON rooms (homestay_id)")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS rooms").await?;
        Ok(())
    }
}
