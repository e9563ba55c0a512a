//! Migration: Enforce case-insensitive uniqueness of usernames and emails.
//!
//! Expression indexes are not expressible through the schema builder, so the
//! statements are issued directly. `LOWER(...)` indexes are supported by both
//! PostgreSQL and SQLite.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

/// Index backing username uniqueness; referenced when mapping constraint errors
pub const USERNAME_INDEX: &str = "idx_users_username_lower";

/// Index backing email uniqueness; referenced when mapping constraint errors
pub const EMAIL_INDEX: &str = "idx_users_email_lower";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!(
            "CREATE UNIQUE INDEX {} ON users (LOWER(username))",
            USERNAME_INDEX
        ))
        .await?;

        db.execute_unprepared(&format!(
            "CREATE UNIQUE INDEX {} ON users (LOWER(email))",
            EMAIL_INDEX
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!("DROP INDEX IF EXISTS {}", EMAIL_INDEX))
            .await?;
        db.execute_unprepared(&format!("DROP INDEX IF EXISTS {}", USERNAME_INDEX))
            .await?;

        Ok(())
    }
}
