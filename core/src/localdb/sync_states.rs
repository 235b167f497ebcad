// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SyncStates {
    pool: SqlitePool,
}

impl SyncStates {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, collection: &str) -> Result<Option<String>, sqlx::Error> {
        const SQL: &str = "SELECT state FROM sync_states WHERE collection = ?;";

        sqlx::query_scalar(SQL)
            .bind(collection)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn upsert(&self, collection: &str, state: &str) -> Result<(), sqlx::Error> {
        const SQL: &str = "
INSERT INTO sync_states (collection, state)
VALUES (?, ?)
ON CONFLICT(collection) DO UPDATE SET
    state = excluded.state;
";

        sqlx::query(SQL)
            .bind(collection)
            .bind(state)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, collection: &str) -> Result<(), sqlx::Error> {
        const SQL: &str = "DELETE FROM sync_states WHERE collection = ?;";

        sqlx::query(SQL)
            .bind(collection)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
