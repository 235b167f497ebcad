// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davsync_dav::ETag;
use sqlx::SqlitePool;

use crate::local::{LocalRecord, RecordId};

const COLUMNS: &str = "id, remote_name, etag, schedule_tag, dirty, deleted, present";

#[derive(Debug, Clone)]
pub struct Records {
    pool: SqlitePool,
}

impl Records {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a locally created record, dirty and without remote name.
    pub async fn insert_local(
        &self,
        collection: &str,
        uid: Option<&str>,
        content_type: &str,
        body: &str,
    ) -> Result<RecordId, sqlx::Error> {
        const SQL: &str = "
INSERT INTO records (collection, dirty, uid, content_type, body)
VALUES (?, 1, ?, ?, ?)
RETURNING id;
";

        let (id,): (i64,) = sqlx::query_as(SQL)
            .bind(collection)
            .bind(uid)
            .bind(content_type)
            .bind(body)
            .fetch_one(&self.pool)
            .await?;
        Ok(RecordId(id))
    }

    /// Replaces the body of a record and marks it dirty. Tombstones are left
    /// alone.
    pub async fn update_local(
        &self,
        id: RecordId,
        uid: Option<&str>,
        body: &str,
    ) -> Result<bool, sqlx::Error> {
        const SQL: &str = "
UPDATE records SET uid = ?, body = ?, dirty = 1
WHERE id = ? AND deleted = 0;
";

        let result = sqlx::query(SQL)
            .bind(uid)
            .bind(body)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Tombstones an uploaded record, or removes one that never was.
    pub async fn delete_local(&self, id: RecordId) -> Result<bool, sqlx::Error> {
        const SQL_PURGE: &str = "DELETE FROM records WHERE id = ? AND remote_name IS NULL;";
        const SQL_TOMBSTONE: &str = "UPDATE records SET deleted = 1, dirty = 0 WHERE id = ?;";

        let mut tx = self.pool.begin().await?;
        let purged = sqlx::query(SQL_PURGE)
            .bind(id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let affected = if purged > 0 {
            purged
        } else {
            sqlx::query(SQL_TOMBSTONE)
                .bind(id.0)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };
        tx.commit().await?;
        Ok(affected > 0)
    }

    pub async fn find_dirty(&self, collection: &str) -> Result<Vec<LocalRecord>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM records WHERE collection = ? AND dirty = 1;");
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_deleted(&self, collection: &str) -> Result<Vec<LocalRecord>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM records WHERE collection = ? AND deleted = 1;");
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: RecordId) -> Result<Option<LocalRecord>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM records WHERE id = ?;");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn find_by_name(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<Option<LocalRecord>, sqlx::Error> {
        let sql =
            format!("SELECT {COLUMNS} FROM records WHERE collection = ? AND remote_name = ?;");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(collection)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn mark_present(&self, id: RecordId) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE records SET present = 1 WHERE id = ?;";

        sqlx::query(SQL).bind(id.0).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn reset_presence(&self, collection: &str) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE records SET present = 0 WHERE collection = ? AND dirty = 0;";

        sqlx::query(SQL)
            .bind(collection)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn purge_absent(&self, collection: &str) -> Result<u64, sqlx::Error> {
        const SQL: &str = "
DELETE FROM records
WHERE collection = ? AND present = 0 AND dirty = 0 AND remote_name IS NOT NULL;
";

        let result = sqlx::query(SQL)
            .bind(collection)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Inserts a downloaded record, clean and present.
    pub async fn insert_remote(
        &self,
        collection: &str,
        row: &RemoteRow<'_>,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "
INSERT INTO records (collection, remote_name, etag, schedule_tag, present, uid, content_type, body)
VALUES (?, ?, ?, ?, 1, ?, ?, ?);
";

        sqlx::query(SQL)
            .bind(collection)
            .bind(row.name)
            .bind(row.etag)
            .bind(row.schedule_tag)
            .bind(row.uid)
            .bind(row.content_type)
            .bind(row.body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Overwrites a clean record with its downloaded version. Returns false
    /// if the record turned dirty in the meantime.
    pub async fn overwrite_remote(
        &self,
        id: RecordId,
        row: &RemoteRow<'_>,
    ) -> Result<bool, sqlx::Error> {
        const SQL: &str = "
UPDATE records
SET etag = ?, schedule_tag = ?, present = 1, deleted = 0, uid = ?, content_type = ?, body = ?
WHERE id = ? AND dirty = 0;
";

        let result = sqlx::query(SQL)
            .bind(row.etag)
            .bind(row.schedule_tag)
            .bind(row.uid)
            .bind(row.content_type)
            .bind(row.body)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear_dirty(
        &self,
        id: RecordId,
        etag: Option<&ETag>,
        schedule_tag: Option<&ETag>,
    ) -> Result<bool, sqlx::Error> {
        const SQL: &str = "
UPDATE records SET dirty = 0, present = 1, etag = ?, schedule_tag = ?
WHERE id = ?;
";

        let result = sqlx::query(SQL)
            .bind(etag.map(ETag::as_str))
            .bind(schedule_tag.map(ETag::as_str))
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_remote_name(&self, id: RecordId, name: &str) -> Result<bool, sqlx::Error> {
        const SQL: &str = "UPDATE records SET remote_name = ? WHERE id = ? AND remote_name IS NULL;";

        let result = sqlx::query(SQL)
            .bind(name)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: RecordId) -> Result<(), sqlx::Error> {
        const SQL: &str = "DELETE FROM records WHERE id = ?;";

        sqlx::query(SQL).bind(id.0).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn delete_by_name(&self, collection: &str, name: &str) -> Result<bool, sqlx::Error> {
        const SQL: &str = "DELETE FROM records WHERE collection = ? AND remote_name = ?;";

        let result = sqlx::query(SQL)
            .bind(collection)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn body(&self, id: RecordId) -> Result<Option<String>, sqlx::Error> {
        const SQL: &str = "SELECT body FROM records WHERE id = ?;";

        sqlx::query_scalar(SQL)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
    }
}

/// Columns of a downloaded record.
#[derive(Debug, Clone, Copy)]
pub struct RemoteRow<'a> {
    pub name: &'a str,
    pub etag: Option<&'a str>,
    pub schedule_tag: Option<&'a str>,
    pub uid: Option<&'a str>,
    pub content_type: &'a str,
    pub body: &'a str,
}

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    id: i64,
    remote_name: Option<String>,
    etag: Option<String>,
    schedule_tag: Option<String>,
    dirty: bool,
    deleted: bool,
    present: bool,
}

impl From<RecordRow> for LocalRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            id: RecordId(row.id),
            remote_name: row.remote_name,
            etag: row.etag.map(ETag::from),
            schedule_tag: row.schedule_tag.map(ETag::from),
            dirty: row.dirty,
            deleted: row.deleted,
            present: row.present,
        }
    }
}
