//! Keyed blob store sharing the filesystem's database handle.

use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::meta::entities::kv_entry::{self, Entity as KvEntry};
use crate::meta::now_nanos;
use crate::vfs::error::{FsError, FsResult};

/// Key-value store. Values are opaque byte sequences; writes upsert.
#[derive(Clone)]
pub struct KvStore {
    db: DatabaseConnection,
}

impl KvStore {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn put(&self, key: &str, value: &[u8]) -> FsResult<()> {
        let entry = kv_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_vec()),
            updated_at_ns: Set(now_nanos()),
        };
        KvEntry::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entry::Column::Key)
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAtNs])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> FsResult<Option<Vec<u8>>> {
        Ok(KvEntry::find_by_id(key.to_string())
            .one(&self.db)
            .await?
            .map(|entry| entry.value))
    }

    pub async fn exists(&self, key: &str) -> FsResult<bool> {
        Ok(KvEntry::find_by_id(key.to_string())
            .count(&self.db)
            .await?
            > 0)
    }

    /// Remove a key; absent keys fail with `not_found`.
    pub async fn delete(&self, key: &str) -> FsResult<()> {
        let result = KvEntry::delete_by_id(key.to_string()).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(FsError::not_found(key));
        }
        Ok(())
    }

    /// Keys starting with `prefix`, ordered.
    pub async fn list(&self, prefix: &str) -> FsResult<Vec<String>> {
        let rows = KvEntry::find()
            .filter(kv_entry::Column::Key.starts_with(prefix))
            .order_by_asc(kv_entry::Column::Key)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|entry| entry.key).collect())
    }
}
