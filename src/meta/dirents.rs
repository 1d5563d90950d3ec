//! Directory-entry store: `(parent_id, name)` → child inode. Entry mutations
//! leave link counts and parent times to the caller so a whole operation
//! commits or rolls back as one transaction.

use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::meta::entities::dirent::{self, Entity as Dirent, Model as DirentModel};
use crate::vfs::error::FsResult;

pub(crate) async fn lookup<C: ConnectionTrait>(
    conn: &C,
    parent: i64,
    name: &str,
) -> FsResult<Option<i64>> {
    Ok(Dirent::find_by_id((parent, name.to_string()))
        .one(conn)
        .await?
        .map(|entry| entry.child_id))
}

pub(crate) async fn insert<C: ConnectionTrait>(
    conn: &C,
    parent: i64,
    name: &str,
    child: i64,
) -> FsResult<()> {
    let entry = dirent::ActiveModel {
        parent_id: Set(parent),
        name: Set(name.to_string()),
        child_id: Set(child),
    };
    // Unique-constraint violations surface as `already_exists`.
    entry.insert(conn).await?;
    Ok(())
}

pub(crate) async fn remove<C: ConnectionTrait>(conn: &C, parent: i64, name: &str) -> FsResult<bool> {
    let result = Dirent::delete_by_id((parent, name.to_string()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Entries of a directory, name-ordered so listings are stable.
pub(crate) async fn list<C: ConnectionTrait>(conn: &C, parent: i64) -> FsResult<Vec<DirentModel>> {
    Ok(Dirent::find()
        .filter(dirent::Column::ParentId.eq(parent))
        .order_by_asc(dirent::Column::Name)
        .all(conn)
        .await?)
}

pub(crate) async fn count<C: ConnectionTrait>(conn: &C, parent: i64) -> FsResult<u64> {
    Ok(Dirent::find()
        .filter(dirent::Column::ParentId.eq(parent))
        .count(conn)
        .await?)
}

/// The entry naming `child`. Directories have exactly one; for hard-linked
/// files this returns the first by `(parent_id, name)` order.
pub(crate) async fn parent_of<C: ConnectionTrait>(
    conn: &C,
    child: i64,
) -> FsResult<Option<DirentModel>> {
    Ok(Dirent::find()
        .filter(dirent::Column::ChildId.eq(child))
        .order_by_asc(dirent::Column::ParentId)
        .order_by_asc(dirent::Column::Name)
        .one(conn)
        .await?)
}
