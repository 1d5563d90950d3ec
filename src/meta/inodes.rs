//! Inode store: creation, lookup, link-count maintenance, and the time
//! policy (mtime on content change, ctime on any metadata change, atime only
//! when the caller asks).

use bitflags::bitflags;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::HashMap;

use crate::meta::entities::inode::{self, Entity as Inode, InodeKind, Model as InodeModel};
use crate::meta::{chunks, now_nanos};
use crate::vfs::error::{FsError, FsResult, PathHint};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct TimesMask: u8 {
        const ATIME = 0b001;
        const MTIME = 0b010;
        const CTIME = 0b100;
    }
}

/// Create a new inode; the engine allocates the id. Directories start with
/// nlink 2 ("." plus the parent entry), everything else with 1.
pub(crate) async fn create<C: ConnectionTrait>(
    conn: &C,
    kind: InodeKind,
    mode: u32,
    uid: u32,
    gid: u32,
    size: i64,
    symlink_target: Option<String>,
) -> FsResult<InodeModel> {
    let now = now_nanos();
    let nlink = if kind == InodeKind::Directory { 2 } else { 1 };
    let model = inode::ActiveModel {
        kind: Set(kind),
        mode: Set(mode),
        uid: Set(uid),
        gid: Set(gid),
        size: Set(size),
        nlink: Set(nlink),
        atime_ns: Set(now),
        mtime_ns: Set(now),
        ctime_ns: Set(now),
        birthtime_ns: Set(now),
        symlink_target: Set(symlink_target),
        ..Default::default()
    };
    Ok(model.insert(conn).await?)
}

pub(crate) async fn get<C: ConnectionTrait>(conn: &C, id: i64) -> FsResult<Option<InodeModel>> {
    Ok(Inode::find_by_id(id).one(conn).await?)
}

pub(crate) async fn require<C: ConnectionTrait>(conn: &C, id: i64) -> FsResult<InodeModel> {
    get(conn, id).await?.ok_or(FsError::NotFound {
        path: PathHint::none(),
    })
}

pub(crate) async fn touch<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    which: TimesMask,
) -> FsResult<()> {
    let model = require(conn, id).await?;
    let now = now_nanos();
    let mut active: inode::ActiveModel = model.into();
    if which.contains(TimesMask::ATIME) {
        active.atime_ns = Set(now);
    }
    if which.contains(TimesMask::MTIME) {
        active.mtime_ns = Set(now);
    }
    if which.contains(TimesMask::CTIME) {
        active.ctime_ns = Set(now);
    }
    active.update(conn).await?;
    Ok(())
}

/// Record a content-size change; bumps mtime and ctime.
pub(crate) async fn set_size<C: ConnectionTrait>(conn: &C, id: i64, size: i64) -> FsResult<()> {
    let model = require(conn, id).await?;
    let now = now_nanos();
    let mut active: inode::ActiveModel = model.into();
    active.size = Set(size);
    active.mtime_ns = Set(now);
    active.ctime_ns = Set(now);
    active.update(conn).await?;
    Ok(())
}

pub(crate) async fn increment_nlink<C: ConnectionTrait>(conn: &C, id: i64) -> FsResult<u32> {
    let model = require(conn, id).await?;
    let nlink = model.nlink.saturating_add(1);
    let mut active: inode::ActiveModel = model.into();
    active.nlink = Set(nlink);
    active.ctime_ns = Set(now_nanos());
    active.update(conn).await?;
    Ok(nlink)
}

pub(crate) async fn decrement_nlink<C: ConnectionTrait>(conn: &C, id: i64) -> FsResult<u32> {
    let model = require(conn, id).await?;
    let nlink = model.nlink.saturating_sub(1);
    let mut active: inode::ActiveModel = model.into();
    active.nlink = Set(nlink);
    active.ctime_ns = Set(now_nanos());
    active.update(conn).await?;
    Ok(nlink)
}

/// Delete the inode row together with all of its content chunks.
pub(crate) async fn remove<C: ConnectionTrait>(conn: &C, id: i64) -> FsResult<()> {
    chunks::remove_all(conn, id).await?;
    Inode::delete_by_id(id).exec(conn).await?;
    Ok(())
}

/// Replace the permission bits, keeping the file-type bits intact.
pub(crate) async fn set_mode<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    mode: u32,
) -> FsResult<InodeModel> {
    let model = require(conn, id).await?;
    let mode = (model.mode & !0o7777) | (mode & 0o7777);
    let mut active: inode::ActiveModel = model.into();
    active.mode = Set(mode);
    active.ctime_ns = Set(now_nanos());
    Ok(active.update(conn).await?)
}

pub(crate) async fn set_owner<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    uid: Option<u32>,
    gid: Option<u32>,
) -> FsResult<InodeModel> {
    let model = require(conn, id).await?;
    let mut active: inode::ActiveModel = model.into();
    if let Some(uid) = uid {
        active.uid = Set(uid);
    }
    if let Some(gid) = gid {
        active.gid = Set(gid);
    }
    active.ctime_ns = Set(now_nanos());
    Ok(active.update(conn).await?)
}

pub(crate) async fn set_times<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    atime_ns: i64,
    mtime_ns: i64,
) -> FsResult<InodeModel> {
    let model = require(conn, id).await?;
    let mut active: inode::ActiveModel = model.into();
    active.atime_ns = Set(atime_ns);
    active.mtime_ns = Set(mtime_ns);
    active.ctime_ns = Set(now_nanos());
    Ok(active.update(conn).await?)
}

/// Kinds for a batch of inode ids, one query (readdir).
pub(crate) async fn kinds_of<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<i64>,
) -> FsResult<HashMap<i64, InodeKind>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Inode::find()
        .filter(inode::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| (row.id, row.kind)).collect())
}
