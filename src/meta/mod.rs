//! Metadata model and table-backed stores.
//!
//! Store modules are generic over [`sea_orm::ConnectionTrait`] so the facade
//! can compose them inside a single transaction per operation.

pub mod chunks;
pub mod dirents;
pub mod entities;
pub mod inodes;
pub mod schema;

pub(crate) use entities::InodeKind;

/// The root directory's fixed inode id.
pub(crate) const ROOT_INO: i64 = 1;

// POSIX file-type bits carried in the mode column.
pub(crate) const S_IFREG: u32 = 0o100000;
pub(crate) const S_IFDIR: u32 = 0o040000;
pub(crate) const S_IFLNK: u32 = 0o120000;

pub(crate) const DEFAULT_FILE_MODE: u32 = S_IFREG | 0o644;
pub(crate) const DEFAULT_DIR_MODE: u32 = S_IFDIR | 0o755;
pub(crate) const DEFAULT_SYMLINK_MODE: u32 = S_IFLNK | 0o777;

pub(crate) fn now_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
}
