use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inode kind enumeration stored in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum InodeKind {
    #[sea_orm(num_value = 0)]
    Regular,

    #[sea_orm(num_value = 1)]
    Directory,

    #[sea_orm(num_value = 2)]
    Symlink,
}

/// Inode model: one row per file object, independent of any name.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "inodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub kind: InodeKind,

    /// Permission bits plus POSIX type bits (S_IFREG/S_IFDIR/S_IFLNK).
    pub mode: u32,

    pub uid: u32,
    pub gid: u32,

    /// Byte length for regular files; target length for symlinks.
    pub size: i64,

    /// Number of directory entries referring to this inode.
    pub nlink: u32,

    pub atime_ns: i64,
    pub mtime_ns: i64,
    pub ctime_ns: i64,

    /// Set at creation, never updated.
    pub birthtime_ns: i64,

    /// Link target when this inode is a symlink.
    #[sea_orm(column_type = "Text", nullable)]
    pub symlink_target: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
