use sea_orm::entity::prelude::*;

/// Content chunk model: a fixed-size slice of a regular file, keyed by
/// `(inode_id, idx)`. The final chunk of a file may be shorter.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub inode_id: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub idx: i64,

    pub data: Vec<u8>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
