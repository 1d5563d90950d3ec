use sea_orm::entity::prelude::*;

/// Directory entry model: `(parent_id, name)` names exactly one child inode.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "dirents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub parent_id: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    #[sea_orm(indexed)]
    pub child_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
