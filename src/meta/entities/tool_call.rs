use sea_orm::entity::prelude::*;

/// Tool-call log model. Rows are append-only; `result` is filled in once the
/// call finishes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tool_calls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tool_name: String,

    /// JSON-encoded call arguments.
    #[sea_orm(column_type = "Text")]
    pub arguments: String,

    /// JSON-encoded call result, if recorded.
    #[sea_orm(column_type = "Text", nullable)]
    pub result: Option<String>,

    pub created_at_ns: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
