//! Append-only tool-call log sharing the filesystem's database handle.

use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};
use serde_json::Value;

use crate::meta::entities::tool_call::{self, Entity as ToolCall, Model as ToolCallModel};
use crate::meta::now_nanos;
use crate::vfs::error::{FsError, FsResult};

/// A recorded tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub id: i64,
    pub tool_name: String,
    pub arguments: Value,
    pub result: Option<Value>,
    pub created_at_ns: i64,
}

impl From<ToolCallModel> for ToolCallRecord {
    fn from(model: ToolCallModel) -> Self {
        Self {
            id: model.id,
            tool_name: model.tool_name,
            arguments: serde_json::from_str(&model.arguments).unwrap_or(Value::Null),
            result: model
                .result
                .map(|text| serde_json::from_str(&text).unwrap_or(Value::Null)),
            created_at_ns: model.created_at_ns,
        }
    }
}

/// Tool-call tracking. Entries are append-only; `complete` fills in the
/// result of a previously recorded call.
#[derive(Clone)]
pub struct ToolCalls {
    db: DatabaseConnection,
}

impl ToolCalls {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn record(&self, tool_name: &str, arguments: &Value) -> FsResult<i64> {
        let entry = tool_call::ActiveModel {
            tool_name: Set(tool_name.to_string()),
            arguments: Set(arguments.to_string()),
            result: Set(None),
            created_at_ns: Set(now_nanos()),
            ..Default::default()
        };
        let inserted = entry.insert(&self.db).await?;
        Ok(inserted.id)
    }

    pub async fn complete(&self, id: i64, result: &Value) -> FsResult<()> {
        let model = ToolCall::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| FsError::not_found(format!("tool call {id}")))?;
        let mut active: tool_call::ActiveModel = model.into();
        active.result = Set(Some(result.to_string()));
        active.update(&self.db).await?;
        Ok(())
    }

    pub async fn get(&self, id: i64) -> FsResult<Option<ToolCallRecord>> {
        Ok(ToolCall::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    /// Recorded calls, newest first.
    pub async fn list(&self, limit: Option<u64>) -> FsResult<Vec<ToolCallRecord>> {
        let mut query = ToolCall::find().order_by_desc(tool_call::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        Ok(query
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::AgentFs;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_complete_get() {
        let afs = AgentFs::open_in_memory().await.unwrap();
        let tools = &afs.tools;

        let id = tools
            .record("search", &json!({"query": "rust"}))
            .await
            .unwrap();
        let pending = tools.get(id).await.unwrap().unwrap();
        assert_eq!(pending.tool_name, "search");
        assert_eq!(pending.arguments, json!({"query": "rust"}));
        assert!(pending.result.is_none());

        tools.complete(id, &json!({"hits": 3})).await.unwrap();
        let done = tools.get(id).await.unwrap().unwrap();
        assert_eq!(done.result, Some(json!({"hits": 3})));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let afs = AgentFs::open_in_memory().await.unwrap();
        let tools = &afs.tools;

        for i in 0..5 {
            tools.record("tool", &json!({ "seq": i })).await.unwrap();
        }
        let latest = tools.list(Some(2)).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].arguments, json!({"seq": 4}));
        assert_eq!(latest[1].arguments, json!({"seq": 3}));
    }
}
