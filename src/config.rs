//! Open options: database location, chunk size, cache and pool tuning.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::vfs::error::{FsError, FsResult};

pub const DEFAULT_CHUNK_SIZE: u64 = 4096;
pub const DEFAULT_CACHE_ENTRIES: u64 = 10_000;

/// Options for [`crate::AgentFs::open`]. Either `path` or `id` selects the
/// database file; everything else may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentFsOptions {
    /// Database file path; takes precedence over `id`. `":memory:"` opens a
    /// throwaway in-memory database.
    pub path: Option<PathBuf>,

    /// Agent identifier mapping to `<home>/.agentfs/<id>.db`.
    pub id: Option<String>,

    /// Content chunk size in bytes, recorded at first initialization. A value
    /// already stored in the database wins on reopen.
    pub chunk_size: Option<u64>,

    pub cache: CacheConfig,

    pub pool: PoolConfig,

    /// Update atime on reads. Off by default.
    pub update_atime: bool,
}

/// Path-cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: u64,
    /// Entry lifetime; absent or zero means entries never expire.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: DEFAULT_CACHE_ENTRIES,
            ttl: None,
        }
    }
}

impl CacheConfig {
    pub fn enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn max_entries(self, max_entries: u64) -> Self {
        Self {
            max_entries,
            ..self
        }
    }

    pub fn ttl(self, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..self
        }
    }
}

/// Connection-pool tuning; affects throughput only, never correctness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_open: Option<u32>,
    pub max_idle: Option<u32>,
    pub conn_max_lifetime: Option<Duration>,
    pub conn_max_idle_time: Option<Duration>,
}

impl AgentFsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..self
        }
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..self
        }
    }

    pub fn chunk_size(self, chunk_size: u64) -> Self {
        Self {
            chunk_size: Some(chunk_size),
            ..self
        }
    }

    pub fn cache(self, cache: CacheConfig) -> Self {
        Self { cache, ..self }
    }

    pub fn pool(self, pool: PoolConfig) -> Self {
        Self { pool, ..self }
    }

    pub fn update_atime(self, update_atime: bool) -> Self {
        Self {
            update_atime,
            ..self
        }
    }

    pub(crate) fn resolve_db_path(&self) -> FsResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let Some(id) = self.id.as_deref() else {
            return Err(FsError::invalid("either path or id must be provided"));
        };
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(FsError::invalid(format!("invalid agent id: {id:?}")));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| FsError::invalid("home directory unavailable"))?;
        Ok(home.join(".agentfs").join(format!("{id}.db")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_takes_precedence() {
        let opts = AgentFsOptions::new().path("/tmp/x.db").id("agent");
        assert_eq!(opts.resolve_db_path().unwrap(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_id_maps_under_home() {
        let opts = AgentFsOptions::new().id("agent_1-x");
        let path = opts.resolve_db_path().unwrap();
        assert!(path.ends_with(".agentfs/agent_1-x.db"));
    }

    #[test]
    fn test_invalid_ids_rejected() {
        for id in ["", "with space", "a/b", "dot.dot", "exé"] {
            let opts = AgentFsOptions::new().id(id);
            assert!(
                matches!(opts.resolve_db_path(), Err(FsError::Invalid { .. })),
                "id {id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_neither_path_nor_id_is_an_error() {
        assert!(matches!(
            AgentFsOptions::new().resolve_db_path(),
            Err(FsError::Invalid { .. })
        ));
    }
}
