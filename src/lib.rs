//! AgentFS: a SQLite-backed virtual filesystem, key-value store, and tool-call
//! log for AI agents.
//!
//! Each agent owns one database file holding a complete POSIX-like hierarchy
//! (regular files, directories, hard links, symlinks) alongside a keyed blob
//! store and an append-only tool-call log. Everything is reached through the
//! library API; nothing is mounted.
//!
//! ```rust,no_run
//! use agentfs::{AgentFs, AgentFsOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), agentfs::FsError> {
//!     let afs = AgentFs::open(AgentFsOptions::new().id("my-agent")).await?;
//!
//!     afs.fs.mkdir("/notes").await?;
//!     afs.fs.write("/notes/todo.txt", 0, b"ship it").await?;
//!     let bytes = afs.fs.read("/notes/todo.txt", 0, 7).await?;
//!     assert_eq!(bytes, b"ship it");
//!
//!     afs.kv.put("cursor", b"42").await?;
//!     afs.close().await
//! }
//! ```

pub(crate) mod meta;
pub(crate) mod vfs;

pub mod config;
mod kv;
mod tools;

pub use config::{AgentFsOptions, CacheConfig, DEFAULT_CHUNK_SIZE, PoolConfig};
pub use kv::KvStore;
pub use tools::{ToolCallRecord, ToolCalls};
pub use vfs::error::{FsError, FsResult, PathHint};
pub use vfs::fs::{DirEntry, File, FileAttr, FileType, Filesystem, OpenFlags};

use sea_orm::DatabaseConnection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::meta::schema;
use crate::vfs::cache::PathCache;

/// Entry point: one database per agent. The filesystem, KV store, and
/// tool-call log share the connection pool.
pub struct AgentFs {
    db: DatabaseConnection,
    path: PathBuf,

    /// Filesystem operations.
    pub fs: Filesystem,

    /// Key-value store operations.
    pub kv: KvStore,

    /// Tool-call tracking operations.
    pub tools: ToolCalls,
}

impl AgentFs {
    /// Create or open an agent database. Schema creation, timestamp
    /// migrations, and root-inode setup are idempotent, so reopening an
    /// existing database is safe.
    pub async fn open(options: AgentFsOptions) -> FsResult<Self> {
        let db_path = options.resolve_db_path()?;
        let in_memory = db_path.to_str() == Some(":memory:");
        let url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            if let Some(dir) = db_path.parent()
                && !dir.as_os_str().is_empty()
            {
                std::fs::create_dir_all(dir)?;
            }
            format!("sqlite://{}?mode=rwc", db_path.display())
        };

        let db = schema::connect(&url, &options.pool, in_memory).await?;
        schema::init_schema(&db).await?;
        let chunk_size = schema::init_fs_config(&db, options.chunk_size).await?;
        schema::init_root(&db).await?;

        info!("agentfs opened at {}", db_path.display());

        let cache = Arc::new(PathCache::new(&options.cache));
        Ok(Self {
            fs: Filesystem::new(db.clone(), chunk_size, cache, options.update_atime),
            kv: KvStore::new(db.clone()),
            tools: ToolCalls::new(db.clone()),
            db,
            path: db_path,
        })
    }

    /// Open a throwaway in-memory database.
    pub async fn open_in_memory() -> FsResult<Self> {
        Self::open(AgentFsOptions::new().path(":memory:")).await
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the shared connection pool; outstanding clones of the subsystem
    /// handles stop working.
    pub async fn close(self) -> FsResult<()> {
        self.db.close().await?;
        Ok(())
    }
}
