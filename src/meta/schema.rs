//! Connection setup and idempotent schema initialization: WAL journaling,
//! foreign-key enforcement, table/index creation from the entity definitions,
//! tolerated timestamp migrations, and the `fs_config`/root-inode bootstrap.

use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Index, OnConflict};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::config::{DEFAULT_CHUNK_SIZE, PoolConfig};
use crate::meta::entities::{Chunk, Dirent, FsConfig, Inode, KvEntry, ToolCall, dirent, fs_config, inode};
use crate::meta::{DEFAULT_DIR_MODE, InodeKind, ROOT_INO, now_nanos};
use crate::vfs::error::{FsError, FsResult};

const CHUNK_SIZE_KEY: &str = "chunk_size";

/// Column additions for databases created before nanosecond timestamps.
/// Failures (column already present) are expected and skipped.
const NSEC_MIGRATIONS: &[&str] = &[
    "ALTER TABLE inodes ADD COLUMN atime_ns INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE inodes ADD COLUMN mtime_ns INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE inodes ADD COLUMN ctime_ns INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE inodes ADD COLUMN birthtime_ns INTEGER NOT NULL DEFAULT 0",
];

/// Open the database and apply the session pragmas. In-memory databases are
/// pinned to a single pooled connection so every caller sees the same data.
pub(crate) async fn connect(
    url: &str,
    pool: &PoolConfig,
    single_connection: bool,
) -> FsResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(url.to_owned());
    opts.sqlx_logging(false);
    if single_connection {
        opts.max_connections(1).min_connections(1);
    } else {
        if let Some(n) = pool.max_open {
            opts.max_connections(n);
        }
        if let Some(n) = pool.max_idle {
            opts.min_connections(n);
        }
        if let Some(lifetime) = pool.conn_max_lifetime {
            opts.max_lifetime(lifetime);
        }
        if let Some(idle) = pool.conn_max_idle_time {
            opts.idle_timeout(idle);
        }
    }

    let db = Database::connect(opts).await?;
    db.execute_unprepared("PRAGMA journal_mode = WAL;").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Ok(db)
}

pub(crate) async fn init_schema(db: &DatabaseConnection) -> FsResult<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmts = [
        schema.create_table_from_entity(Inode).if_not_exists().to_owned(),
        schema.create_table_from_entity(Dirent).if_not_exists().to_owned(),
        schema.create_table_from_entity(Chunk).if_not_exists().to_owned(),
        schema.create_table_from_entity(FsConfig).if_not_exists().to_owned(),
        schema.create_table_from_entity(KvEntry).if_not_exists().to_owned(),
        schema.create_table_from_entity(ToolCall).if_not_exists().to_owned(),
    ];
    for stmt in stmts.iter() {
        db.execute(builder.build(stmt)).await?;
    }

    let child_index = Index::create()
        .if_not_exists()
        .name("idx_dirents_child")
        .table(Dirent)
        .col(dirent::Column::ChildId)
        .to_owned();
    db.execute(builder.build(&child_index)).await?;

    for stmt in NSEC_MIGRATIONS {
        if let Err(err) = db.execute_unprepared(stmt).await {
            debug!("skipping timestamp migration: {err}");
        }
    }

    Ok(())
}

/// Record the chunk size on first initialization; afterwards the stored value
/// wins and any differing request is ignored.
pub(crate) async fn init_fs_config(
    db: &DatabaseConnection,
    requested: Option<u64>,
) -> FsResult<u64> {
    if requested == Some(0) {
        return Err(FsError::invalid("chunk_size must be positive"));
    }

    let txn = db.begin().await?;
    let row = fs_config::ActiveModel {
        key: Set(CHUNK_SIZE_KEY.to_string()),
        value: Set(requested.unwrap_or(DEFAULT_CHUNK_SIZE).to_string()),
    };
    FsConfig::insert(row)
        .on_conflict(
            OnConflict::column(fs_config::Column::Key)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
    let value = FsConfig::find_by_id(CHUNK_SIZE_KEY.to_string())
        .one(&txn)
        .await?
        .map(|row| row.value)
        .ok_or_else(|| FsError::invalid("fs_config chunk_size row missing"))?;
    txn.commit().await?;

    let chunk_size = value
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| FsError::invalid(format!("stored chunk_size is invalid: {value}")))?;
    if let Some(requested) = requested
        && requested != chunk_size
    {
        debug!("requested chunk_size {requested} ignored; database records {chunk_size}");
    }
    Ok(chunk_size)
}

pub(crate) async fn init_root(db: &DatabaseConnection) -> FsResult<()> {
    if Inode::find_by_id(ROOT_INO).one(db).await?.is_some() {
        return Ok(());
    }

    let now = now_nanos();
    let root = inode::ActiveModel {
        id: Set(ROOT_INO),
        kind: Set(InodeKind::Directory),
        mode: Set(DEFAULT_DIR_MODE),
        uid: Set(0),
        gid: Set(0),
        size: Set(0),
        nlink: Set(2),
        atime_ns: Set(now),
        mtime_ns: Set(now),
        ctime_ns: Set(now),
        birthtime_ns: Set(now),
        symlink_target: Set(None),
    };
    Inode::insert(root)
        .on_conflict(
            OnConflict::column(inode::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    info!("root inode initialized");
    Ok(())
}
