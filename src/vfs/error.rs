//! Unified error surface for filesystem operations. Each kind maps onto the
//! matching `std::io::ErrorKind` where POSIX defines one.

use sea_orm::{DbErr, SqlErr};
use std::fmt;
use std::io::ErrorKind;
use thiserror::Error;

pub type FsResult<T> = Result<T, FsError>;

/// Optional path context attached to path-shaped errors.
#[derive(Debug, Clone, Default)]
pub struct PathHint(Option<String>);

impl PathHint {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn some(path: impl Into<String>) -> Self {
        Self(Some(path.into()))
    }

    pub(crate) fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for PathHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(path) if !path.is_empty() => write!(f, ": {path}"),
            _ => Ok(()),
        }
    }
}

impl From<String> for PathHint {
    fn from(value: String) -> Self {
        Self::some(value)
    }
}

impl From<&str> for PathHint {
    fn from(value: &str) -> Self {
        Self::some(value)
    }
}

#[derive(Error, Debug)]
pub enum FsError {
    #[error("not found{path}")]
    NotFound { path: PathHint },

    #[error("already exists{path}")]
    AlreadyExists { path: PathHint },

    #[error("not a directory{path}")]
    NotADirectory { path: PathHint },

    #[error("is a directory{path}")]
    IsADirectory { path: PathHint },

    #[error("directory not empty{path}")]
    DirectoryNotEmpty { path: PathHint },

    #[error("invalid argument{path}")]
    Invalid { path: PathHint },

    #[error("too many levels of symbolic links{path}")]
    TooManySymlinks { path: PathHint },

    #[error("name too long{path}")]
    NameTooLong { path: PathHint },

    #[error("no space left on device")]
    NoSpace,

    #[error("database is busy")]
    Busy,

    #[error("unsupported operation")]
    Unsupported,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(DbErr),
}

impl FsError {
    pub(crate) fn not_found(path: impl Into<PathHint>) -> Self {
        FsError::NotFound { path: path.into() }
    }

    pub(crate) fn already_exists(path: impl Into<PathHint>) -> Self {
        FsError::AlreadyExists { path: path.into() }
    }

    pub(crate) fn not_a_directory(path: impl Into<PathHint>) -> Self {
        FsError::NotADirectory { path: path.into() }
    }

    pub(crate) fn is_a_directory(path: impl Into<PathHint>) -> Self {
        FsError::IsADirectory { path: path.into() }
    }

    pub(crate) fn not_empty(path: impl Into<PathHint>) -> Self {
        FsError::DirectoryNotEmpty { path: path.into() }
    }

    pub(crate) fn invalid(path: impl Into<PathHint>) -> Self {
        FsError::Invalid { path: path.into() }
    }

    pub(crate) fn too_many_symlinks(path: impl Into<PathHint>) -> Self {
        FsError::TooManySymlinks { path: path.into() }
    }

    pub(crate) fn name_too_long(path: impl Into<PathHint>) -> Self {
        FsError::NameTooLong { path: path.into() }
    }

    /// Fills in the path hint on path-shaped errors that were raised without
    /// one (store-level failures learn their path at the facade boundary).
    pub(crate) fn with_path(self, path: &str) -> Self {
        match self {
            FsError::NotFound { path: p } if p.is_none() => FsError::not_found(path),
            FsError::AlreadyExists { path: p } if p.is_none() => FsError::already_exists(path),
            FsError::NotADirectory { path: p } if p.is_none() => FsError::not_a_directory(path),
            FsError::IsADirectory { path: p } if p.is_none() => FsError::is_a_directory(path),
            FsError::DirectoryNotEmpty { path: p } if p.is_none() => FsError::not_empty(path),
            FsError::Invalid { path: p } if p.is_none() => FsError::invalid(path),
            FsError::TooManySymlinks { path: p } if p.is_none() => FsError::too_many_symlinks(path),
            FsError::NameTooLong { path: p } if p.is_none() => FsError::name_too_long(path),
            other => other,
        }
    }
}

impl From<DbErr> for FsError {
    fn from(err: DbErr) -> Self {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return FsError::AlreadyExists {
                path: PathHint::none(),
            };
        }
        let message = err.to_string();
        if message.contains("database is locked") || message.contains("database table is locked") {
            FsError::Busy
        } else if message.contains("disk is full") || message.contains("database or disk is full") {
            FsError::NoSpace
        } else {
            FsError::Database(err)
        }
    }
}

impl From<FsError> for std::io::Error {
    fn from(value: FsError) -> Self {
        let kind = match &value {
            FsError::NotFound { .. } => ErrorKind::NotFound,
            FsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            FsError::NotADirectory { .. } => ErrorKind::NotADirectory,
            FsError::IsADirectory { .. } => ErrorKind::IsADirectory,
            FsError::DirectoryNotEmpty { .. } => ErrorKind::DirectoryNotEmpty,
            FsError::Invalid { .. } => ErrorKind::InvalidInput,
            FsError::TooManySymlinks { .. } => ErrorKind::Other,
            FsError::NameTooLong { .. } => ErrorKind::InvalidFilename,
            FsError::NoSpace => ErrorKind::StorageFull,
            FsError::Busy => ErrorKind::ResourceBusy,
            FsError::Unsupported => ErrorKind::Unsupported,
            FsError::Io(err) => err.kind(),
            FsError::Database(_) => ErrorKind::Other,
        };
        std::io::Error::new(kind, value.to_string())
    }
}
