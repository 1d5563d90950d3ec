//! Path resolution: walks directory entries from the root, follows symlinks
//! with a hop counter (never reference counting, so linked directory shapes
//! don't trip false cycles), and consults the path cache for full canonical
//! paths.

use sea_orm::ConnectionTrait;
use std::collections::VecDeque;
use tracing::trace;

use crate::meta::entities::inode::{InodeKind, Model as InodeModel};
use crate::meta::{ROOT_INO, dirents, inodes};
use crate::vfs::cache::PathCache;
use crate::vfs::error::{FsError, FsResult};
use crate::vfs::path::CanonicalPath;

pub(crate) const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Follow {
    /// Resolve the final component through symlinks (stat semantics).
    Final,
    /// Stop at the final component (lstat semantics).
    None,
}

pub(crate) struct Resolved {
    pub ino: i64,
    pub model: InodeModel,
}

pub(crate) async fn resolve<C: ConnectionTrait>(
    conn: &C,
    cache: &PathCache,
    path: &CanonicalPath,
    follow: Follow,
) -> FsResult<Resolved> {
    if path.is_root() {
        let model = inodes::require(conn, ROOT_INO).await?;
        return Ok(Resolved {
            ino: ROOT_INO,
            model,
        });
    }

    // A cached mapping is only trusted after the inode is re-read inside the
    // current transaction. Cached entries hold lstat semantics, so a final
    // symlink under Follow::Final still goes through the walk.
    if let Some(ino) = cache.get(path.as_str()) {
        match inodes::get(conn, ino).await? {
            Some(model) => {
                if !(follow == Follow::Final && model.kind == InodeKind::Symlink) {
                    if path.trailing_slash() && model.kind != InodeKind::Directory {
                        return Err(FsError::not_a_directory(path.as_str()));
                    }
                    trace!("path cache hit: {} -> {ino}", path.as_str());
                    return Ok(Resolved { ino, model });
                }
            }
            None => cache.invalidate(path.as_str()),
        }
    }

    walk(conn, cache, path, follow).await
}

/// Resolve the parent directory of `path` and return it with the final
/// component. The parent itself is resolved through symlinks.
pub(crate) async fn resolve_parent<C: ConnectionTrait>(
    conn: &C,
    cache: &PathCache,
    path: &CanonicalPath,
) -> FsResult<(i64, String)> {
    let Some(name) = path.file_name() else {
        return Err(FsError::invalid(path.as_str()));
    };
    let parent = path.parent();
    let resolved = resolve(conn, cache, &parent, Follow::Final).await?;
    if resolved.model.kind != InodeKind::Directory {
        return Err(FsError::not_a_directory(parent.as_str()));
    }
    Ok((resolved.ino, name.to_string()))
}

async fn walk<C: ConnectionTrait>(
    conn: &C,
    cache: &PathCache,
    path: &CanonicalPath,
    follow: Follow,
) -> FsResult<Resolved> {
    let mut pending: VecDeque<String> = path.segments().iter().cloned().collect();
    let mut trail: Vec<String> = Vec::new();
    let mut cur = ROOT_INO;
    let mut hops = 0usize;

    loop {
        let Some(name) = pending.pop_front() else {
            // A symlink target collapsed onto a directory already in hand
            // (e.g. a link to "/").
            let model = inodes::require(conn, cur).await?;
            return Ok(Resolved { ino: cur, model });
        };

        let child_id = dirents::lookup(conn, cur, &name)
            .await?
            .ok_or_else(|| FsError::not_found(path.as_str()))?;
        let child = inodes::require(conn, child_id).await?;
        let is_final = pending.is_empty();

        if child.kind == InodeKind::Symlink && (!is_final || follow == Follow::Final) {
            hops += 1;
            if hops > MAX_SYMLINK_HOPS {
                return Err(FsError::too_many_symlinks(path.as_str()));
            }
            let target = child.symlink_target.as_deref().unwrap_or_default();
            if target.is_empty() {
                return Err(FsError::invalid(path.as_str()));
            }

            // Relative targets resolve against the symlink's directory; the
            // rebased path restarts the walk from the root.
            let mut joined = if target.starts_with('/') {
                target.to_string()
            } else {
                format!("/{}/{}", trail.join("/"), target)
            };
            for rest in &pending {
                joined.push('/');
                joined.push_str(rest);
            }
            let rebased = CanonicalPath::parse(&joined)?;
            pending = rebased.segments().iter().cloned().collect();
            trail.clear();
            cur = ROOT_INO;
            continue;
        }

        if is_final {
            if path.trailing_slash() && child.kind != InodeKind::Directory {
                return Err(FsError::not_a_directory(path.as_str()));
            }
            // Only hop-free resolutions are cached: the key then names the
            // exact dirent chain that path-level invalidation targets.
            if hops == 0 {
                cache.insert(path.as_str().to_string(), child_id);
            }
            return Ok(Resolved {
                ino: child_id,
                model: child,
            });
        }

        if child.kind != InodeKind::Directory {
            return Err(FsError::not_a_directory(path.as_str()));
        }
        trail.push(name);
        cur = child_id;
    }
}
