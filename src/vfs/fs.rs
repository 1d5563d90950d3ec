//! Path-based POSIX-shaped filesystem facade. Every operation runs inside one
//! database transaction; a dropped uncommitted transaction rolls back, so a
//! cancelled call leaves no partial effects. Cache invalidations are applied
//! only after a successful commit.

use bitflags::bitflags;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::sync::Arc;
use tracing::warn;

use crate::meta::entities::inode::{InodeKind, Model as InodeModel};
use crate::meta::inodes::TimesMask;
use crate::meta::{
    DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_SYMLINK_MODE, ROOT_INO, S_IFDIR, chunks, dirents,
    inodes,
};
use crate::vfs::cache::PathCache;
use crate::vfs::error::{FsError, FsResult};
use crate::vfs::path::CanonicalPath;
use crate::vfs::resolver::{self, Follow};

/// File type reported by `stat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    File,
    Dir,
    Symlink,
}

impl From<InodeKind> for FileType {
    fn from(kind: InodeKind) -> Self {
        match kind {
            InodeKind::Regular => FileType::File,
            InodeKind::Directory => FileType::Dir,
            InodeKind::Symlink => FileType::Symlink,
        }
    }
}

/// File attributes. `ino` is stable for the life of the inode no matter how
/// many hard links name it.
#[derive(Debug, Clone)]
pub struct FileAttr {
    pub ino: i64,
    pub kind: FileType,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub nlink: u32,
    pub atime_ns: i64,
    pub mtime_ns: i64,
    pub ctime_ns: i64,
    pub birthtime_ns: i64,
}

impl From<InodeModel> for FileAttr {
    fn from(model: InodeModel) -> Self {
        Self {
            ino: model.id,
            kind: model.kind.into(),
            mode: model.mode,
            uid: model.uid,
            gid: model.gid,
            size: model.size.max(0) as u64,
            nlink: model.nlink,
            atime_ns: model.atime_ns,
            mtime_ns: model.mtime_ns,
            ctime_ns: model.ctime_ns,
            birthtime_ns: model.birthtime_ns,
        }
    }
}

/// Directory entry returned by `readdir`.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub ino: i64,
    pub kind: FileType,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const READ = 0b00001;
        const WRITE = 0b00010;
        const CREATE = 0b00100;
        const EXCL = 0b01000;
        const TRUNC = 0b10000;
    }
}

/// Path-addressed filesystem over a shared database handle. Cloning shares
/// the connection pool and the path cache.
#[derive(Clone)]
pub struct Filesystem {
    db: DatabaseConnection,
    chunk_size: u64,
    cache: Arc<PathCache>,
    update_atime: bool,
}

impl Filesystem {
    pub(crate) fn new(
        db: DatabaseConnection,
        chunk_size: u64,
        cache: Arc<PathCache>,
        update_atime: bool,
    ) -> Self {
        Self {
            db,
            chunk_size,
            cache,
            update_atime,
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    async fn begin(&self) -> FsResult<DatabaseTransaction> {
        Ok(self.db.begin().await?)
    }

    /// File attributes, following symlinks.
    pub async fn stat(&self, path: &str) -> FsResult<FileAttr> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await?;
        txn.commit().await?;
        Ok(resolved.model.into())
    }

    /// File attributes without following a final symlink.
    pub async fn lstat(&self, path: &str) -> FsResult<FileAttr> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::None).await?;
        txn.commit().await?;
        Ok(resolved.model.into())
    }

    pub async fn exists(&self, path: &str) -> FsResult<bool> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Create a directory with the default mode.
    pub async fn mkdir(&self, path: &str) -> FsResult<FileAttr> {
        self.mkdir_with_mode(path, DEFAULT_DIR_MODE & 0o7777).await
    }

    pub async fn mkdir_with_mode(&self, path: &str, mode: u32) -> FsResult<FileAttr> {
        let canon = CanonicalPath::parse(path)?;
        if canon.is_root() {
            return Err(FsError::already_exists(canon.as_str()));
        }
        let txn = self.begin().await?;
        let (parent, name) = resolver::resolve_parent(&txn, &self.cache, &canon).await?;
        if dirents::lookup(&txn, parent, &name).await?.is_some() {
            return Err(FsError::already_exists(canon.as_str()));
        }
        let dir = inodes::create(
            &txn,
            InodeKind::Directory,
            S_IFDIR | (mode & 0o7777),
            0,
            0,
            0,
            None,
        )
        .await?;
        dirents::insert(&txn, parent, &name, dir.id)
            .await
            .map_err(|err| err.with_path(canon.as_str()))?;
        inodes::increment_nlink(&txn, parent).await?;
        inodes::touch(&txn, parent, TimesMask::MTIME).await?;
        txn.commit().await?;
        Ok(dir.into())
    }

    /// Remove an empty directory.
    pub async fn rmdir(&self, path: &str) -> FsResult<()> {
        let canon = CanonicalPath::parse(path)?;
        if canon.is_root() {
            return Err(FsError::invalid("cannot remove the root directory"));
        }
        let txn = self.begin().await?;
        let (parent, name) = resolver::resolve_parent(&txn, &self.cache, &canon).await?;
        let child_id = dirents::lookup(&txn, parent, &name)
            .await?
            .ok_or_else(|| FsError::not_found(canon.as_str()))?;
        let child = inodes::require(&txn, child_id).await?;
        if child.kind != InodeKind::Directory {
            return Err(FsError::not_a_directory(canon.as_str()));
        }
        if dirents::count(&txn, child_id).await? > 0 {
            return Err(FsError::not_empty(canon.as_str()));
        }
        dirents::remove(&txn, parent, &name).await?;
        inodes::remove(&txn, child_id).await?;
        inodes::decrement_nlink(&txn, parent).await?;
        inodes::touch(&txn, parent, TimesMask::MTIME).await?;
        txn.commit().await?;
        self.cache.invalidate_subtree(canon.as_str());
        Ok(())
    }

    /// Exclusive create of a regular file.
    pub async fn create(&self, path: &str) -> FsResult<File> {
        self.open(
            path,
            OpenFlags::READ | OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::EXCL,
        )
        .await
    }

    /// Open a regular file, optionally creating or truncating it.
    pub async fn open(&self, path: &str, flags: OpenFlags) -> FsResult<File> {
        let canon = CanonicalPath::parse(path)?;
        if canon.is_root() {
            return Err(FsError::is_a_directory(canon.as_str()));
        }
        if canon.trailing_slash() && flags.contains(OpenFlags::CREATE) {
            return Err(FsError::is_a_directory(canon.as_str()));
        }

        let txn = self.begin().await?;
        let existing = match resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await {
            Ok(resolved) => Some(resolved),
            Err(FsError::NotFound { .. }) if flags.contains(OpenFlags::CREATE) => None,
            Err(err) => return Err(err),
        };

        let ino = match existing {
            Some(resolved) => {
                if flags.contains(OpenFlags::CREATE | OpenFlags::EXCL) {
                    return Err(FsError::already_exists(canon.as_str()));
                }
                if resolved.model.kind == InodeKind::Directory {
                    return Err(FsError::is_a_directory(canon.as_str()));
                }
                if flags.contains(OpenFlags::TRUNC) && resolved.model.size != 0 {
                    chunks::truncate(&txn, resolved.ino, self.chunk_size, 0).await?;
                    inodes::set_size(&txn, resolved.ino, 0).await?;
                }
                resolved.ino
            }
            None => {
                let (parent, name) = resolver::resolve_parent(&txn, &self.cache, &canon).await?;
                let inode =
                    inodes::create(&txn, InodeKind::Regular, DEFAULT_FILE_MODE, 0, 0, 0, None)
                        .await?;
                dirents::insert(&txn, parent, &name, inode.id)
                    .await
                    .map_err(|err| err.with_path(canon.as_str()))?;
                inodes::touch(&txn, parent, TimesMask::MTIME | TimesMask::CTIME).await?;
                inode.id
            }
        };
        txn.commit().await?;
        Ok(File {
            fs: self.clone(),
            ino,
        })
    }

    /// Read up to `len` bytes at `offset`, following symlinks.
    pub async fn read(&self, path: &str, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await?;
        if resolved.model.kind == InodeKind::Directory {
            return Err(FsError::is_a_directory(canon.as_str()));
        }
        let data = self.read_inode(&txn, &resolved.model, offset, len).await?;
        txn.commit().await?;
        Ok(data)
    }

    /// Write at `offset`, creating the file with the default mode when the
    /// path does not resolve (the parent must exist).
    pub async fn write(&self, path: &str, offset: u64, data: &[u8]) -> FsResult<usize> {
        let canon = CanonicalPath::parse(path)?;
        if canon.is_root() {
            return Err(FsError::is_a_directory(canon.as_str()));
        }
        if data.is_empty() {
            return Ok(0);
        }

        let txn = self.begin().await?;
        let model = match resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await {
            Ok(resolved) => {
                if resolved.model.kind == InodeKind::Directory {
                    return Err(FsError::is_a_directory(canon.as_str()));
                }
                resolved.model
            }
            Err(FsError::NotFound { .. }) => {
                let (parent, name) = resolver::resolve_parent(&txn, &self.cache, &canon).await?;
                let inode =
                    inodes::create(&txn, InodeKind::Regular, DEFAULT_FILE_MODE, 0, 0, 0, None)
                        .await?;
                dirents::insert(&txn, parent, &name, inode.id)
                    .await
                    .map_err(|err| err.with_path(canon.as_str()))?;
                inodes::touch(&txn, parent, TimesMask::MTIME | TimesMask::CTIME).await?;
                inode
            }
            Err(err) => return Err(err),
        };
        self.write_inode(&txn, &model, offset, data).await?;
        txn.commit().await?;
        Ok(data.len())
    }

    /// Set the file length; shrinking drops chunks past the boundary, growing
    /// exposes zeros.
    pub async fn truncate(&self, path: &str, size: u64) -> FsResult<()> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await?;
        if resolved.model.kind == InodeKind::Directory {
            return Err(FsError::is_a_directory(canon.as_str()));
        }
        if resolved.model.size.max(0) as u64 != size {
            chunks::truncate(&txn, resolved.ino, self.chunk_size, size).await?;
            inodes::set_size(&txn, resolved.ino, size as i64).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    /// Create a hard link `dst` to the inode named by `src`. The source is
    /// not followed, so symlinks can be linked as themselves.
    pub async fn link(&self, src: &str, dst: &str) -> FsResult<()> {
        let src_c = CanonicalPath::parse(src)?;
        let dst_c = CanonicalPath::parse(dst)?;
        if dst_c.is_root() {
            return Err(FsError::already_exists(dst_c.as_str()));
        }

        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &src_c, Follow::None).await?;
        if resolved.model.kind == InodeKind::Directory {
            return Err(FsError::is_a_directory(src_c.as_str()));
        }
        let (parent, name) = resolver::resolve_parent(&txn, &self.cache, &dst_c).await?;
        if dirents::lookup(&txn, parent, &name).await?.is_some() {
            return Err(FsError::already_exists(dst_c.as_str()));
        }
        dirents::insert(&txn, parent, &name, resolved.ino)
            .await
            .map_err(|err| err.with_path(dst_c.as_str()))?;
        inodes::increment_nlink(&txn, resolved.ino).await?;
        inodes::touch(&txn, parent, TimesMask::MTIME | TimesMask::CTIME).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Remove one directory entry. The inode survives while other hard links
    /// remain; at nlink 0 it is deleted together with its chunks.
    pub async fn unlink(&self, path: &str) -> FsResult<()> {
        let canon = CanonicalPath::parse(path)?;
        if canon.is_root() {
            return Err(FsError::is_a_directory(canon.as_str()));
        }
        let txn = self.begin().await?;
        let (parent, name) = resolver::resolve_parent(&txn, &self.cache, &canon).await?;
        let child_id = dirents::lookup(&txn, parent, &name)
            .await?
            .ok_or_else(|| FsError::not_found(canon.as_str()))?;
        let child = inodes::require(&txn, child_id).await?;
        if child.kind == InodeKind::Directory {
            return Err(FsError::is_a_directory(canon.as_str()));
        }
        dirents::remove(&txn, parent, &name).await?;
        let remaining = inodes::decrement_nlink(&txn, child_id).await?;
        if remaining == 0 {
            inodes::remove(&txn, child_id).await?;
        }
        inodes::touch(&txn, parent, TimesMask::MTIME | TimesMask::CTIME).await?;
        txn.commit().await?;
        // Only this path: entries for surviving hard links stay valid.
        self.cache.invalidate(canon.as_str());
        Ok(())
    }

    /// Rename `src` to `dst`. An existing regular/symlink target is replaced
    /// atomically; an existing directory target must be empty; moving a
    /// directory into its own subtree is rejected.
    pub async fn rename(&self, src: &str, dst: &str) -> FsResult<()> {
        let src_c = CanonicalPath::parse(src)?;
        let dst_c = CanonicalPath::parse(dst)?;
        if src_c.is_root() || dst_c.is_root() {
            return Err(FsError::invalid("cannot rename the root directory"));
        }
        if src_c.as_str() == dst_c.as_str() {
            return Ok(());
        }

        let txn = self.begin().await?;
        let (src_parent, src_name) = resolver::resolve_parent(&txn, &self.cache, &src_c).await?;
        let src_id = dirents::lookup(&txn, src_parent, &src_name)
            .await?
            .ok_or_else(|| FsError::not_found(src_c.as_str()))?;
        let src_inode = inodes::require(&txn, src_id).await?;
        if (src_c.trailing_slash() || dst_c.trailing_slash())
            && src_inode.kind != InodeKind::Directory
        {
            return Err(FsError::not_a_directory(src_c.as_str()));
        }

        let (dst_parent, dst_name) = resolver::resolve_parent(&txn, &self.cache, &dst_c).await?;

        if src_inode.kind == InodeKind::Directory {
            // Walk the destination's ancestry; hitting the source means the
            // rename would detach the subtree into itself.
            let mut cursor = dst_parent;
            loop {
                if cursor == src_id {
                    return Err(FsError::invalid(dst_c.as_str()));
                }
                if cursor == ROOT_INO {
                    break;
                }
                cursor = dirents::parent_of(&txn, cursor)
                    .await?
                    .map(|entry| entry.parent_id)
                    .ok_or_else(|| FsError::not_found(dst_c.as_str()))?;
            }
        }

        if let Some(dst_id) = dirents::lookup(&txn, dst_parent, &dst_name).await? {
            if dst_id == src_id {
                // Two names for the same inode: POSIX leaves both in place.
                txn.commit().await?;
                return Ok(());
            }
            let dst_inode = inodes::require(&txn, dst_id).await?;
            match dst_inode.kind {
                InodeKind::Directory => {
                    if src_inode.kind != InodeKind::Directory {
                        return Err(FsError::is_a_directory(dst_c.as_str()));
                    }
                    if dirents::count(&txn, dst_id).await? > 0 {
                        return Err(FsError::not_empty(dst_c.as_str()));
                    }
                    dirents::remove(&txn, dst_parent, &dst_name).await?;
                    inodes::remove(&txn, dst_id).await?;
                    inodes::decrement_nlink(&txn, dst_parent).await?;
                }
                _ => {
                    if src_inode.kind == InodeKind::Directory {
                        return Err(FsError::not_a_directory(dst_c.as_str()));
                    }
                    dirents::remove(&txn, dst_parent, &dst_name).await?;
                    let remaining = inodes::decrement_nlink(&txn, dst_id).await?;
                    if remaining == 0 {
                        inodes::remove(&txn, dst_id).await?;
                    }
                }
            }
        }

        dirents::remove(&txn, src_parent, &src_name).await?;
        dirents::insert(&txn, dst_parent, &dst_name, src_id)
            .await
            .map_err(|err| err.with_path(dst_c.as_str()))?;

        if src_inode.kind == InodeKind::Directory && src_parent != dst_parent {
            inodes::decrement_nlink(&txn, src_parent).await?;
            inodes::increment_nlink(&txn, dst_parent).await?;
        }
        inodes::touch(&txn, src_parent, TimesMask::MTIME | TimesMask::CTIME).await?;
        if dst_parent != src_parent {
            inodes::touch(&txn, dst_parent, TimesMask::MTIME | TimesMask::CTIME).await?;
        }
        inodes::touch(&txn, src_id, TimesMask::CTIME).await?;
        txn.commit().await?;

        self.cache.invalidate_subtree(src_c.as_str());
        self.cache.invalidate_subtree(dst_c.as_str());
        Ok(())
    }

    /// Create a symbolic link at `linkpath` pointing to `target`. The target
    /// is stored verbatim and not required to exist.
    pub async fn symlink(&self, target: &str, linkpath: &str) -> FsResult<FileAttr> {
        let canon = CanonicalPath::parse(linkpath)?;
        if canon.is_root() {
            return Err(FsError::already_exists(canon.as_str()));
        }
        if target.is_empty() {
            return Err(FsError::invalid("empty symlink target"));
        }
        let txn = self.begin().await?;
        let (parent, name) = resolver::resolve_parent(&txn, &self.cache, &canon).await?;
        if dirents::lookup(&txn, parent, &name).await?.is_some() {
            return Err(FsError::already_exists(canon.as_str()));
        }
        let inode = inodes::create(
            &txn,
            InodeKind::Symlink,
            DEFAULT_SYMLINK_MODE,
            0,
            0,
            target.len() as i64,
            Some(target.to_string()),
        )
        .await?;
        dirents::insert(&txn, parent, &name, inode.id)
            .await
            .map_err(|err| err.with_path(canon.as_str()))?;
        inodes::touch(&txn, parent, TimesMask::MTIME | TimesMask::CTIME).await?;
        txn.commit().await?;
        Ok(inode.into())
    }

    /// Read a symlink's target without following it.
    pub async fn readlink(&self, path: &str) -> FsResult<String> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::None).await?;
        txn.commit().await?;
        if resolved.model.kind != InodeKind::Symlink {
            return Err(FsError::invalid(canon.as_str()));
        }
        resolved
            .model
            .symlink_target
            .ok_or_else(|| FsError::invalid(canon.as_str()))
    }

    /// List a directory, name-ordered. `.` and `..` are not included.
    pub async fn readdir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await?;
        if resolved.model.kind != InodeKind::Directory {
            return Err(FsError::not_a_directory(canon.as_str()));
        }
        let entries = dirents::list(&txn, resolved.ino).await?;
        let kinds =
            inodes::kinds_of(&txn, entries.iter().map(|entry| entry.child_id).collect()).await?;
        txn.commit().await?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let kind = match kinds.get(&entry.child_id) {
                    Some(kind) => (*kind).into(),
                    None => {
                        warn!("dirent {} has no inode row {}", entry.name, entry.child_id);
                        FileType::File
                    }
                };
                DirEntry {
                    name: entry.name,
                    ino: entry.child_id,
                    kind,
                }
            })
            .collect())
    }

    /// Replace the permission bits, following symlinks.
    pub async fn chmod(&self, path: &str, mode: u32) -> FsResult<FileAttr> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await?;
        let updated = inodes::set_mode(&txn, resolved.ino, mode).await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    /// Change owner and/or group, following symlinks. `None` leaves the field
    /// untouched.
    pub async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> FsResult<FileAttr> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await?;
        let updated = inodes::set_owner(&txn, resolved.ino, uid, gid).await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    /// Set access and modification times (nanoseconds); ctime moves to now.
    pub async fn utimens(&self, path: &str, atime_ns: i64, mtime_ns: i64) -> FsResult<FileAttr> {
        let canon = CanonicalPath::parse(path)?;
        let txn = self.begin().await?;
        let resolved = resolver::resolve(&txn, &self.cache, &canon, Follow::Final).await?;
        let updated = inodes::set_times(&txn, resolved.ino, atime_ns, mtime_ns).await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    async fn read_inode(
        &self,
        txn: &DatabaseTransaction,
        model: &InodeModel,
        offset: u64,
        len: usize,
    ) -> FsResult<Vec<u8>> {
        if model.kind == InodeKind::Directory {
            return Err(FsError::is_a_directory(""));
        }
        let data = chunks::read(
            txn,
            model.id,
            self.chunk_size,
            model.size.max(0) as u64,
            offset,
            len,
        )
        .await?;
        if self.update_atime {
            inodes::touch(txn, model.id, TimesMask::ATIME).await?;
        }
        Ok(data)
    }

    async fn write_inode(
        &self,
        txn: &DatabaseTransaction,
        model: &InodeModel,
        offset: u64,
        data: &[u8],
    ) -> FsResult<()> {
        if model.kind == InodeKind::Directory {
            return Err(FsError::is_a_directory(""));
        }
        chunks::write(txn, model.id, self.chunk_size, offset, data).await?;
        let new_size = (model.size.max(0) as u64).max(offset + data.len() as u64);
        inodes::set_size(txn, model.id, new_size as i64).await?;
        Ok(())
    }
}

/// Handle pinned to an inode id. Operations address the inode directly, so
/// the id observed here matches `stat` on any path naming the same inode.
#[derive(Clone)]
pub struct File {
    fs: Filesystem,
    ino: i64,
}

impl File {
    pub fn ino(&self) -> i64 {
        self.ino
    }

    /// fstat: attributes straight from the inode.
    pub async fn metadata(&self) -> FsResult<FileAttr> {
        let txn = self.fs.begin().await?;
        let model = inodes::require(&txn, self.ino).await?;
        txn.commit().await?;
        Ok(model.into())
    }

    pub async fn read_at(&self, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        let txn = self.fs.begin().await?;
        let model = inodes::require(&txn, self.ino).await?;
        let data = self.fs.read_inode(&txn, &model, offset, len).await?;
        txn.commit().await?;
        Ok(data)
    }

    pub async fn write_at(&self, offset: u64, data: &[u8]) -> FsResult<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let txn = self.fs.begin().await?;
        let model = inodes::require(&txn, self.ino).await?;
        self.fs.write_inode(&txn, &model, offset, data).await?;
        txn.commit().await?;
        Ok(data.len())
    }

    pub async fn set_len(&self, size: u64) -> FsResult<()> {
        let txn = self.fs.begin().await?;
        let model = inodes::require(&txn, self.ino).await?;
        if model.kind == InodeKind::Directory {
            return Err(FsError::is_a_directory(""));
        }
        if model.size.max(0) as u64 != size {
            chunks::truncate(&txn, self.ino, self.fs.chunk_size, size).await?;
            inodes::set_size(&txn, self.ino, size as i64).await?;
        }
        txn.commit().await?;
        Ok(())
    }
}
