//! End-to-end filesystem behavior over a real database.

use agentfs::{AgentFs, AgentFsOptions, FileType, FsError, OpenFlags};
use anyhow::Result;

async fn open_mem() -> Result<AgentFs> {
    Ok(AgentFs::open_in_memory().await?)
}

#[tokio::test]
async fn test_create_write_read_stat() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.write("/hello.txt", 0, b"test data").await?;
    assert_eq!(fs.read("/hello.txt", 0, 9).await?, b"test data");

    let stat = fs.stat("/hello.txt").await?;
    assert_eq!(stat.size, 9);
    assert_eq!(stat.nlink, 1);
    assert_eq!(stat.kind, FileType::File);
    assert!(stat.birthtime_ns > 0);
    Ok(())
}

#[tokio::test]
async fn test_hard_link_lifecycle() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.write("/hello.txt", 0, b"test data").await?;
    fs.link("/hello.txt", "/h2").await?;

    let a = fs.stat("/hello.txt").await?;
    let b = fs.stat("/h2").await?;
    assert_eq!(a.ino, b.ino);
    assert_eq!(a.nlink, 2);
    assert_eq!(b.nlink, 2);

    fs.unlink("/hello.txt").await?;
    assert!(matches!(
        fs.stat("/hello.txt").await,
        Err(FsError::NotFound { .. })
    ));

    let survivor = fs.stat("/h2").await?;
    assert_eq!(survivor.ino, a.ino);
    assert_eq!(survivor.nlink, 1);
    assert_eq!(fs.read("/h2", 0, 9).await?, b"test data");
    Ok(())
}

#[tokio::test]
async fn test_inode_stability_across_link_and_handles() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.write("/f", 0, b"x").await?;
    let i0 = fs.stat("/f").await?.ino;
    fs.link("/f", "/g").await?;

    assert_eq!(fs.stat("/f").await?.ino, i0);
    assert_eq!(fs.stat("/g").await?.ino, i0);
    assert_eq!(fs.lstat("/f").await?.ino, i0);

    let handle = fs.open("/f", OpenFlags::READ).await?;
    assert_eq!(handle.metadata().await?.ino, i0);
    assert_eq!(handle.ino(), i0);
    Ok(())
}

#[tokio::test]
async fn test_rmdir_requires_empty() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.mkdir("/d").await?;
    fs.mkdir("/d/sub").await?;
    assert!(matches!(
        fs.rmdir("/d").await,
        Err(FsError::DirectoryNotEmpty { .. })
    ));
    assert!(fs.exists("/d").await?);

    fs.rmdir("/d/sub").await?;
    fs.rmdir("/d").await?;
    assert!(!fs.exists("/d").await?);
    Ok(())
}

#[tokio::test]
async fn test_mid_file_overwrite_with_small_chunks() -> Result<()> {
    let afs = AgentFs::open(AgentFsOptions::new().path(":memory:").chunk_size(8)).await?;
    let fs = &afs.fs;

    fs.write("/f", 0, &[b'a'; 16]).await?;
    fs.write("/f", 4, b"XXXX").await?;
    assert_eq!(fs.read("/f", 0, 16).await?, b"aaaaXXXXaaaaaaaa");
    assert_eq!(fs.stat("/f").await?.size, 16);
    Ok(())
}

#[tokio::test]
async fn test_symlink_readlink_stat_lstat() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.symlink("/target", "/link").await?;
    assert_eq!(fs.readlink("/link").await?, "/target");

    // Dangling target: stat follows and fails, lstat sees the link itself.
    assert!(matches!(
        fs.stat("/link").await,
        Err(FsError::NotFound { .. })
    ));
    assert_eq!(fs.lstat("/link").await?.kind, FileType::Symlink);
    assert_eq!(fs.lstat("/link").await?.size, "/target".len() as u64);

    fs.write("/target", 0, b"payload").await?;
    let followed = fs.stat("/link").await?;
    assert_eq!(followed.ino, fs.stat("/target").await?.ino);
    assert_eq!(fs.read("/link", 0, 7).await?, b"payload");
    Ok(())
}

#[tokio::test]
async fn test_symlink_cycle_detected() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.symlink("/a", "/a").await?;
    assert!(matches!(
        fs.stat("/a").await,
        Err(FsError::TooManySymlinks { .. })
    ));

    fs.symlink("/c", "/b").await?;
    fs.symlink("/b", "/c").await?;
    assert!(matches!(
        fs.stat("/b").await,
        Err(FsError::TooManySymlinks { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_symlink_through_directories() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.mkdir("/dir").await?;
    fs.write("/dir/real", 0, b"data").await?;

    fs.symlink("/dir", "/s").await?;
    assert_eq!(fs.read("/s/real", 0, 4).await?, b"data");

    // Relative target resolves against the symlink's directory.
    fs.symlink("real", "/dir/alias").await?;
    assert_eq!(fs.stat("/dir/alias").await?.ino, fs.stat("/dir/real").await?.ino);
    Ok(())
}

#[tokio::test]
async fn test_readlink_on_non_symlink_is_invalid() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.write("/f", 0, b"x").await?;
    assert!(matches!(
        fs.readlink("/f").await,
        Err(FsError::Invalid { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_rename_roundtrip_restores_tree() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.write("/a", 0, b"content").await?;
    let ino = fs.stat("/a").await?.ino;

    fs.rename("/a", "/b").await?;
    assert!(!fs.exists("/a").await?);
    assert_eq!(fs.stat("/b").await?.ino, ino);

    fs.rename("/b", "/a").await?;
    assert!(!fs.exists("/b").await?);
    assert_eq!(fs.stat("/a").await?.ino, ino);
    assert_eq!(fs.read("/a", 0, 7).await?, b"content");
    Ok(())
}

#[tokio::test]
async fn test_rename_replaces_regular_target() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.write("/src", 0, b"new").await?;
    fs.write("/dst", 0, b"old").await?;
    let src_ino = fs.stat("/src").await?.ino;

    fs.rename("/src", "/dst").await?;
    assert!(!fs.exists("/src").await?);
    let replaced = fs.stat("/dst").await?;
    assert_eq!(replaced.ino, src_ino);
    assert_eq!(fs.read("/dst", 0, 3).await?, b"new");
    Ok(())
}

#[tokio::test]
async fn test_rename_directory_rules() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.mkdir("/src").await?;
    fs.mkdir("/full").await?;
    fs.write("/full/file", 0, b"x").await?;
    assert!(matches!(
        fs.rename("/src", "/full").await,
        Err(FsError::DirectoryNotEmpty { .. })
    ));

    fs.mkdir("/empty").await?;
    let src_ino = fs.stat("/src").await?.ino;
    fs.rename("/src", "/empty").await?;
    assert_eq!(fs.stat("/empty").await?.ino, src_ino);

    // A directory cannot move into its own subtree.
    fs.mkdir("/empty/inner").await?;
    assert!(matches!(
        fs.rename("/empty", "/empty/inner/loop").await,
        Err(FsError::Invalid { .. })
    ));

    // Same source and destination is a no-op.
    fs.rename("/empty", "/empty").await?;
    assert!(fs.exists("/empty").await?);

    // A file cannot replace a directory.
    fs.write("/plain", 0, b"x").await?;
    assert!(matches!(
        fs.rename("/plain", "/full").await,
        Err(FsError::IsADirectory { .. }) | Err(FsError::DirectoryNotEmpty { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_rename_moves_subtree() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.mkdir("/a").await?;
    fs.mkdir("/a/nested").await?;
    fs.write("/a/nested/file", 0, b"deep").await?;
    let file_ino = fs.stat("/a/nested/file").await?.ino;

    fs.rename("/a", "/b").await?;
    assert!(matches!(
        fs.stat("/a/nested/file").await,
        Err(FsError::NotFound { .. })
    ));
    assert_eq!(fs.stat("/b/nested/file").await?.ino, file_ino);
    assert_eq!(fs.read("/b/nested/file", 0, 4).await?, b"deep");
    Ok(())
}

#[tokio::test]
async fn test_kind_mismatch_errors() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.mkdir("/d").await?;
    fs.write("/f", 0, b"x").await?;

    assert!(matches!(
        fs.unlink("/d").await,
        Err(FsError::IsADirectory { .. })
    ));
    assert!(matches!(
        fs.rmdir("/f").await,
        Err(FsError::NotADirectory { .. })
    ));
    assert!(matches!(
        fs.read("/d", 0, 1).await,
        Err(FsError::IsADirectory { .. })
    ));
    assert!(matches!(
        fs.link("/d", "/d2").await,
        Err(FsError::IsADirectory { .. })
    ));
    assert!(matches!(
        fs.read("/f/child", 0, 1).await,
        Err(FsError::NotADirectory { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_readdir_is_name_ordered() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.mkdir("/d").await?;
    for name in ["zeta", "alpha", "mid"] {
        fs.write(&format!("/d/{name}"), 0, b"x").await?;
    }
    fs.mkdir("/d/sub").await?;

    let entries = fs.readdir("/d").await?;
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid", "sub", "zeta"]);
    assert_eq!(
        entries.iter().find(|e| e.name == "sub").unwrap().kind,
        FileType::Dir
    );
    Ok(())
}

#[tokio::test]
async fn test_mkdir_rmdir_roundtrip() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    let before = fs.readdir("/").await?.len();
    let root_nlink = fs.stat("/").await?.nlink;

    fs.mkdir("/tmpdir").await?;
    assert_eq!(fs.stat("/").await?.nlink, root_nlink + 1);
    fs.rmdir("/tmpdir").await?;

    assert_eq!(fs.readdir("/").await?.len(), before);
    assert_eq!(fs.stat("/").await?.nlink, root_nlink);
    Ok(())
}

#[tokio::test]
async fn test_write_requires_existing_parent() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    assert!(matches!(
        fs.write("/missing/f", 0, b"x").await,
        Err(FsError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_chown_and_utimens() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    fs.write("/f", 0, b"x").await?;
    let owned = fs.chown("/f", Some(1000), Some(100)).await?;
    assert_eq!((owned.uid, owned.gid), (1000, 100));

    let kept_gid = fs.chown("/f", Some(0), None).await?;
    assert_eq!((kept_gid.uid, kept_gid.gid), (0, 100));

    let stamped = fs.utimens("/f", 1_000, 2_000).await?;
    assert_eq!(stamped.atime_ns, 1_000);
    assert_eq!(stamped.mtime_ns, 2_000);
    assert!(stamped.ctime_ns > 2_000);
    Ok(())
}

#[tokio::test]
async fn test_file_handle_survives_rename() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    let file = fs.create("/orig").await?;
    file.write_at(0, b"before").await?;
    fs.rename("/orig", "/moved").await?;

    // fstat and I/O go by inode, not by path.
    assert_eq!(file.metadata().await?.ino, fs.stat("/moved").await?.ino);
    file.write_at(6, b" after").await?;
    assert_eq!(fs.read("/moved", 0, 12).await?, b"before after");
    Ok(())
}

#[tokio::test]
async fn test_empty_path_and_long_names() -> Result<()> {
    let afs = open_mem().await?;
    let fs = &afs.fs;

    assert!(matches!(fs.stat("").await, Err(FsError::Invalid { .. })));

    let long = format!("/{}", "n".repeat(256));
    assert!(matches!(
        fs.write(&long, 0, b"x").await,
        Err(FsError::NameTooLong { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_chunk_size_fixed_at_first_init() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("agent.db");

    let first = AgentFs::open(AgentFsOptions::new().path(&db_path).chunk_size(8)).await?;
    assert_eq!(first.fs.chunk_size(), 8);
    first.fs.write("/f", 0, b"persisted bytes").await?;
    first.close().await?;

    // The stored chunk size wins over a differing request.
    let second = AgentFs::open(AgentFsOptions::new().path(&db_path).chunk_size(64)).await?;
    assert_eq!(second.fs.chunk_size(), 8);
    assert_eq!(second.fs.read("/f", 0, 15).await?, b"persisted bytes");
    second.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_atime_updates_when_enabled() -> Result<()> {
    let afs = AgentFs::open(AgentFsOptions::new().path(":memory:").update_atime(true)).await?;
    let fs = &afs.fs;

    fs.write("/f", 0, b"x").await?;
    let before = fs.stat("/f").await?.atime_ns;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    fs.read("/f", 0, 1).await?;
    assert!(fs.stat("/f").await?.atime_ns > before);
    Ok(())
}
