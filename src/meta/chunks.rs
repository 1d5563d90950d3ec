//! Chunked content store. File bytes live in fixed-size rows keyed by
//! `(inode_id, idx)`; the final row may be short, and missing interior rows
//! read as zeros (sparse writes).

use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::BTreeMap;

use crate::meta::entities::chunk::{self, Entity as Chunk};
use crate::vfs::error::FsResult;

/// A chunk-local range covering part of a file span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkSpan {
    pub index: i64,
    pub offset: usize,
    pub len: usize,
}

/// Split `[offset, offset + len)` into chunk-local spans.
pub(crate) fn split_range(chunk_size: u64, mut offset: u64, len: usize) -> Vec<ChunkSpan> {
    let mut remaining = len as u64;
    let mut out = Vec::new();
    while remaining > 0 {
        let index = (offset / chunk_size) as i64;
        let within = offset % chunk_size;
        let take = (chunk_size - within).min(remaining);
        out.push(ChunkSpan {
            index,
            offset: within as usize,
            len: take as usize,
        });
        offset += take;
        remaining -= take;
    }
    out
}

/// Read up to `len` bytes at `offset`, clamped to `size`. Gaps left by sparse
/// writes come back zero-filled.
pub(crate) async fn read<C: ConnectionTrait>(
    conn: &C,
    ino: i64,
    chunk_size: u64,
    size: u64,
    offset: u64,
    len: usize,
) -> FsResult<Vec<u8>> {
    if offset >= size || len == 0 {
        return Ok(Vec::new());
    }
    let len = len.min((size - offset) as usize);
    let spans = split_range(chunk_size, offset, len);
    let first = spans[0].index;
    let last = spans[spans.len() - 1].index;

    let rows = Chunk::find()
        .filter(chunk::Column::InodeId.eq(ino))
        .filter(chunk::Column::Idx.between(first, last))
        .order_by_asc(chunk::Column::Idx)
        .all(conn)
        .await?;
    let mut by_index: BTreeMap<i64, Vec<u8>> =
        rows.into_iter().map(|row| (row.idx, row.data)).collect();

    let mut out = Vec::with_capacity(len);
    for span in spans {
        match by_index.remove(&span.index) {
            Some(data) => {
                let end = (span.offset + span.len).min(data.len());
                let copied = end.saturating_sub(span.offset);
                if copied > 0 {
                    out.extend_from_slice(&data[span.offset..end]);
                }
                out.resize(out.len() + span.len - copied, 0);
            }
            None => out.resize(out.len() + span.len, 0),
        }
    }
    Ok(out)
}

/// Read-modify-write across every affected chunk. The caller maintains the
/// inode's size and times in the same transaction.
pub(crate) async fn write<C: ConnectionTrait>(
    conn: &C,
    ino: i64,
    chunk_size: u64,
    offset: u64,
    data: &[u8],
) -> FsResult<()> {
    let mut cursor = 0usize;
    for span in split_range(chunk_size, offset, data.len()) {
        let piece = &data[cursor..cursor + span.len];
        cursor += span.len;

        match Chunk::find_by_id((ino, span.index)).one(conn).await? {
            Some(row) => {
                let mut buf = row.data;
                if buf.len() < span.offset + span.len {
                    buf.resize(span.offset + span.len, 0);
                }
                buf[span.offset..span.offset + span.len].copy_from_slice(piece);
                let updated = chunk::ActiveModel {
                    inode_id: Set(ino),
                    idx: Set(span.index),
                    data: Set(buf),
                };
                updated.update(conn).await?;
            }
            None => {
                let mut buf = vec![0u8; span.offset];
                buf.extend_from_slice(piece);
                let inserted = chunk::ActiveModel {
                    inode_id: Set(ino),
                    idx: Set(span.index),
                    data: Set(buf),
                };
                inserted.insert(conn).await?;
            }
        }
    }
    Ok(())
}

/// Drop rows past `new_size` and trim the boundary chunk. Growing needs no row
/// changes; the read path zero-fills past stored data.
pub(crate) async fn truncate<C: ConnectionTrait>(
    conn: &C,
    ino: i64,
    chunk_size: u64,
    new_size: u64,
) -> FsResult<()> {
    if new_size == 0 {
        remove_all(conn, ino).await?;
        return Ok(());
    }

    let last_index = ((new_size - 1) / chunk_size) as i64;
    Chunk::delete_many()
        .filter(chunk::Column::InodeId.eq(ino))
        .filter(chunk::Column::Idx.gt(last_index))
        .exec(conn)
        .await?;

    let keep = (new_size - last_index as u64 * chunk_size) as usize;
    if let Some(row) = Chunk::find_by_id((ino, last_index)).one(conn).await?
        && row.data.len() > keep
    {
        let mut buf = row.data;
        buf.truncate(keep);
        let trimmed = chunk::ActiveModel {
            inode_id: Set(ino),
            idx: Set(last_index),
            data: Set(buf),
        };
        trimmed.update(conn).await?;
    }
    Ok(())
}

pub(crate) async fn remove_all<C: ConnectionTrait>(conn: &C, ino: i64) -> FsResult<()> {
    Chunk::delete_many()
        .filter(chunk::Column::InodeId.eq(ino))
        .exec(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn count<C: ConnectionTrait>(conn: &C, ino: i64) -> FsResult<u64> {
    use sea_orm::PaginatorTrait;
    Ok(Chunk::find()
        .filter(chunk::Column::InodeId.eq(ino))
        .count(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_within_single_chunk() {
        let spans = split_range(4096, 123, 1000);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].index, 0);
        assert_eq!(spans[0].offset, 123);
        assert_eq!(spans[0].len, 1000);
    }

    #[test]
    fn test_split_across_chunks() {
        let spans = split_range(8, 4, 16);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0], ChunkSpan { index: 0, offset: 4, len: 4 });
        assert_eq!(spans[1], ChunkSpan { index: 1, offset: 0, len: 8 });
        assert_eq!(spans[2], ChunkSpan { index: 2, offset: 0, len: 4 });
    }

    #[test]
    fn test_split_zero_len() {
        assert!(split_range(4096, 0, 0).is_empty());
    }

    #[test]
    fn test_split_aligned() {
        let spans = split_range(8, 8, 8);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0], ChunkSpan { index: 1, offset: 0, len: 8 });
    }
}
