// Table models for the single-database layout.
pub mod chunk;
pub mod dirent;
pub mod fs_config;
pub mod inode;
pub mod kv_entry;
pub mod tool_call;

pub use chunk::Entity as Chunk;
pub use dirent::Entity as Dirent;
pub use fs_config::Entity as FsConfig;
pub use inode::{Entity as Inode, InodeKind, Model as InodeModel};
pub use kv_entry::Entity as KvEntry;
pub use tool_call::Entity as ToolCall;
