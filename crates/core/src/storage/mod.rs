pub mod kv;
pub mod redb_kv;

pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use redb_kv::RedbKeyValueStore;
