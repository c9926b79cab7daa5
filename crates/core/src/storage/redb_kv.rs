use super::kv::KeyValueStore;
use anyhow::{Context, Result};
use redb::{Database, TableDefinition};
use std::path::PathBuf;
use std::sync::Arc;

const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// Key-value store backed by an embedded redb database file
#[derive(Clone)]
pub struct RedbKeyValueStore {
    db: Arc<Database>,
}

impl RedbKeyValueStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let db = Database::create(&path).context("Failed to create redb database")?;

        let write_txn = db.begin_write().context("Failed to begin write transaction")?;
        {
            let _kv_table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open kv table")?;
        }
        write_txn.commit().context("Failed to commit transaction")?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RedbKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read().context("Failed to begin read")?;
        let table = read_txn.open_table(KV_TABLE).context("Failed to open table")?;

        let value = table.get(key).context("Failed to get value")?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self.db.begin_write().context("Failed to begin write")?;
        {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open table")?;
            table.insert(key, value).context("Failed to insert value")?;
        }
        write_txn.commit().context("Failed to commit")?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let write_txn = self.db.begin_write().context("Failed to begin write")?;
        {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open table")?;
            table.remove(key).context("Failed to remove value")?;
        }
        write_txn.commit().context("Failed to commit")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_redb_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.redb");

        {
            let store = RedbKeyValueStore::new(path.clone()).unwrap();
            store.set("history", "[]").unwrap();
            store.set("theme", "dark").unwrap();
            store.remove("theme").unwrap();
        }

        let store = RedbKeyValueStore::new(path).unwrap();
        assert_eq!(store.get("history").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("theme").unwrap(), None);
    }
}
