use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Scoped key-value store backing durable state. Injected into the ledger
/// so the backing can be swapped without touching calling code.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str);
}

/// Volatile backend, state lives only for the process lifetime.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Durable backend, one JSON file per key under a data directory.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(FileStorage { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        let _ = fs::remove_file(self.path(key));
    }
}
