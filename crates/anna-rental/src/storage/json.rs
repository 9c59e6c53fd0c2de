use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{RepositoryError, StoredRecord};

type Entries<V> = BTreeMap<<V as StoredRecord>::Key, V>;

/// Keyed collection of records, optionally mirrored to a JSON document on disk.
pub struct JsonCollection<V: StoredRecord> {
    path: Option<PathBuf>,
    entries: Mutex<Option<Entries<V>>>,
}

impl<V: StoredRecord> JsonCollection<V> {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Some(BTreeMap::new())),
        }
    }

    /// Bind the collection to `path`. Nothing is read until the first access; a missing file
    /// reads as an empty collection.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            entries: Mutex::new(None),
        }
    }

    pub fn insert(&self, record: V) -> Result<V, RepositoryError> {
        self.mutate(|entries| {
            let key = record.key();
            if entries.contains_key(&key) {
                return Err(RepositoryError::Conflict);
            }
            entries.insert(key, record.clone());
            Ok(record)
        })
    }

    pub fn replace(&self, record: V) -> Result<(), RepositoryError> {
        self.mutate(|entries| match entries.get_mut(&record.key()) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    pub fn remove(&self, key: &V::Key) -> Result<Option<V>, RepositoryError> {
        let mut guard = self.lock()?;
        let entries = self.loaded(&mut guard)?;
        if !entries.contains_key(key) {
            return Ok(None);
        }
        let mut next = entries.clone();
        let removed = next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(removed)
    }

    pub fn fetch(&self, key: &V::Key) -> Result<Option<V>, RepositoryError> {
        let mut guard = self.lock()?;
        let entries = self.loaded(&mut guard)?;
        Ok(entries.get(key).cloned())
    }

    /// Every record, oldest first.
    pub fn all(&self) -> Result<Vec<V>, RepositoryError> {
        self.filtered(|_| true)
    }

    pub fn filtered<F>(&self, predicate: F) -> Result<Vec<V>, RepositoryError>
    where
        F: Fn(&V) -> bool,
    {
        let mut guard = self.lock()?;
        let entries = self.loaded(&mut guard)?;
        let mut records: Vec<V> = entries
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect();
        sort_by_creation(&mut records);
        Ok(records)
    }

    /// Apply a single-record change to a copy of the collection, persist it, and only then make
    /// it visible. A failed write leaves the in-memory view untouched.
    fn mutate<T, F>(&self, change: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Entries<V>) -> Result<T, RepositoryError>,
    {
        let mut guard = self.lock()?;
        let entries = self.loaded(&mut guard)?;
        let mut next = entries.clone();
        let outcome = change(&mut next)?;
        self.persist(&next)?;
        *entries = next;
        Ok(outcome)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Entries<V>>>, RepositoryError> {
        self.entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("collection lock poisoned".to_string()))
    }

    fn loaded<'a>(
        &self,
        guard: &'a mut MutexGuard<'_, Option<Entries<V>>>,
    ) -> Result<&'a mut Entries<V>, RepositoryError> {
        if guard.is_none() {
            let records = match &self.path {
                Some(path) => read_records::<V>(path)?,
                None => Vec::new(),
            };
            let entries = records
                .into_iter()
                .map(|record| (record.key(), record))
                .collect();
            **guard = Some(entries);
        }

        guard
            .as_mut()
            .ok_or_else(|| RepositoryError::Unavailable("collection failed to load".to_string()))
    }

    fn persist(&self, entries: &Entries<V>) -> Result<(), RepositoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut records: Vec<V> = entries.values().cloned().collect();
        sort_by_creation(&mut records);

        let payload = serde_json::to_vec_pretty(&records).map_err(|source| {
            RepositoryError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RepositoryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload).map_err(|source| RepositoryError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, path).map_err(|source| RepositoryError::Io {
            path: path.clone(),
            source,
        })
    }
}

fn read_records<V: StoredRecord>(path: &Path) -> Result<Vec<V>, RepositoryError> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| RepositoryError::Corrupt {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn sort_by_creation<V: StoredRecord>(records: &mut [V]) {
    records.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.key().cmp(&b.key()))
    });
}
