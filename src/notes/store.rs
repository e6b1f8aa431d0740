use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{NoteKey, NotesMap};
use crate::error::Result;

/// Key under which the whole notes document is stored.
pub const DEFAULT_STORAGE_KEY: &str = "escalasAppNotes";

const STORE_FILE_EXT: &str = "json";

/// String-keyed persistent storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = MemoryStore::new();
        store.lock().insert(key.to_owned(), value.to_owned());
        store
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(FileStore {
            dir: dir.to_owned(),
        })
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, STORE_FILE_EXT))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_of(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_of(key);
        let tmp = self.dir.join(format!(".{}.{}.tmp", key, STORE_FILE_EXT));

        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Reads the notes document, falling back to an empty map if it is missing,
/// unreadable or malformed.
pub fn read_notes<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> NotesMap {
    match store.get(key) {
        Ok(Some(raw)) => NotesMap::from_json(&raw).unwrap_or_else(|err| {
            log::warn!("Ignoring stored notes under '{}': {}", key, err);
            NotesMap::new()
        }),
        Ok(None) => NotesMap::new(),
        Err(err) => {
            log::warn!("Could not read notes under '{}': {}", key, err);
            NotesMap::new()
        }
    }
}

/// Owns the current notes snapshot and its backing store.
///
/// Mutations never touch a published snapshot: they copy it, apply the
/// change, persist the copy and only then swap it in. Writers are
/// serialised by the snapshot lock, so a failed write leaves the previous
/// snapshot in place.
pub struct NoteStore<S: KeyValueStore> {
    store: S,
    key: String,
    current: Mutex<Arc<NotesMap>>,
}

impl<S: KeyValueStore> NoteStore<S> {
    pub fn load(store: S) -> Self {
        Self::load_with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn load_with_key(store: S, key: &str) -> Self {
        let notes = read_notes(&store, key);
        log::debug!("Loaded notes for {} days", notes.len());

        NoteStore {
            store,
            key: key.to_owned(),
            current: Mutex::new(Arc::new(notes)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arc<NotesMap>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Arc<NotesMap> {
        Arc::clone(&*self.lock())
    }

    pub fn lookup(&self, key: &NoteKey) -> Option<String> {
        self.lock().lookup(key).map(str::to_owned)
    }

    pub fn save(&self, key: &NoteKey, text: &str) -> Result<Arc<NotesMap>> {
        log::debug!("Saving note {} {}", key.date_key(), key.slot());
        self.update(|notes| notes.with_note(key, text))
    }

    /// Removes a note. Persists even when there was nothing to remove.
    pub fn clear(&self, key: &NoteKey) -> Result<Arc<NotesMap>> {
        log::debug!("Clearing note {} {}", key.date_key(), key.slot());
        self.update(|notes| notes.without_note(key))
    }

    fn update<F>(&self, change: F) -> Result<Arc<NotesMap>>
    where
        F: FnOnce(&NotesMap) -> NotesMap,
    {
        let mut current = self.lock();
        let next = change(&current);

        if let Err(err) = next.to_json().and_then(|json| self.store.set(&self.key, &json)) {
            log::error!("Could not persist notes under '{}': {}", self.key, err);
            return Err(err);
        }

        *current = Arc::new(next);
        Ok(Arc::clone(&*current))
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date_key;
    use crate::error::{Error, ErrorKind};
    use crate::schedule::ScheduleType;

    fn key(date: &str, schedule: u8, rotation: usize) -> NoteKey {
        NoteKey::new(
            parse_date_key(date).unwrap(),
            ScheduleType::from_number(schedule).unwrap(),
            rotation,
        )
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::from(io::Error::from(io::ErrorKind::PermissionDenied)))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::new(
                ErrorKind::IOError(io::Error::from(io::ErrorKind::PermissionDenied)),
                "read only",
            ))
        }
    }

    #[test]
    fn save_then_reload_then_clear() {
        let k = key("2025-06-15", 2, 3);
        let notes = NoteStore::load(MemoryStore::new());
        notes.save(&k, "hello").unwrap();

        let reloaded = NoteStore::load(notes.into_inner());
        assert_eq!(reloaded.lookup(&k).as_deref(), Some("hello"));

        let cleared = reloaded.clear(&k).unwrap();
        assert!(cleared.is_empty());

        let store = reloaded.into_inner();
        assert_eq!(store.get(DEFAULT_STORAGE_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn snapshots_are_not_mutated_by_later_writes() {
        let notes = NoteStore::load(MemoryStore::new());
        let before = notes.snapshot();
        let after = notes.save(&key("2025-06-15", 1, 1), "x").unwrap();

        assert!(before.is_empty());
        assert_eq!(after.len(), 1);
        assert_eq!(notes.snapshot(), after);
    }

    #[test]
    fn clearing_missing_note_still_persists() {
        let existing = key("2025-06-15", 2, 3);
        let store = MemoryStore::new();
        let notes = NoteStore::load(store);
        let saved = notes.save(&existing, "a").unwrap();

        let cleared = notes.clear(&key("2030-01-01", 4, 8)).unwrap();
        assert_eq!(cleared, saved);

        let raw = notes.into_inner().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(NotesMap::from_json(&raw).unwrap(), *saved);
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        let notes = Arc::new(NoteStore::load(MemoryStore::new()));

        let handles: Vec<_> = (1..=8usize)
            .map(|rotation| {
                let notes = Arc::clone(&notes);
                std::thread::spawn(move || {
                    for day in 1..=10 {
                        let k = key(&format!("2025-03-{:02}", day), 1, rotation);
                        notes.save(&k, &format!("{}-{}", day, rotation)).unwrap();
                    }
                    let k = key("2025-03-01", 1, rotation);
                    notes.clear(&k).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = notes.snapshot();
        // day 1 was cleared by every writer
        assert_eq!(snapshot.len(), 9);
        for rotation in 1..=8 {
            assert_eq!(snapshot.lookup(&key("2025-03-01", 1, rotation)), None);
            assert_eq!(
                snapshot.lookup(&key("2025-03-10", 1, rotation)),
                Some(format!("10-{}", rotation).as_str())
            );
        }

        let notes = Arc::try_unwrap(notes).ok().unwrap();
        let raw = notes.into_inner().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(NotesMap::from_json(&raw).unwrap(), *snapshot);
    }

    #[test]
    fn corrupt_document_loads_empty() {
        let store = MemoryStore::with_entry(DEFAULT_STORAGE_KEY, "{not json");
        let notes = NoteStore::load(store);
        assert!(notes.snapshot().is_empty());
    }

    #[test]
    fn failed_writes_keep_previous_snapshot() {
        let notes = NoteStore::load(ReadOnlyStore);
        assert!(notes.snapshot().is_empty());
        assert!(notes.save(&key("2025-06-15", 1, 1), "x").is_err());
        assert!(notes.snapshot().is_empty());
    }

    #[test]
    fn custom_storage_key() {
        let notes = NoteStore::load_with_key(MemoryStore::new(), "other");
        notes.save(&key("2025-06-15", 1, 1), "x").unwrap();

        let store = notes.into_inner();
        assert!(store.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
        assert!(store.get("other").unwrap().is_some());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert_eq!(store.get("missing").unwrap(), None);
        store.set("notes", "{}").unwrap();
        store.set("notes", r#"{"2025-01-01":{"1_1":"a"}}"#).unwrap();
        assert_eq!(
            store.get("notes").unwrap().as_deref(),
            Some(r#"{"2025-01-01":{"1_1":"a"}}"#)
        );
        assert!(dir.path().join("notes.json").is_file());
    }

    #[test]
    fn file_backed_note_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let k = key("2025-02-28", 3, 18);

        let notes = NoteStore::load(FileStore::new(dir.path()).unwrap());
        notes.save(&k, "troca de turno").unwrap();
        drop(notes);

        let notes = NoteStore::load(FileStore::new(dir.path()).unwrap());
        assert_eq!(notes.lookup(&k).as_deref(), Some("troca de turno"));
    }
}
