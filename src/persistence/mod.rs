//! Atomic save-with-history and reload of the belief store.
//!
//! Save order is fixed: archive the existing canonical file into the history
//! directory (named by its own version), write the new state to a temp path,
//! then atomically rename over the canonical path. A crash anywhere in the
//! sequence never loses the previous version. Load goes through a raw-value
//! migration step before strict deserialization so that older persisted
//! formats remain loadable.
//!
//! Crash consistency only: concurrent writers are out of scope and must be
//! prevented by the caller (single-process ownership of the file).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::beliefs::store::BeliefStore;
use crate::utilities::errors::PersistenceError;

/// File-backed persistence for one agent identity's belief store.
#[derive(Debug, Clone)]
pub struct SpongeStorage {
    /// Canonical state file (pretty-printed JSON).
    path: PathBuf,
    /// Directory of `sponge_v<N>.json` archives of prior versions.
    history_dir: PathBuf,
}

impl SpongeStorage {
    /// Storage rooted at `path`, with history in a `history/` sibling.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let history_dir = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("history");
        Self { path, history_dir }
    }

    /// Override the history directory.
    pub fn with_history_dir(mut self, history_dir: impl Into<PathBuf>) -> Self {
        self.history_dir = history_dir.into();
        self
    }

    /// The canonical state file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, or the seed state when nothing is persisted.
    pub fn load(&self) -> Result<BeliefStore, PersistenceError> {
        if !self.path.exists() {
            log::debug!("no belief state at {:?}, seeding", self.path);
            return Ok(BeliefStore::seed());
        }
        read_store(&self.path)
    }

    /// Load an archived version directly (rollback support).
    pub fn load_version(&self, version: u64) -> Result<BeliefStore, PersistenceError> {
        read_store(&self.history_dir.join(format!("sponge_v{}.json", version)))
    }

    /// Persist the store, archiving the prior file first.
    ///
    /// The prior canonical file (if any) is copied verbatim into the history
    /// directory under its own version number before anything is written;
    /// the new state gets that version plus one. The write itself goes to a
    /// temp path, is synced, and is renamed over the canonical path so there
    /// is no partial-write window.
    pub fn save(&self, store: &mut BeliefStore) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.path.exists() {
            let prior = fs::read_to_string(&self.path)?;
            let archived_version = serde_json::from_str::<Value>(&prior)
                .ok()
                .and_then(|v| v.get("version").and_then(Value::as_u64))
                .unwrap_or(store.version);
            fs::create_dir_all(&self.history_dir)?;
            let archive = self
                .history_dir
                .join(format!("sponge_v{}.json", archived_version));
            // The copy must land before the rename below; a crash in between
            // leaves both the archive and the old canonical file intact.
            fs::copy(&self.path, &archive)?;
            store.version = archived_version + 1;
        }

        let payload = serde_json::to_string_pretty(store)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        log::debug!("belief state v{} saved to {:?}", store.version, self.path);
        Ok(())
    }
}

fn read_store(path: &Path) -> Result<BeliefStore, PersistenceError> {
    let content = fs::read_to_string(path)?;
    let mut raw: Value = serde_json::from_str(&content)?;
    migrate(&mut raw);
    Ok(serde_json::from_value(raw)?)
}

/// Map older persisted shapes onto the current one.
///
/// Runs on the raw value before strict deserialization; renamed legacy keys
/// are moved (never clobbering a current key) and removed keys are dropped.
fn migrate(raw: &mut Value) {
    const RENAMED: [(&str, &str); 4] = [
        ("opinions", "opinion_vectors"),
        ("opinion_meta", "belief_meta"),
        ("identity_snapshot", "snapshot"),
        ("interactions", "interaction_count"),
    ];
    const REMOVED: [&str; 2] = ["episode_refs", "classifier_model"];

    let Some(map) = raw.as_object_mut() else {
        return;
    };
    for (old, new) in RENAMED {
        if map.contains_key(old) && !map.contains_key(new) {
            if let Some(value) = map.remove(old) {
                map.insert(new.to_string(), value);
            }
        } else {
            map.remove(old);
        }
    }
    for key in REMOVED {
        map.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> SpongeStorage {
        SpongeStorage::new(dir.path().join("sponge.json"))
    }

    fn populated_store() -> BeliefStore {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        store.update_opinion("ai_safety", 1.0, 0.2, "long argument", 1);
        store.update_opinion("tabs_vs_spaces", -1.0, 0.4, "style guide", 3);
        store.push_insight("user keeps citing preprints");
        store
    }

    #[test]
    fn test_missing_file_loads_seed() {
        let dir = TempDir::new().unwrap();
        let loaded = storage(&dir).load().unwrap();
        assert_eq!(loaded.version, 1);
        assert!(loaded.opinion_vectors.is_empty());
        assert!(!loaded.snapshot.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip_is_identical() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let mut store = populated_store();
        storage.save(&mut store).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            serde_json::to_value(&store).unwrap()
        );
    }

    #[test]
    fn test_versions_bump_and_archive() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let mut store = populated_store();

        storage.save(&mut store).unwrap();
        assert_eq!(store.version, 1);

        store.update_opinion("ai_safety", 1.0, 0.1, "", 1);
        storage.save(&mut store).unwrap();
        assert_eq!(store.version, 2);
        assert!(dir.path().join("history/sponge_v1.json").exists());

        storage.save(&mut store).unwrap();
        assert_eq!(store.version, 3);
        assert!(dir.path().join("history/sponge_v2.json").exists());
    }

    #[test]
    fn test_history_rollback_restores_old_state() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let mut store = populated_store();
        let original_opinion = store.opinion("ai_safety").unwrap();
        let original_snapshot = store.snapshot.clone();
        storage.save(&mut store).unwrap();

        store.update_opinion("ai_safety", -1.0, 0.5, "reversal", 1);
        store.snapshot = format!("{} And now for something different.", store.snapshot);
        storage.save(&mut store).unwrap();

        let rolled_back = storage.load_version(1).unwrap();
        assert_eq!(rolled_back.version, 1);
        assert_eq!(rolled_back.opinion("ai_safety"), Some(original_opinion));
        assert_eq!(rolled_back.snapshot, original_snapshot);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let mut store = populated_store();
        storage.save(&mut store).unwrap();
        assert!(!dir.path().join("sponge.json.tmp").exists());
    }

    #[test]
    fn test_legacy_format_migrates_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sponge.json");
        let legacy = json!({
            "version": 3,
            "interactions": 42,
            "opinions": { "ai_safety": 0.55 },
            "opinion_meta": {
                "ai_safety": {
                    "confidence": 0.4,
                    "evidence_count": 5,
                    "last_reinforced": 40
                }
            },
            "identity_snapshot": "An old-format snapshot that is long enough.",
            "episode_refs": ["ep-1", "ep-2"],
            "classifier_model": "some-model"
        });
        fs::write(&path, serde_json::to_string_pretty(&legacy).unwrap()).unwrap();

        let loaded = SpongeStorage::new(&path).load().unwrap();
        assert_eq!(loaded.version, 3);
        assert_eq!(loaded.interaction_count, 42);
        assert_eq!(loaded.opinion("ai_safety"), Some(0.55));
        let meta = loaded.meta("ai_safety").unwrap();
        assert_eq!(meta.evidence_count, 5);
        assert!(meta.recent_updates.is_empty());
        assert_eq!(loaded.snapshot, "An old-format snapshot that is long enough.");
    }

    #[test]
    fn test_corrupt_file_is_a_hard_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sponge.json");
        fs::write(&path, "{not json").unwrap();
        let result = SpongeStorage::new(&path).load();
        assert!(matches!(result, Err(PersistenceError::Serialization(_))));
    }
}
