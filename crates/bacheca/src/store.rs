//! Record collections bound to a storage slot.
//!
//! A [`RecordStore`] holds one ordered collection (newest first) and writes
//! the whole collection to its slot after every mutation. The in-memory
//! collection is only replaced once the write has succeeded, so a failed
//! call leaves the store exactly as it was.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::record::{new_id, Document, DocumentType, Record};
use crate::storage::SlotStorage;

/// An ordered, persisted collection of records of one kind.
#[derive(Debug)]
pub struct RecordStore<R: Record> {
    storage: Arc<dyn SlotStorage>,
    records: Vec<R>,
}

impl<R: Record> RecordStore<R> {
    /// Load the collection from storage.
    ///
    /// An empty slot is filled with the sample dataset (when `seed` is set)
    /// and written back. A slot that cannot be read or parsed is left
    /// untouched; the store starts from the samples in memory instead.
    #[must_use]
    pub fn load(storage: Arc<dyn SlotStorage>, seed: bool) -> Self {
        let initial = || if seed { R::samples() } else { Vec::new() };

        let records = match storage.read(R::SLOT) {
            Ok(Some(payload)) if !payload.trim().is_empty() => {
                match serde_json::from_str::<Vec<R>>(&payload) {
                    Ok(records) => {
                        debug!("Loaded {} records from slot '{}'", records.len(), R::SLOT);
                        records
                    }
                    Err(e) => {
                        warn!(
                            "Slot '{}' holds an unreadable collection, using defaults: {}",
                            R::SLOT,
                            e
                        );
                        initial()
                    }
                }
            }
            Ok(_) => {
                let records = initial();
                if seed {
                    info!("Seeding slot '{}' with {} samples", R::SLOT, records.len());
                    if let Err(e) = write_collection(storage.as_ref(), &records) {
                        warn!("Failed to persist samples for '{}': {}", R::SLOT, e);
                    }
                }
                records
            }
            Err(e) => {
                warn!("Failed to read slot '{}', using defaults: {}", R::SLOT, e);
                initial()
            }
        };

        Self { storage, records }
    }

    /// All records, newest first.
    #[must_use]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look a record up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Add a record at the front of the collection.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an incomplete draft, or a storage
    /// error if the collection could not be written.
    pub fn add(&mut self, draft: R::Draft) -> Result<R> {
        let record = R::create(draft, new_id(), Utc::now())?;

        let mut next = Vec::with_capacity(self.records.len() + 1);
        next.push(record.clone());
        next.extend(self.records.iter().cloned());

        self.commit(next)?;
        info!("Added {} {}", R::KIND, record.id());
        Ok(record)
    }

    /// Merge a patch into the record with the given id.
    ///
    /// Returns `None` (and writes nothing) if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the patch clears a required field, or
    /// a storage error if the collection could not be written.
    pub fn update(&mut self, id: &str, patch: R::Patch) -> Result<Option<R>> {
        let Some(index) = self.records.iter().position(|r| r.id() == id) else {
            debug!("No {} with id {} to update", R::KIND, id);
            return Ok(None);
        };

        let mut updated = self.records[index].clone();
        updated.apply(patch)?;
        updated.entry_mut().touch(Utc::now());

        let mut next = self.records.clone();
        next[index] = updated.clone();

        self.commit(next)?;
        info!("Updated {} {}", R::KIND, id);
        Ok(Some(updated))
    }

    /// Remove the record with the given id.
    ///
    /// Returns whether a record was removed. Removing an unknown id is a
    /// no-op and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection could not be written.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }

        let next: Vec<R> = self.records.iter().filter(|r| r.id() != id).cloned().collect();
        self.commit(next)?;
        info!("Removed {} {}", R::KIND, id);
        Ok(true)
    }

    /// Records whose title, content, category, or tags contain `query`,
    /// ignoring case. An empty query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&R> {
        if query.is_empty() {
            return self.records.iter().collect();
        }
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.entry().matches(&needle))
            .collect()
    }

    /// Records in exactly the given category.
    #[must_use]
    pub fn filter_by_category(&self, category: &str) -> Vec<&R> {
        self.records
            .iter()
            .filter(|r| r.entry().category == category)
            .collect()
    }

    fn commit(&mut self, next: Vec<R>) -> Result<()> {
        write_collection(self.storage.as_ref(), &next)?;
        self.records = next;
        Ok(())
    }
}

impl RecordStore<Document> {
    /// Documents of the given kind.
    #[must_use]
    pub fn filter_by_type(&self, kind: DocumentType) -> Vec<&Document> {
        self.records.iter().filter(|d| d.kind == kind).collect()
    }
}

fn write_collection<R: Record>(storage: &dyn SlotStorage, records: &[R]) -> Result<()> {
    let payload = serde_json::to_string(records)?;
    storage.write(R::SLOT, &payload)?;
    debug!("Wrote {} records to slot '{}'", records.len(), R::SLOT);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::record::{DocumentDraft, DocumentPatch, EntryDraft, EntryPatch, NewsItem, Priority};
    use crate::storage::{MemorySlots, Slot};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Slot backend whose reads and writes can be made to fail.
    #[derive(Debug, Default)]
    struct FlakySlots {
        inner: MemorySlots,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl FlakySlots {
        fn failing_writes() -> Self {
            let slots = Self::default();
            slots.fail_writes.store(true, Ordering::SeqCst);
            slots
        }
    }

    impl SlotStorage for FlakySlots {
        fn read(&self, slot: Slot) -> Result<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(Error::slot_read(slot, "device unavailable"));
            }
            self.inner.read(slot)
        }

        fn write(&self, slot: Slot, payload: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::slot_write(slot, "disk full"));
            }
            self.inner.write(slot, payload)
        }

        fn remove(&self, slot: Slot) -> Result<()> {
            self.inner.remove(slot)
        }

        fn location(&self) -> String {
            "flaky".to_string()
        }
    }

    fn empty_docs() -> (Arc<MemorySlots>, RecordStore<Document>) {
        let slots = Arc::new(MemorySlots::new());
        let store = RecordStore::load(slots.clone(), false);
        (slots, store)
    }

    fn draft(title: &str) -> DocumentDraft {
        DocumentDraft::new(
            DocumentType::Ordinance,
            EntryDraft {
                title: title.to_string(),
                content: "Divieto di transito".to_string(),
                category: "Traffico".to_string(),
                author: "Comandante".to_string(),
                ..EntryDraft::default()
            },
        )
    }

    #[test]
    fn test_load_empty_slot_seeds_and_persists() {
        let slots = Arc::new(MemorySlots::new());
        let store: RecordStore<Document> = RecordStore::load(slots.clone(), true);

        assert_eq!(store.len(), 2);
        let stored = slots.read(Slot::Documents).unwrap().unwrap();
        let parsed: Vec<Document> = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, store.records());
    }

    #[test]
    fn test_load_without_seed_is_empty() {
        let (slots, store) = empty_docs();
        assert!(store.is_empty());
        assert!(slots.read(Slot::Documents).unwrap().is_none());
    }

    #[test]
    fn test_load_existing_collection() {
        let slots = Arc::new(MemorySlots::new());
        let mut first: RecordStore<NewsItem> = RecordStore::load(slots.clone(), true);
        first.remove("1").unwrap();

        let second: RecordStore<NewsItem> = RecordStore::load(slots, true);
        assert_eq!(second.len(), 1);
        assert_eq!(second.records()[0].id, "2");
    }

    #[test]
    fn test_load_corrupt_payload_keeps_stored_text() {
        let slots = Arc::new(MemorySlots::new());
        slots.write(Slot::Documents, "{not json").unwrap();

        let store: RecordStore<Document> = RecordStore::load(slots.clone(), true);
        assert_eq!(store.len(), 2);
        assert_eq!(
            slots.read(Slot::Documents).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_load_unreadable_slot_uses_samples() {
        crate::logging::init_test_logging();
        let slots = Arc::new(FlakySlots::default());
        slots.fail_reads.store(true, Ordering::SeqCst);

        let store: RecordStore<NewsItem> = RecordStore::load(slots.clone(), true);
        assert_eq!(store.len(), 2);
        assert!(slots.inner.read(Slot::News).unwrap().is_none());
    }

    #[test]
    fn test_add_then_get() {
        let (_, mut store) = empty_docs();
        let added = store.add(draft("Ordinanza A")).unwrap();

        let got = store.get(&added.id).unwrap();
        assert_eq!(got.created_at, got.updated_at);
        assert_eq!(got.title, "Ordinanza A");
        assert_eq!(got.category, "Traffico");
        assert_eq!(got.kind, DocumentType::Ordinance);
        assert_eq!(got.priority, Priority::Medium);
    }

    #[test]
    fn test_add_prepends_and_persists() {
        let (slots, mut store) = empty_docs();
        store.add(draft("first")).unwrap();
        let second = store.add(draft("second")).unwrap();

        assert_eq!(store.records()[0].id, second.id);
        let stored: Vec<Document> =
            serde_json::from_str(&slots.read(Slot::Documents).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].title, "second");
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let (_, mut store) = empty_docs();
        let a = store.add(draft("a")).unwrap();
        let b = store.add(draft("b")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_add_invalid_draft_writes_nothing() {
        let (slots, mut store) = empty_docs();
        let err = store.add(draft("  ")).unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty());
        assert!(slots.read(Slot::Documents).unwrap().is_none());
    }

    #[test]
    fn test_update_changes_only_patched_field() {
        let (_, mut store) = empty_docs();
        let before = store.add(draft("Ordinanza A")).unwrap();

        let patch = DocumentPatch::from(EntryPatch {
            title: Some("Ordinanza B".to_string()),
            ..EntryPatch::default()
        });
        let after = store.update(&before.id, patch).unwrap().unwrap();

        assert_eq!(after.title, "Ordinanza B");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.content, before.content);
        assert_eq!(after.category, before.category);
        assert_eq!(after.author, before.author);
        assert_eq!(after.kind, before.kind);
        assert_eq!(store.get(&before.id), Some(&after));
    }

    #[test]
    fn test_update_unknown_id_returns_none() {
        let (slots, mut store) = empty_docs();
        let result = store.update("missing", DocumentPatch::default()).unwrap();
        assert!(result.is_none());
        assert!(slots.read(Slot::Documents).unwrap().is_none());
    }

    #[test]
    fn test_update_invalid_patch_leaves_store_unchanged() {
        let (_, mut store) = empty_docs();
        let doc = store.add(draft("Ordinanza A")).unwrap();

        let patch = DocumentPatch::from(EntryPatch {
            author: Some(String::new()),
            ..EntryPatch::default()
        });
        assert!(store.update(&doc.id, patch).is_err());
        assert_eq!(store.get(&doc.id), Some(&doc));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (slots, mut store) = empty_docs();
        let keep = store.add(draft("keep")).unwrap();
        let gone = store.add(draft("gone")).unwrap();

        assert!(store.remove(&gone.id).unwrap());
        let once = slots.read(Slot::Documents).unwrap();
        let records_once = store.records().to_vec();

        assert!(!store.remove(&gone.id).unwrap());
        assert_eq!(slots.read(Slot::Documents).unwrap(), once);
        assert_eq!(store.records(), records_once.as_slice());
        assert_eq!(store.records()[0].id, keep.id);
    }

    #[test]
    fn test_search_empty_returns_all_in_order() {
        let slots = Arc::new(MemorySlots::new());
        let store: RecordStore<Document> = RecordStore::load(slots, true);

        let all: Vec<&str> = store.search("").iter().map(|d| d.id()).collect();
        let ids: Vec<&str> = store.records().iter().map(|d| d.id()).collect();
        assert_eq!(all, ids);
    }

    #[test]
    fn test_search_example() {
        let (_, mut store) = empty_docs();
        let doc = store.add(draft("Ordinanza A")).unwrap();

        let hits = store.search("ordinanza");
        assert!(hits.iter().any(|d| d.id == doc.id));
        assert!(store.search("zzz").is_empty());
    }

    #[test]
    fn test_search_matches_tags_and_category() {
        let slots = Arc::new(MemorySlots::new());
        let store: RecordStore<NewsItem> = RecordStore::load(slots, true);

        let by_tag = store.search("CODICE STRADA");
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, "2");

        let by_category = store.search("disposiz");
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].id, "1");
    }

    #[test]
    fn test_filters() {
        let slots = Arc::new(MemorySlots::new());
        let store: RecordStore<Document> = RecordStore::load(slots, true);

        assert_eq!(store.filter_by_category("Traffico").len(), 1);
        assert!(store.filter_by_category("traffico").is_empty());
        assert_eq!(store.filter_by_type(DocumentType::Template).len(), 1);
        assert!(store.filter_by_type(DocumentType::Circular).is_empty());
    }

    #[test]
    fn test_failed_write_leaves_collection_unchanged() {
        crate::logging::init_test_logging();
        let slots = Arc::new(FlakySlots::failing_writes());
        let mut store: RecordStore<Document> = RecordStore::load(slots.clone(), true);
        assert_eq!(store.len(), 2);
        let before = store.records().to_vec();

        let err = store.add(draft("Ordinanza A")).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(store.records(), before.as_slice());

        let patch = DocumentPatch::from(EntryPatch {
            title: Some("changed".to_string()),
            ..EntryPatch::default()
        });
        assert!(store.update("1", patch.clone()).is_err());
        assert!(store.remove("1").is_err());
        assert_eq!(store.records(), before.as_slice());

        slots.fail_writes.store(false, Ordering::SeqCst);
        let updated = store.update("1", patch).unwrap().unwrap();
        assert_eq!(updated.title, "changed");
        assert!(store.remove("2").unwrap());
        assert_eq!(store.len(), 1);
    }
}
