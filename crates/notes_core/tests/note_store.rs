use notes_core::{
    Clock, DisabledSlotStore, ManualClock, MemorySlotStore, Note, NoteDraft, NoteStore,
    NoteStoreError, PersistenceBridge, PersistenceError, SlotStore, DEFAULT_SLOT_KEY,
};
use std::sync::{Arc, Mutex};

fn memory_store(clock: &ManualClock) -> NoteStore<MemorySlotStore, &ManualClock> {
    NoteStore::open(PersistenceBridge::new(MemorySlotStore::new()), clock)
}

fn persisted<S: SlotStore>(store: &S) -> Vec<Note> {
    let payload = store
        .read_slot(DEFAULT_SLOT_KEY)
        .unwrap()
        .expect("slot should be written");
    serde_json::from_str(&payload).unwrap()
}

#[test]
fn blank_drafts_are_no_ops_for_create_and_update() {
    let clock = ManualClock::stepping(1_000, 10);
    let mut store = memory_store(&clock);
    let kept = store
        .create(NoteDraft::new("Keep", "me"))
        .expect("non-blank draft")
        .value;

    for draft in [
        NoteDraft::new("", ""),
        NoteDraft::new("   ", "\n\t"),
        NoteDraft::new("\u{3000}", " "),
        NoteDraft::new("\u{FEFF}", " "),
        NoteDraft::new("", "\u{FEFF}\u{FEFF}"),
    ] {
        assert!(store.create(draft.clone()).is_none());
        assert!(store.update(&kept.id, draft).unwrap().is_none());
    }

    assert_eq!(store.list(), vec![kept]);
}

#[test]
fn create_stamps_equal_timestamps_and_fresh_id() {
    let clock = ManualClock::stepping(5_000, 10);
    let mut store = memory_store(&clock);
    let first = store.create(NoteDraft::new("a", "")).unwrap().value;
    let second = store.create(NoteDraft::new("", "b")).unwrap().value;

    assert_eq!(first.created, first.updated);
    assert_eq!(second.created, second.updated);
    assert_eq!(first.created, 5_000);
    assert_ne!(first.id, second.id);
    assert!(!first.id.is_empty());
}

#[test]
fn update_preserves_identity_and_replaces_payload() {
    let clock = ManualClock::stepping(1_000, 10);
    let mut store = memory_store(&clock);
    let original = store.create(NoteDraft::new("t", "c")).unwrap().value;

    let commit = store
        .update(&original.id, NoteDraft::new("", "new content"))
        .unwrap()
        .expect("non-blank draft");
    assert!(commit.is_durable());
    let updated = commit.value;
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created, original.created);
    assert!(updated.updated > original.updated);
    assert_eq!(updated.title, "");
    assert_eq!(updated.content, "new content");
    assert_eq!(store.get(&original.id), Some(updated));
}

#[test]
fn update_never_moves_updated_backwards() {
    let clock = ManualClock::fixed(9_000);
    let mut store = memory_store(&clock);
    let note = store.create(NoteDraft::new("t", "")).unwrap().value;

    clock.set(1_000);
    let updated = store
        .update(&note.id, NoteDraft::new("t2", ""))
        .unwrap()
        .unwrap()
        .value;
    assert_eq!(updated.updated, 9_000);
    assert!(updated.created <= updated.updated);
}

#[test]
fn update_missing_id_returns_not_found_even_for_blank_draft() {
    let clock = ManualClock::fixed(1);
    let mut store = memory_store(&clock);

    let err = store.update("missing", NoteDraft::new("x", "")).unwrap_err();
    assert!(matches!(err, NoteStoreError::NotFound(ref id) if id == "missing"));

    let err = store.update("missing", NoteDraft::default()).unwrap_err();
    assert!(matches!(err, NoteStoreError::NotFound(_)));
    assert!(store.is_empty());
}

#[test]
fn delete_removes_exactly_one_note() {
    let clock = ManualClock::stepping(1, 1);
    let mut store = memory_store(&clock);
    let a = store.create(NoteDraft::new("a", "")).unwrap().value;
    let b = store.create(NoteDraft::new("b", "")).unwrap().value;

    assert!(store.delete(&a.id).value);
    assert_eq!(store.list(), vec![b.clone()]);

    let absent = store.delete(&a.id);
    assert!(!absent.value);
    assert!(absent.is_durable());
    assert_eq!(store.list(), vec![b]);
}

#[test]
fn list_sorts_by_updated_desc_and_keeps_insertion_order_for_ties() {
    let clock = ManualClock::fixed(100);
    let mut store = memory_store(&clock);
    let first = store.create(NoteDraft::new("first", "")).unwrap().value;
    let second = store.create(NoteDraft::new("second", "")).unwrap().value;
    clock.set(200);
    let third = store.create(NoteDraft::new("third", "")).unwrap().value;

    let titles = |notes: Vec<Note>| notes.into_iter().map(|n| n.title).collect::<Vec<_>>();
    assert_eq!(titles(store.list()), ["third", "first", "second"]);

    clock.set(300);
    store.update(&first.id, NoteDraft::new("first", "edited")).unwrap();
    assert_eq!(titles(store.list()), ["first", "third", "second"]);

    assert_ne!(second.id, third.id);
}

#[test]
fn every_committed_mutation_is_flushed_before_returning() {
    let clock = ManualClock::stepping(10, 10);
    let mut store = NoteStore::open(PersistenceBridge::new(MemorySlotStore::new()), &clock);

    let note = store.create(NoteDraft::new("t", "c")).unwrap().value;
    let reopened = NoteStore::open(
        PersistenceBridge::new(slot_snapshot(&store)),
        ManualClock::fixed(0),
    );
    assert_eq!(reopened.list(), vec![note.clone()]);

    let updated = store
        .update(&note.id, NoteDraft::new("t", "c2"))
        .unwrap()
        .unwrap()
        .value;
    assert_eq!(persisted_from(&store), vec![updated]);

    store.delete(&note.id);
    assert!(persisted_from(&store).is_empty());
}

#[test]
fn grocery_scenario() {
    let clock = ManualClock::stepping(1_700_000_000_000, 1_000);
    let mut store = memory_store(&clock);

    let a = store
        .create(NoteDraft::new("Groceries", "Milk, eggs"))
        .unwrap()
        .value;
    assert_eq!(store.list(), vec![a.clone()]);

    assert!(store.create(NoteDraft::new("", "  ")).is_none());
    assert_eq!(store.list(), vec![a.clone()]);

    let a2 = store
        .update(&a.id, NoteDraft::new("Groceries", "Milk, eggs, bread"))
        .unwrap()
        .unwrap()
        .value;
    assert_eq!(a2.content, "Milk, eggs, bread");
    assert!(a2.updated > a.updated);
    assert_eq!(store.list(), vec![a2]);

    assert!(store.delete(&a.id).value);
    assert!(store.list().is_empty());
}

#[test]
fn write_failure_keeps_in_memory_state() {
    let clock = ManualClock::stepping(1, 1);
    let mut store = NoteStore::open(
        PersistenceBridge::new(DisabledSlotStore::new("storage disabled")),
        &clock,
    );

    let commit = store.create(NoteDraft::new("offline", "still here")).unwrap();
    assert!(matches!(
        commit.persist_warning,
        Some(PersistenceError::Storage(_))
    ));
    assert_eq!(store.list(), vec![commit.value.clone()]);

    let updated = store
        .update(&commit.value.id, NoteDraft::new("offline", "edited"))
        .unwrap()
        .unwrap();
    assert!(!updated.is_durable());
    assert_eq!(store.list()[0].content, "edited");

    let deleted = store.delete(&commit.value.id);
    assert!(deleted.value);
    assert!(deleted.persist_warning.is_some());
    assert!(store.is_empty());
}

#[test]
fn subscribers_see_sorted_list_after_committed_mutations_only() {
    let clock = ManualClock::stepping(100, 100);
    let mut store = memory_store(&clock);
    let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
    let sink = Arc::clone(&seen);

    let (_id, initial) = store.subscribe(move |notes| {
        let titles = notes.iter().map(|note| note.title.clone()).collect();
        sink.lock().unwrap().push(titles);
    });
    assert!(initial.is_empty());

    let a = store.create(NoteDraft::new("a", "")).unwrap().value;
    store.create(NoteDraft::new("b", "")).unwrap();
    store.create(NoteDraft::default());
    store.update(&a.id, NoteDraft::default()).unwrap();
    store.delete("missing");
    store.update(&a.id, NoteDraft::new("a2", "")).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "a".to_string()],
            vec!["a2".to_string(), "b".to_string()],
        ]
    );
}

#[test]
fn store_open_resets_corrupted_slot() {
    let slot = MemorySlotStore::new().with_slot(DEFAULT_SLOT_KEY, "not json at all");
    let clock = ManualClock::fixed(1_234);
    let mut store = NoteStore::open(PersistenceBridge::new(slot), &clock);
    assert!(store.is_empty());

    let note = store.create(NoteDraft::new("fresh", "")).unwrap();
    assert!(note.is_durable());
    assert_eq!(store.len(), 1);
}

fn slot_snapshot<C: Clock>(store: &NoteStore<MemorySlotStore, C>) -> MemorySlotStore {
    let notes = persisted_from(store);
    MemorySlotStore::new().with_slot(DEFAULT_SLOT_KEY, serde_json::to_string(&notes).unwrap())
}

fn persisted_from<C: Clock>(store: &NoteStore<MemorySlotStore, C>) -> Vec<Note> {
    persisted(store.bridge().store())
}
