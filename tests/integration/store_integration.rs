//! Store and repository integration: version chains survive save/load

use labtrack::error::StorageError;
use labtrack::metadata::{Entity, PrototypeRecord, RootDocument, UserRecord, VersionRecord};
use labtrack::store::{MetadataRepository, VersionedEntityStore};
use labtrack::types::{Timestamp, VersionId};
use std::fs;
use tempfile::TempDir;

fn prototype(summary: &str, description: &str) -> PrototypeRecord {
    let mut record = PrototypeRecord::default();
    record.description = description.to_string();
    record.stamp(summary.to_string(), Timestamp::now());
    record
}

#[test]
fn test_latest_version_is_numeric_after_reload() {
    let temp_dir = TempDir::new().unwrap();
    let repo = MetadataRepository::new(temp_dir.path());
    let mut store = VersionedEntityStore::new(repo.init().unwrap());

    store.create_entity("P1", prototype("v1", "1")).unwrap();
    for i in 2..=10 {
        store
            .append_version("P1", prototype("next", &i.to_string()))
            .unwrap();
    }
    repo.save(store.document()).unwrap();

    let reloaded = VersionedEntityStore::new(repo.load().unwrap());
    assert_eq!(
        reloaded.latest_version_id::<PrototypeRecord>("P1").unwrap(),
        VersionId::new(10).unwrap()
    );
    assert_eq!(
        reloaded.get_latest_version::<PrototypeRecord>("P1").unwrap().description,
        "10"
    );
}

#[test]
fn test_version_ten_wins_over_nine_in_hand_written_document() {
    let temp_dir = TempDir::new().unwrap();
    let repo = MetadataRepository::new(temp_dir.path());

    // Keys are written newest first; with sorted maps "10" still precedes "9".
    let mut versions = serde_json::Map::new();
    for i in (1..=10).rev() {
        let mut record = UserRecord::default();
        record.description = format!("v{}", i);
        versions.insert(i.to_string(), serde_json::to_value(record).unwrap());
    }
    let raw = serde_json::json!({
        "Projects": [],
        "Prototypes": [],
        "Experiments": [],
        "Users": [{"name": "ana", "versions": versions}]
    })
    .to_string();
    assert!(raw.find("\"10\"").unwrap() < raw.find("\"9\"").unwrap());
    fs::write(repo.metadata_path(), raw).unwrap();

    let store = VersionedEntityStore::new(repo.load().unwrap());
    assert_eq!(store.latest_version_id::<UserRecord>("ana").unwrap().get(), 10);
    assert_eq!(store.get_latest_version::<UserRecord>("ana").unwrap().description, "v10");

    let doc: RootDocument = store.into_document();
    let entity: &Entity<UserRecord> = &doc.users[0];
    let order: Vec<u32> = entity.versions.keys().map(|id| id.get()).collect();
    assert_eq!(order, (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_document_with_version_gap_is_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    let repo = MetadataRepository::new(temp_dir.path());
    let record = serde_json::to_value(prototype("v1", "")).unwrap();
    let doc = serde_json::json!({
        "Projects": [],
        "Prototypes": [{"name": "P1", "versions": {"1": record, "3": record}}],
        "Experiments": [],
        "Users": []
    });
    fs::write(repo.metadata_path(), doc.to_string()).unwrap();

    assert!(matches!(repo.load(), Err(StorageError::CorruptDocument(_))));
}

#[test]
fn test_item_with_path_and_children_rejected_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let repo = MetadataRepository::new(temp_dir.path());
    let mut record = serde_json::to_value(prototype("v1", "")).unwrap();
    record["uploaded_items"] = serde_json::json!([{"name": "x", "path": "/p", "children": []}]);
    let doc = serde_json::json!({
        "Projects": [],
        "Prototypes": [{"name": "P1", "versions": {"1": record}}],
        "Experiments": [],
        "Users": []
    });
    fs::write(repo.metadata_path(), doc.to_string()).unwrap();

    assert!(matches!(repo.load(), Err(StorageError::CorruptDocument(_))));
}

#[test]
fn test_init_keeps_existing_document() {
    let temp_dir = TempDir::new().unwrap();
    let repo = MetadataRepository::new(temp_dir.path());
    let mut store = VersionedEntityStore::new(repo.init().unwrap());
    store.create_entity("P1", prototype("v1", "kept")).unwrap();
    repo.save(store.document()).unwrap();

    let doc = repo.init().unwrap();
    assert_eq!(doc.prototypes.len(), 1);
}
