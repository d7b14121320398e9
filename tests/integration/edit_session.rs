//! Edit sessions against managed storage: uploads, edits, removals, folders

use labtrack::change::{reconcile, CommitOutcome, EditSession};
use labtrack::error::StorageError;
use labtrack::metadata::{PrototypeRecord, UserRecord};
use labtrack::store::VersionedEntityStore;
use labtrack::tree::node::{find_item, Item};
use labtrack::tree::path::strip_timestamp;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::integration::write_file;

fn create_prototype(store: &mut VersionedEntityStore, base: &Path, src: &Path) {
    let mut session = EditSession::create(base, "P1", PrototypeRecord::default()).unwrap();
    session
        .upload_files(&[write_file(src, "report.docx", "draft one")])
        .unwrap();
    session
        .upload_folder(&{
            write_file(src, "rig/readme.md", "rig");
            write_file(src, "rig/logs/run1.csv", "1,2");
            src.join("rig")
        })
        .unwrap();
    assert_eq!(
        session.commit(store, "initial").unwrap(),
        CommitOutcome::Written(labtrack::types::VersionId::FIRST)
    );
}

fn is_revision_of(name: &str, original: &str) -> bool {
    let (stem, ext) = original.rsplit_once('.').unwrap();
    let Some(rest) = name.strip_prefix(&format!("{}_", stem)) else {
        return false;
    };
    let Some(digits) = rest.strip_suffix(&format!(".{}", ext)) else {
        return false;
    };
    digits.len() == 14 && digits.bytes().all(|b| b.is_ascii_digit())
}

#[test]
fn test_content_edit_creates_revision_and_keeps_original() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let mut store = VersionedEntityStore::default();
    create_prototype(&mut store, base.path(), src.path());

    let mut session = EditSession::<PrototypeRecord>::open(&store, base.path(), "P1", None).unwrap();
    let original = find_item(session.items(), &["report.docx"])
        .and_then(Item::path)
        .unwrap()
        .to_path_buf();
    let temp = session.open_for_edit(&["report.docx"]).unwrap();
    assert_eq!(temp.extension().unwrap(), "docx");
    fs::write(&temp, "draft two").unwrap();

    let outcome = session.commit(&mut store, "revised report").unwrap();
    assert_eq!(outcome, CommitOutcome::Written(labtrack::types::VersionId::new(2).unwrap()));
    assert!(!temp.exists());

    let latest = store.get_latest_version::<PrototypeRecord>("P1").unwrap();
    let revised = latest
        .uploaded_items
        .iter()
        .find(|i| !i.is_folder())
        .unwrap();
    assert!(is_revision_of(revised.name(), "report.docx"), "{}", revised.name());
    assert_eq!(strip_timestamp(revised.name()), "report.docx");
    let revised_path = revised.path().unwrap();
    assert_ne!(revised_path, original.as_path());
    assert_eq!(revised_path.parent(), original.parent());
    assert_eq!(fs::read_to_string(revised_path).unwrap(), "draft two");
    assert_eq!(fs::read_to_string(&original).unwrap(), "draft one");

    let first = store
        .get_version::<PrototypeRecord>("P1", labtrack::types::VersionId::FIRST)
        .unwrap();
    assert_eq!(first.uploaded_items[0].path(), Some(original.as_path()));
}

#[test]
fn test_noop_edit_never_appends() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let mut store = VersionedEntityStore::default();
    create_prototype(&mut store, base.path(), src.path());

    for _ in 0..3 {
        let mut session =
            EditSession::<PrototypeRecord>::open(&store, base.path(), "P1", None).unwrap();
        session.open_for_edit(&["rig", "logs", "run1.csv"]).unwrap();
        assert_eq!(session.commit(&mut store, "nothing").unwrap(), CommitOutcome::NoChange);
    }
    assert_eq!(store.version_history::<PrototypeRecord>("P1").unwrap().len(), 1);
}

#[test]
fn test_removal_is_a_change_and_does_not_reappear() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let mut store = VersionedEntityStore::default();
    create_prototype(&mut store, base.path(), src.path());

    let mut session = EditSession::<PrototypeRecord>::open(&store, base.path(), "P1", None).unwrap();
    session.remove_item(&["report.docx"]).unwrap();
    session.commit(&mut store, "dropped report").unwrap();

    let latest = store.get_latest_version::<PrototypeRecord>("P1").unwrap();
    assert_eq!(latest.uploaded_items.len(), 1);
    assert!(find_item(&latest.uploaded_items, &["report.docx"]).is_none());
    assert!(base
        .path()
        .join("Prototype Files")
        .join("P1")
        .join("report.docx")
        .exists());
}

#[test]
fn test_file_added_inside_existing_folder() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let mut store = VersionedEntityStore::default();
    create_prototype(&mut store, base.path(), src.path());

    let mut session = EditSession::<PrototypeRecord>::open(&store, base.path(), "P1", None).unwrap();
    let report = session
        .upload_files_into(&["rig"], &[write_file(src.path(), "extra/notes.txt", "n")])
        .unwrap();
    assert_eq!(report.added, vec!["notes.txt".to_string()]);
    session.commit(&mut store, "notes").unwrap();

    let latest = store.get_latest_version::<PrototypeRecord>("P1").unwrap();
    let Some(Item::Folder(rig)) = find_item(&latest.uploaded_items, &["rig"]) else {
        panic!("rig folder missing");
    };
    let mut names: Vec<&str> = rig.children.iter().map(Item::name).collect();
    names.sort();
    assert_eq!(names, vec!["logs", "notes.txt", "readme.md"]);
}

#[test]
fn test_folder_recursion_via_reconcile() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "docs/a.txt", "a");
    let b = write_file(dir.path(), "docs/b.txt", "b");
    let previous = vec![Item::folder("docs", vec![Item::file("a.txt", a.clone())])];
    let current = vec![Item::folder(
        "docs",
        vec![Item::file("a.txt", a), Item::file("b.txt", b)],
    )];

    let (items, changed) = reconcile(&previous, &current, &HashMap::new()).unwrap();
    assert!(changed);
    assert_eq!(items, current);
}

#[test]
fn test_image_folder_upload_skips_other_files() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    write_file(src.path(), "shots/front.PNG", "img");
    write_file(src.path(), "shots/notes.txt", "text");
    write_file(src.path(), "shots/detail/close.jpeg", "img");

    let mut store = VersionedEntityStore::default();
    let mut session = EditSession::create(base.path(), "ana", UserRecord::default()).unwrap();
    session.upload_image_folder(&src.path().join("shots")).unwrap();
    session.commit(&mut store, "photos").unwrap();

    let latest = store.get_latest_version::<UserRecord>("ana").unwrap();
    assert_eq!(latest.uploaded_items[0].file_count(), 2);
    assert!(find_item(&latest.uploaded_items, &["shots", "notes.txt"]).is_none());
}

#[test]
fn test_duplicate_folder_upload_skipped() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let mut store = VersionedEntityStore::default();
    create_prototype(&mut store, base.path(), src.path());

    let mut session = EditSession::<PrototypeRecord>::open(&store, base.path(), "P1", None).unwrap();
    let report = session.upload_folder(&src.path().join("rig")).unwrap();
    assert_eq!(report.skipped, vec!["rig".to_string()]);
    assert_eq!(session.commit(&mut store, "same").unwrap(), CommitOutcome::NoChange);
}

#[test]
fn test_upload_of_missing_file_fails_without_partial_upload() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let good = write_file(src.path(), "good.txt", "g");
    let mut session = EditSession::create(base.path(), "ana", UserRecord::default()).unwrap();

    let err = session
        .upload_files(&[good, src.path().join("missing.txt")])
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidPath(_)));
    assert!(session.items().is_empty());
}

#[test]
fn test_reupload_under_removed_name_writes_version() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let mut store = VersionedEntityStore::default();
    create_prototype(&mut store, base.path(), src.path());
    let original = find_item(
        store.get_latest_version::<PrototypeRecord>("P1").unwrap().uploaded_items.as_slice(),
        &["report.docx"],
    )
    .and_then(Item::path)
    .unwrap()
    .to_path_buf();

    let mut session = EditSession::<PrototypeRecord>::open(&store, base.path(), "P1", None).unwrap();
    session.remove_item(&["report.docx"]).unwrap();
    let report = session
        .upload_files(&[write_file(src.path(), "newer/report.docx", "draft two")])
        .unwrap();
    assert_eq!(report.added, vec!["report.docx".to_string()]);

    let outcome = session.commit(&mut store, "replaced report").unwrap();
    assert_eq!(outcome, CommitOutcome::Written(labtrack::types::VersionId::new(2).unwrap()));

    let latest = store.get_latest_version::<PrototypeRecord>("P1").unwrap();
    let stored = find_item(&latest.uploaded_items, &["report.docx"])
        .and_then(Item::path)
        .unwrap();
    assert_ne!(stored, original.as_path());
    assert_eq!(fs::read_to_string(stored).unwrap(), "draft two");
    assert_eq!(fs::read_to_string(&original).unwrap(), "draft one");
}
