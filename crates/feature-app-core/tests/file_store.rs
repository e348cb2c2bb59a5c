// SPDX-License-Identifier: AGPL-3.0
// Settings persisted through JSON files on disk

use feature_app_core::{
    AppError, Document, DocumentStore, FileStore, JsonFileDocument, SettingChange, Settings,
    SettingsManager, Theme, DEFAULT_DOCUMENT,
};
use std::fs;
use std::sync::Arc;

fn manager(store: &FileStore) -> SettingsManager {
    SettingsManager::new(Arc::new(store.clone()), DEFAULT_DOCUMENT)
}

fn yes(_: &str) -> bool {
    true
}

#[test]
fn missing_file_loads_defaults_without_creating_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    assert_eq!(manager(&store).load(), Settings::default());
    assert!(!dir.path().join(DEFAULT_DOCUMENT).exists());
}

#[test]
fn field_changes_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let first = manager(&store);
    first.load();
    first.set_field(SettingChange::FontSize(20)).unwrap();
    first
        .set_field(SettingChange::Username("ada".to_string()))
        .unwrap();

    let reloaded = manager(&store).load();
    assert_eq!(reloaded.font_size, 20);
    assert_eq!(reloaded.username, "ada");
    assert!(reloaded.notifications_enabled);
    assert_eq!(reloaded.theme, Theme::System);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(DEFAULT_DOCUMENT)).unwrap())
            .unwrap();
    assert_eq!(raw["fontSize"], 20);
    assert_eq!(raw["username"], "ada");
    assert!(!dir.path().join("settings.json.tmp").exists());
}

#[test]
fn unrelated_keys_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(DEFAULT_DOCUMENT),
        r#"{ "theme": "dark", "windowWidth": 800 }"#,
    )
    .unwrap();
    let store = FileStore::new(dir.path());

    let manager = manager(&store);
    assert_eq!(manager.load().theme, Theme::Dark);
    manager.set_field(SettingChange::FontSize(14)).unwrap();

    let doc = store.open(DEFAULT_DOCUMENT).unwrap();
    assert_eq!(doc.get("windowWidth"), Some(serde_json::json!(800)));
}

#[test]
fn corrupt_file_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DEFAULT_DOCUMENT), "{ not json").unwrap();
    let store = FileStore::new(dir.path());

    assert!(matches!(
        store.open(DEFAULT_DOCUMENT),
        Err(AppError::Serialization(_))
    ));

    let manager = manager(&store);
    assert_eq!(manager.load(), Settings::default());
    assert!(manager.is_ready());
    assert!(!manager.set_field(SettingChange::FontSize(20)).unwrap());
}

#[test]
fn non_object_document_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DEFAULT_DOCUMENT), "[1, 2, 3]").unwrap();
    let store = FileStore::new(dir.path());

    assert_eq!(manager(&store).load(), Settings::default());
}

#[test]
fn clear_all_empties_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let manager = manager(&store);
    manager.load();
    manager.set_field(SettingChange::Theme(Theme::Light)).unwrap();
    assert!(manager.clear_all(&yes).unwrap());

    let content = fs::read_to_string(dir.path().join(DEFAULT_DOCUMENT)).unwrap();
    assert_eq!(content.trim(), "{}");
    assert_eq!(self::manager(&store).load(), Settings::default());
}

#[test]
fn flush_failure_keeps_previous_settings() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let manager = manager(&store);
    manager.load();
    manager.set_field(SettingChange::FontSize(18)).unwrap();

    // A directory in place of the temp file makes the write fail
    fs::create_dir(dir.path().join("settings.json.tmp")).unwrap();

    assert!(matches!(
        manager.set_field(SettingChange::FontSize(22)),
        Err(AppError::FileIo(_))
    ));
    assert_eq!(manager.settings().font_size, 18);
    assert_eq!(self::manager(&store).load().font_size, 18);
}

#[test]
fn failed_replace_removes_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_DOCUMENT);
    let mut doc = JsonFileDocument::open(path.clone()).unwrap();
    doc.set("fontSize", serde_json::json!(20));

    // A non-empty directory at the target cannot be replaced by a file
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    assert!(matches!(doc.save(), Err(AppError::FileIo(_))));
    assert!(!dir.path().join("settings.json.tmp").exists());
    assert!(path.join("keep").exists());
}
