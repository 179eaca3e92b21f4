use pvpc_bot::esios::Zone;
use pvpc_bot::settings::{
    ColorScheme, FileSettingsStore, SNAPSHOT_FILE, SettingsRepository, UserSettings,
};

#[test]
fn mutations_are_persisted_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSettingsStore::open(dir.path()).unwrap();

    store.register(1).unwrap();
    store.update(1, &mut |s| s.zone = Zone::Baleares).unwrap();
    store
        .update(2, &mut |s| s.color_scheme = ColorScheme::Sections)
        .unwrap();

    let on_disk: UserSettings = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("1_settings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(on_disk.zone, Zone::Baleares);

    let reopened = FileSettingsStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get(1).unwrap().zone, Zone::Baleares);
    assert_eq!(reopened.get(2).unwrap().color_scheme, ColorScheme::Sections);
    assert_eq!(reopened.all().len(), 2);
}

#[test]
fn subscribers_and_admins() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSettingsStore::open(dir.path()).unwrap();
    store.register(10).unwrap();
    store.update(20, &mut |s| s.subscribed = false).unwrap();
    store.update(30, &mut |s| s.admin = true).unwrap();

    assert_eq!(store.subscribers(), vec![10, 30]);
    assert_eq!(store.admins(), vec![30]);
    assert!(store.is_admin(30));
    assert!(!store.is_admin(10));
    assert!(!store.is_admin(99));
}

#[test]
fn defaults_apply_to_new_chats() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSettingsStore::open(dir.path())
        .unwrap()
        .with_defaults(UserSettings {
            zone: Zone::Canarias,
            ..UserSettings::default()
        });
    assert_eq!(store.register(5).unwrap().zone, Zone::Canarias);
}

#[test]
fn snapshot_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSettingsStore::open(dir.path().join("a")).unwrap();
    store.update(7, &mut |s| s.admin = true).unwrap();
    store.update(-100, &mut |s| s.subscribed = false).unwrap();

    let json: serde_json::Value = serde_json::from_str(&store.snapshot_json().unwrap()).unwrap();
    assert_eq!(json["7"]["admin"], true);
    assert_eq!(json["-100"]["subscribed"], false);

    let snapshot = store.write_snapshot().unwrap();
    assert_eq!(snapshot, dir.path().join("a").join(SNAPSHOT_FILE));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(written, json);
}

#[test]
fn snapshot_file_is_not_loaded_as_a_chat() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSettingsStore::open(dir.path()).unwrap();
    store.register(1).unwrap();
    store.write_snapshot().unwrap();

    let reopened = FileSettingsStore::open(dir.path()).unwrap();
    assert_eq!(reopened.all().len(), 1);
}
