//! Integration tests for the preference store
//!
//! Tests cover:
//! - Idempotent add-like / add-dislike (no duplicate titles, last_seen refreshed)
//! - Sticky artist ban flag
//! - On-disk document shape
//! - Unreadable or hand-edited documents are never wiped

use plexthumb_common::preferences::{DISLIKED_FILE, LIKED_FILE};
use plexthumb_common::PreferenceStore;
use serde_json::Value;
use std::thread::sleep;
use std::time::Duration;

#[test]
fn test_add_like_twice_keeps_one_title_and_refreshes_last_seen() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(dir.path());

    store.add_like("Boards of Canada", "Roygbiv").unwrap();
    let first_seen = store.liked()["Boards of Canada"].last_seen.unwrap();

    sleep(Duration::from_millis(5));
    store.add_like("Boards of Canada", "Roygbiv").unwrap();

    let liked = store.liked();
    let entry = &liked["Boards of Canada"];
    assert_eq!(entry.tracks, vec!["Roygbiv".to_string()]);
    assert!(entry.last_seen.unwrap() > first_seen);
}

#[test]
fn test_likes_accumulate_per_artist() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(dir.path());

    store.add_like("Boards of Canada", "Roygbiv").unwrap();
    store.add_like("Boards of Canada", "Dayvan Cowboy").unwrap();
    store.add_like("Aphex Twin", "Xtal").unwrap();

    let liked = store.liked();
    assert_eq!(liked.len(), 2);
    assert_eq!(
        liked["Boards of Canada"].tracks,
        vec!["Roygbiv".to_string(), "Dayvan Cowboy".to_string()]
    );
}

#[test]
fn test_liked_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(dir.path());
    store.add_like("Boards of Canada", "Roygbiv").unwrap();

    let raw = std::fs::read_to_string(dir.path().join(LIKED_FILE)).unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["Boards of Canada"]["tracks"][0], "Roygbiv");
    assert!(doc["Boards of Canada"]["last_seen"].is_string());
    // Two-space pretty printing
    assert!(raw.contains("\n  \"Boards of Canada\""));
}

#[test]
fn test_dislike_ban_flag_is_sticky() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(dir.path());

    store.add_dislike("Nickelback", "Photograph", false).unwrap();
    assert!(!store.disliked()["Nickelback"].ban_artist);

    store.add_dislike("Nickelback", "Rockstar", true).unwrap();
    store.add_dislike("Nickelback", "Photograph", false).unwrap();

    let disliked = store.disliked();
    let entry = &disliked["Nickelback"];
    assert!(entry.ban_artist);
    assert_eq!(entry.tracks, vec!["Photograph".to_string(), "Rockstar".to_string()]);

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(DISLIKED_FILE)).unwrap())
            .unwrap();
    assert_eq!(raw["Nickelback"]["ban_artist"], true);
}

#[test]
fn test_likes_and_dislikes_are_separate_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(dir.path());

    store.add_dislike("Nickelback", "Photograph", false).unwrap();
    assert!(store.liked().is_empty());
    assert!(!dir.path().join(LIKED_FILE).exists());
}

#[test]
fn test_unreadable_document_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(LIKED_FILE);
    let store = PreferenceStore::new(dir.path());

    for content in ["][", r#"["Roygbiv"]"#, r#"{"Autechre": "Gantz Graf"}"#] {
        std::fs::write(&path, content).unwrap();
        assert!(store.liked().is_empty());
        assert!(store.add_like("Autechre", "Gantz Graf").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }
}

#[test]
fn test_entry_with_unexpected_shape_survives_other_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(LIKED_FILE);
    std::fs::write(
        &path,
        r#"{"Aphex Twin": {"tracks": ["Xtal"], "last_seen": "yesterday", "note": "hand edited"}}"#,
    )
    .unwrap();
    let store = PreferenceStore::new(dir.path());

    // The odd entry is left out of the typed view but kept on disk
    assert!(store.liked().is_empty());
    store.add_like("Boards of Canada", "Roygbiv").unwrap();

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["Aphex Twin"]["tracks"][0], "Xtal");
    assert_eq!(raw["Aphex Twin"]["last_seen"], "yesterday");
    assert_eq!(raw["Aphex Twin"]["note"], "hand edited");
    assert_eq!(raw["Boards of Canada"]["tracks"][0], "Roygbiv");

    let liked = store.liked();
    assert_eq!(liked.len(), 1);
    assert!(liked.contains_key("Boards of Canada"));
}

#[test]
fn test_update_keeps_unknown_keys_of_the_same_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DISLIKED_FILE);
    std::fs::write(
        &path,
        r#"{"Creed": {"tracks": ["Higher"], "ban_artist": true, "reason": "all of it"}}"#,
    )
    .unwrap();
    let store = PreferenceStore::new(dir.path());

    store.add_dislike("Creed", "Arms Wide Open", false).unwrap();

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["Creed"]["tracks"], serde_json::json!(["Higher", "Arms Wide Open"]));
    assert_eq!(raw["Creed"]["ban_artist"], true);
    assert_eq!(raw["Creed"]["reason"], "all of it");
    assert!(store.disliked()["Creed"].last_seen.is_some());
}

#[test]
fn test_hand_edited_document_with_null_last_seen_loads() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DISLIKED_FILE),
        r#"{"Creed": {"tracks": ["Higher"], "ban_artist": false, "last_seen": null}}"#,
    )
    .unwrap();
    let store = PreferenceStore::new(dir.path());

    let disliked = store.disliked();
    assert_eq!(disliked["Creed"].tracks, vec!["Higher".to_string()]);
    assert!(disliked["Creed"].last_seen.is_none());
}

#[test]
fn test_write_into_missing_directory_fails_without_panic() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(&dir.path().join("does-not-exist"));
    assert!(store.add_like("Artist", "Track").is_err());
}
