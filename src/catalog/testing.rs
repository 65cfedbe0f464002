use tempfile::TempDir;

use crate::store::SqliteStore;
use crate::types::{Caller, NewAlbum, NewPerson, NewTrack, Role};

/// A fresh store with one admin and two managers.
pub struct TestCatalog {
    _temp: TempDir,
    pub store: SqliteStore,
    pub admin: Caller,
    pub manager: Caller,
    pub other_manager: Caller,
}

impl TestCatalog {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("catalog.db")).unwrap();
        store.initialize().unwrap();

        let admin = store
            .create_user("admin@label.test", "hash", None, Role::Admin)
            .unwrap()
            .caller();
        let manager = store
            .create_user("manager@label.test", "hash", None, Role::Manager)
            .unwrap()
            .caller();
        let other_manager = store
            .create_user("other@label.test", "hash", None, Role::Manager)
            .unwrap()
            .caller();

        Self {
            _temp: temp,
            store,
            admin,
            manager,
            other_manager,
        }
    }
}

pub fn new_person(email: &str) -> NewPerson {
    NewPerson {
        last_name: "Doe".to_string(),
        first_name: "Jane".to_string(),
        middle_name: None,
        email: email.to_string(),
        phone: None,
        marketing_expenses: None,
        advance_expenses: None,
    }
}

pub fn new_album(title: &str) -> NewAlbum {
    serde_json::from_value(serde_json::json!({ "title": title, "type": "single" })).unwrap()
}

pub fn new_track(album_id: i64, title: &str) -> NewTrack {
    serde_json::from_value(serde_json::json!({ "album_id": album_id, "title": title })).unwrap()
}
