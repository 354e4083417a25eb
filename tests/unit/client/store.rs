use serde_json::json;

use super::*;
use crate::foundation::core::Side;

#[test]
fn missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = ClientStore::open(dir.path().join("nope.json"));
    assert!(store.access_token().is_none());
    assert_eq!(store.identity_slug(), "user");
}

#[test]
fn malformed_file_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("store.json");
    std::fs::write(&p, "[1, 2").unwrap();
    assert!(ClientStore::open(&p).user().is_none());
    std::fs::write(&p, "[1, 2]").unwrap();
    assert!(ClientStore::open(&p).user().is_none());
}

#[test]
fn wrongly_typed_entries_read_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("store.json");
    std::fs::write(
        &p,
        r#"{"accessToken": 42, "userEmail": "", "selectedProduct": "{broken"}"#,
    )
    .unwrap();
    let store = ClientStore::open(&p);
    assert!(store.access_token().is_none());
    assert!(store.user_email().is_none());
    assert!(store.selected_product().is_none());
}

#[test]
fn session_and_product_survive_save() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("nested/store.json");
    let mut store = ClientStore::open(&p);
    store.set_session("acc", "ref", "Jane@Example.com");
    store
        .set_selected_product(&Product {
            id: "p1".into(),
            kind: "tshirt".into(),
            base_price: 10.0,
            front_image_url: Some("f.png".into()),
            back_image_url: None,
        })
        .unwrap();
    store.save().unwrap();

    let reopened = ClientStore::open(&p);
    assert_eq!(reopened.access_token().as_deref(), Some("acc"));
    assert_eq!(reopened.refresh_token().as_deref(), Some("ref"));
    assert_eq!(reopened.identity_slug(), "jane-example-com");
    assert_eq!(reopened.selected_product().unwrap().id, "p1");
}

#[test]
fn user_record_beats_stored_email() {
    let mut store = ClientStore::in_memory();
    store.set_session("a", "r", "fallback@x.com");
    store.set_user(json!({"user": {"email": "rec@y.com"}}));
    assert_eq!(store.identity_slug(), "rec-y-com");
    store.clear_session();
    assert_eq!(store.identity_slug(), "user");
    assert!(store.save().is_ok());
}

#[test]
fn product_stored_as_string_is_read() {
    let mut store = ClientStore::in_memory();
    store.entries.insert(
        "selectedProduct".into(),
        Value::String(r#"{"id":"p9","type":"mug","basePrice":3}"#.into()),
    );
    assert_eq!(store.selected_product().unwrap().kind, "mug");
}

#[test]
fn stored_product_without_id_is_rehydrated() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("store.json");
    let stored = json!({
        "selectedProduct": "{\"type\":\"hoodie\",\"basePrice\":42,\"frontImageUrl\":\"f.png\"}"
    });
    std::fs::write(&p, serde_json::to_vec(&stored).unwrap()).unwrap();

    let product = ClientStore::open(&p).selected_product().unwrap();
    assert_eq!(product.id, "");
    assert_eq!(product.kind, "hoodie");
    assert_eq!(product.image_url(Side::Front), Some("f.png"));
    assert_eq!(product.image_url(Side::Back), None);
}
