use serde_json::json;

use super::*;

#[test]
fn slug_from_fallback_email() {
    assert_eq!(
        identity_slug(None, Some("Jane.Doe+test@Example.com")),
        "jane-doe-test-example-com"
    );
}

#[test]
fn absent_everything_is_user() {
    assert_eq!(identity_slug(None, None), "user");
    assert_eq!(identity_slug(None, Some("")), "user");
    assert_eq!(identity_slug(Some(&json!({})), None), "user");
}

#[test]
fn record_email_wins_over_fallback() {
    let record = json!({"email": "a@b.io"});
    assert_eq!(identity_slug(Some(&record), Some("other@x.com")), "a-b-io");

    let nested = json!({"user": {"email": "Nested@Mail.COM"}});
    assert_eq!(identity_slug(Some(&nested), Some("other@x.com")), "nested-mail-com");
}

#[test]
fn record_stored_as_string_is_parsed() {
    let raw = Value::String(r#"{"email":"str@rec.org"}"#.to_owned());
    assert_eq!(identity_slug(Some(&raw), None), "str-rec-org");

    let garbage = Value::String("{not json".to_owned());
    assert_eq!(identity_slug(Some(&garbage), Some("f@b.c")), "f-b-c");
}

#[test]
fn slugify_trims_and_collapses() {
    assert_eq!(slugify("--Hello__World!!"), "hello-world");
    assert_eq!(slugify("@@@"), "user");
    assert_eq!(slugify("José@x.com"), "jos-x-com");
}
