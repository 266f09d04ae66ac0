//! Credential and membership stores: parse, append, remove, serialize.

use mts_authfiles::*;

#[test]
fn scenario_duplicate_login_append_fails() {
    let mut store = CredentialStore::parse("bob:pw1\n");
    let err = store
        .append(CredentialEntry::new("bob", "pw2"))
        .unwrap_err();
    assert_eq!(
        err,
        AuthFileError::DuplicateLogin {
            login: "bob".to_string()
        }
    );
    // No partial mutation.
    assert_eq!(store.serialize(), "bob:pw1\n");
}

#[test]
fn scenario_append_then_serialize_is_newline_terminated() {
    let mut store = CredentialStore::parse("bob:pw1\n\n\n");
    store.append(CredentialEntry::new("alice", "PW2")).unwrap();
    assert!(store.contains_login("alice"));
    assert_eq!(store.serialize(), "bob:pw1\nalice:PW2\n");
}

#[test]
fn scenario_append_rejects_login_with_colon() {
    let mut store = CredentialStore::empty();
    let err = store
        .append(CredentialEntry::new("bo:b", "pw"))
        .unwrap_err();
    assert!(matches!(err, AuthFileError::InvalidIdentifier { kind: "login", .. }));
    assert!(store.is_empty());
}

#[test]
fn scenario_remove_login_removes_every_matching_line() {
    let text = "bob:a\nalice:b\nbob:c\n";
    let out = CredentialStore::remove(text, "bob").unwrap();
    assert_eq!(out, "alice:b\n");
}

#[test]
fn scenario_remove_missing_login_reports_not_found() {
    let err = CredentialStore::remove("", "ghost").unwrap_err();
    assert_eq!(err.to_string(), "login ghost not found");
}

#[test]
fn scenario_group_store_append_and_remove() {
    let mut groups = GroupStore::parse("gbob:bob:1\n");
    assert!(groups
        .append(GroupMembership::new("galice", "alice"))
        .unwrap());
    let text = groups.serialize();
    assert_eq!(text, "gbob:bob:1\ngalice:alice:1\n");

    let (text, removed) = GroupStore::remove_group(&text, "gbob");
    assert_eq!(removed, 1);
    assert_eq!(text, "galice:alice:1\n");
}

#[test]
fn scenario_activate_leaves_unrelated_legacy_lines_untouched() {
    let mut users = CredentialStore::parse("legacyuser\nbob:pw\n");
    users.append(CredentialEntry::new("alice", "PW")).unwrap();
    assert_eq!(users.serialize(), "legacyuser\nbob:pw\nalice:PW\n");

    let mut groups = GroupStore::parse("gteam:carol\ngbob:bob:1\n");
    groups
        .append(GroupMembership::new("galice", "alice"))
        .unwrap();
    assert_eq!(groups.serialize(), "gteam:carol\ngbob:bob:1\ngalice:alice:1\n");
}
