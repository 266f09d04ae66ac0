use mts_store::{fetch_baseline, DirTextStore, RemoteTextStore, TransferError};

#[tokio::test]
async fn scenario_missing_file_is_empty_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirTextStore::new(dir.path());

    assert!(matches!(
        store.fetch("clientmounts.aut").await,
        Err(TransferError::NotFound { .. })
    ));
    assert_eq!(fetch_baseline(&store, "clientmounts.aut").await.unwrap(), None);
}

#[tokio::test]
async fn scenario_store_replaces_whole_file_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirTextStore::new(dir.path());

    store.store("/USERS.aut", "bob:pw1\n").await.unwrap();
    store.store("USERS.aut", "alice:pw2\n").await.unwrap();

    assert_eq!(store.fetch("USERS.aut").await.unwrap(), "alice:pw2\n");

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["USERS.aut".to_string()]);
}

#[tokio::test]
async fn scenario_nested_paths_are_created_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirTextStore::new(dir.path());

    store.store("home/tmp/GROUPS.aut", "g:l:1\n").await.unwrap();
    assert!(dir.path().join("home/tmp/GROUPS.aut").exists());

    store.remove("home/tmp/GROUPS.aut").await.unwrap();
    store.remove("home/tmp/GROUPS.aut").await.unwrap();
    assert!(!dir.path().join("home/tmp/GROUPS.aut").exists());
}

#[tokio::test]
async fn scenario_escaping_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirTextStore::new(dir.path());
    let err = store.store("../outside", "x").await.unwrap_err();
    assert!(matches!(err, TransferError::InvalidPath { .. }));
}
