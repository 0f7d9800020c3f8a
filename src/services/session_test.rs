use super::*;

const ID: &str = "k3n8r2l9f0qv7m1d5s6t4hj2ab";

fn store_in(dir: &tempfile::TempDir) -> FileSessionStore {
    FileSessionStore::new(dir.path(), Duration::from_secs(1440))
}

fn write_session(dir: &tempfile::TempDir, id: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(format!("sess_{id}"));
    std::fs::write(&path, contents).unwrap();
    path
}

// =============================================================================
// is_valid_session_id
// =============================================================================

#[test]
fn php_style_ids_are_valid() {
    assert!(is_valid_session_id(ID));
    assert!(is_valid_session_id("abc,DEF-123"));
}

#[test]
fn empty_id_is_invalid() {
    assert!(!is_valid_session_id(""));
}

#[test]
fn path_characters_are_invalid() {
    for id in ["../etc/passwd", "a/b", "a\\b", "a.b", "a b", "a\0b"] {
        assert!(!is_valid_session_id(id), "expected invalid: {id:?}");
    }
}

#[test]
fn overlong_id_is_invalid() {
    assert!(is_valid_session_id(&"a".repeat(MAX_SESSION_ID_LEN)));
    assert!(!is_valid_session_id(&"a".repeat(MAX_SESSION_ID_LEN + 1)));
}

// =============================================================================
// FileSessionStore
// =============================================================================

#[tokio::test]
async fn file_store_reads_logged_in_session() {
    let dir = tempfile::tempdir().unwrap();
    write_session(&dir, ID, "loggedin|b:1;");
    let session = store_in(&dir).load(ID).await.unwrap();
    assert_eq!(session, Some(Session::logged_in()));
}

#[tokio::test]
async fn file_store_uses_php_truthiness() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    for (contents, expected) in [
        ("loggedin|b:0;", false),
        ("loggedin|i:1;", true),
        (r#"loggedin|s:1:"0";"#, false),
        (r#"loggedin|s:3:"yes";"#, true),
        ("loggedin|N;", false),
    ] {
        write_session(&dir, ID, contents);
        let session = store.load(ID).await.unwrap().unwrap();
        assert_eq!(session.logged_in, expected, "contents {contents:?}");
    }
}

#[tokio::test]
async fn file_store_accepts_enum_and_custom_values() {
    let dir = tempfile::tempdir().unwrap();
    write_session(&dir, ID, r#"loggedin|b:1;role|E:10:"Role:Admin";cart|C:4:"Cart":6:{a:0:{}}"#);
    let session = store_in(&dir).load(ID).await.unwrap();
    assert_eq!(session, Some(Session::logged_in()));
}

#[tokio::test]
async fn file_store_session_without_flag_is_not_logged_in() {
    let dir = tempfile::tempdir().unwrap();
    write_session(&dir, ID, r#"csrf|s:4:"abcd";"#);
    let session = store_in(&dir).load(ID).await.unwrap();
    assert_eq!(session, Some(Session { logged_in: false }));
}

#[tokio::test]
async fn file_store_empty_file_is_not_logged_in() {
    let dir = tempfile::tempdir().unwrap();
    write_session(&dir, ID, "");
    let session = store_in(&dir).load(ID).await.unwrap();
    assert_eq!(session, Some(Session::default()));
}

#[tokio::test]
async fn file_store_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(store_in(&dir).load(ID).await.unwrap(), None);
}

#[tokio::test]
async fn file_store_missing_directory_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("absent"), Duration::from_secs(60));
    assert_eq!(store.load(ID).await.unwrap(), None);
}

#[tokio::test]
async fn file_store_rejects_traversal_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let inner = dir.path().join("inner");
    std::fs::create_dir(&inner).unwrap();
    std::fs::write(dir.path().join("sess_"), "loggedin|b:1;").unwrap();

    let store = FileSessionStore::new(&inner, Duration::from_secs(1440));
    assert_eq!(store.load("../sess_").await.unwrap(), None);
}

#[tokio::test]
async fn file_store_expired_file_is_none_and_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_session(&dir, ID, "loggedin|b:1;");
    let old = SystemTime::now() - Duration::from_secs(3600);
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(old)
        .unwrap();

    assert_eq!(store_in(&dir).load(ID).await.unwrap(), None);
    assert!(path.exists(), "expired session must not be deleted by a read");
}

#[tokio::test]
async fn file_store_malformed_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    write_session(&dir, ID, "loggedin|b:yes;");
    let err = store_in(&dir).load(ID).await.unwrap_err();
    assert!(matches!(err, SessionError::Malformed { .. }), "got {err:?}");
}

#[tokio::test]
async fn file_store_unreadable_entry_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(format!("sess_{ID}"))).unwrap();
    let err = store_in(&dir).load(ID).await.unwrap_err();
    assert!(matches!(err, SessionError::Io { .. }), "got {err:?}");
}

#[tokio::test]
async fn file_store_load_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_session(&dir, ID, "loggedin|b:1;");
    let before = std::fs::metadata(&path).unwrap().modified().unwrap();

    let store = store_in(&dir);
    for _ in 0..3 {
        store.load(ID).await.unwrap();
    }

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "loggedin|b:1;");
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), before);
}

// =============================================================================
// MemorySessionStore
// =============================================================================

#[tokio::test]
async fn memory_store_returns_seeded_sessions() {
    let store: MemorySessionStore = [("alpha", Session::logged_in()), ("beta", Session::default())]
        .into_iter()
        .collect();
    assert_eq!(store.load("alpha").await.unwrap(), Some(Session::logged_in()));
    assert_eq!(store.load("beta").await.unwrap(), Some(Session { logged_in: false }));
    assert_eq!(store.load("gamma").await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_empty_has_no_sessions() {
    assert_eq!(MemorySessionStore::new().load(ID).await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_ignores_invalid_ids() {
    let store: MemorySessionStore = [("a.b", Session::logged_in())].into_iter().collect();
    assert_eq!(store.load("a.b").await.unwrap(), None);
}

// =============================================================================
// store_from_config
// =============================================================================

#[tokio::test]
async fn config_with_save_path_reads_files() {
    let dir = tempfile::tempdir().unwrap();
    write_session(&dir, ID, "loggedin|b:1;");
    let config = Config { session_save_path: Some(dir.path().to_path_buf()), ..Config::default() };
    let store = store_from_config(&config);
    assert_eq!(store.load(ID).await.unwrap(), Some(Session::logged_in()));
}

#[tokio::test]
async fn config_without_save_path_has_no_sessions() {
    let store = store_from_config(&Config::default());
    assert_eq!(store.load(ID).await.unwrap(), None);
}
