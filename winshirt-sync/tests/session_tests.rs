use tokio::sync::broadcast;
use winshirt_storage::LocalCache;
use winshirt_sync::{AuthEvent, Session, SessionStore, SessionUser};

fn session(token: &str) -> Session {
    Session {
        access_token: token.into(),
        refresh_token: format!("{token}-refresh"),
        // 2100-01-01
        expires_at: Some(4_102_444_800),
        user: SessionUser {
            id: "user-1".into(),
            email: Some("shop@example.com".into()),
        },
    }
}

fn store() -> SessionStore {
    SessionStore::new(LocalCache::open_in_memory().unwrap())
}

#[test]
fn nothing_saved_initially() {
    assert!(store().load().is_none());
}

#[test]
fn sign_in_is_persisted() {
    let store = store();
    store.apply(&AuthEvent::SignedIn(session("at-1"))).unwrap();
    assert_eq!(store.load(), Some(session("at-1")));
}

#[test]
fn refresh_replaces_saved_session() {
    let store = store();
    store.apply(&AuthEvent::SignedIn(session("at-1"))).unwrap();
    store.apply(&AuthEvent::TokenRefreshed(session("at-2"))).unwrap();
    assert_eq!(store.load().unwrap().access_token, "at-2");
}

#[test]
fn sign_out_clears_saved_session() {
    let store = store();
    store.apply(&AuthEvent::SignedIn(session("at-1"))).unwrap();
    store.apply(&AuthEvent::SignedOut).unwrap();
    assert!(store.load().is_none());
}

#[test]
fn session_does_not_count_as_a_table() {
    let cache = LocalCache::open_in_memory().unwrap();
    let store = SessionStore::new(cache.clone());
    store.save(&session("at-1")).unwrap();
    cache.clear_all().unwrap();
    assert!(store.load().is_some());
}

#[test]
fn expiry() {
    let mut s = session("at-1");
    assert!(!s.is_expired());
    s.expires_at = Some(0);
    assert!(s.is_expired());
    s.expires_at = None;
    assert!(!s.is_expired());
}

#[test]
fn session_serializes_in_camel_case() {
    let json = serde_json::to_value(session("at-1")).unwrap();
    assert_eq!(json["accessToken"], "at-1");
    assert_eq!(json["refreshToken"], "at-1-refresh");
}

#[tokio::test]
async fn follow_persists_until_sender_closes() {
    let store = store();
    let (tx, rx) = broadcast::channel(8);
    let follower = {
        let store = store.clone();
        tokio::spawn(async move { store.follow(rx).await })
    };

    tx.send(AuthEvent::SignedIn(session("at-1"))).unwrap();
    tx.send(AuthEvent::TokenRefreshed(session("at-2"))).unwrap();
    drop(tx);
    follower.await.unwrap();

    assert_eq!(store.load().unwrap().access_token, "at-2");
}
