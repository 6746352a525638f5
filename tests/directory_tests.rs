//! Integration tests for the session directory and reverse index

use camrelay::directory::{
    ConnectionBinding, ConnectionId, ConnectionIndex, Role, SessionRoute, Unregistered,
};
use camrelay::registry::SessionId;

#[test]
fn test_register_streamer_latest_wins() {
    let mut route = SessionRoute::default();
    let first = ConnectionId::new();
    let second = ConnectionId::new();

    assert_eq!(route.register_streamer(first), None);
    assert_eq!(route.register_streamer(first), None);
    assert_eq!(route.register_streamer(second), Some(first));
    assert_eq!(route.streamer_connection(), Some(second));
}

#[test]
fn test_register_viewer_replaces_binding() {
    let mut route = SessionRoute::default();
    let old = ConnectionId::new();
    let new = ConnectionId::new();

    assert_eq!(route.register_viewer("v1", old), None);
    assert_eq!(route.register_viewer("v1", new), Some(old));
    assert_eq!(route.viewer_connection("v1"), Some(new));
    assert_eq!(route.viewer_len(), 1);
}

#[test]
fn test_unregister_connection_by_exact_id() {
    let mut route = SessionRoute::default();
    let streamer = ConnectionId::new();
    let v1 = ConnectionId::new();
    let v2 = ConnectionId::new();
    route.register_streamer(streamer);
    route.register_viewer("v1", v1);
    route.register_viewer("v2", v2);

    assert_eq!(
        route.unregister_connection(v1),
        Some(Unregistered::Viewer("v1".to_string()))
    );
    assert_eq!(route.unregister_connection(v1), None);
    assert_eq!(route.viewer_connection("v2"), Some(v2));

    assert_eq!(
        route.unregister_connection(streamer),
        Some(Unregistered::Streamer)
    );
    assert_eq!(route.streamer_connection(), None);
    assert_eq!(route.connections(), vec![v2]);
}

#[test]
fn test_unregister_unknown_connection_is_noop() {
    let mut route = SessionRoute::default();
    let viewer = ConnectionId::new();
    route.register_viewer("v1", viewer);

    assert_eq!(route.unregister_connection(ConnectionId::new()), None);
    assert_eq!(route.viewer_connection("v1"), Some(viewer));
}

#[test]
fn test_index_bind_replaces_existing() {
    let index = ConnectionIndex::new();
    let conn = ConnectionId::new();
    let session = SessionId::from("s1");

    index.bind(ConnectionBinding::streamer(conn, session.clone()));
    let previous = index.bind(ConnectionBinding::viewer(conn, session.clone(), "v1"));

    assert_eq!(previous.map(|b| b.role), Some(Role::Streamer));
    let current = index.lookup(conn).expect("binding should exist");
    assert_eq!(current.role, Role::Viewer);
    assert_eq!(current.viewer_id.as_deref(), Some("v1"));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_index_unbind_matching_ignores_newer_binding() {
    let index = ConnectionIndex::new();
    let conn = ConnectionId::new();
    let stale = ConnectionBinding::viewer(conn, SessionId::from("s1"), "v1");
    let fresh = ConnectionBinding::viewer(conn, SessionId::from("s1"), "v2");

    index.bind(fresh.clone());

    assert_eq!(index.unbind_matching(&stale), None);
    assert_eq!(index.lookup(conn), Some(fresh.clone()));
    assert_eq!(index.unbind_matching(&fresh), Some(fresh));
    assert!(index.is_empty());
}

#[test]
fn test_index_unbind_in_session() {
    let index = ConnectionIndex::new();
    let conn = ConnectionId::new();
    index.bind(ConnectionBinding::streamer(conn, SessionId::from("s2")));

    assert!(index
        .unbind_in_session(conn, &SessionId::from("s1"))
        .is_none());
    assert!(index
        .unbind_in_session(conn, &SessionId::from("s2"))
        .is_some());
    assert!(index.unbind(conn).is_none());
}

#[test]
fn test_anonymous_presence_in_route() {
    let mut route = SessionRoute::default();
    let conn = ConnectionId::new();

    assert!(route.join_anonymous(conn));
    assert!(!route.join_anonymous(conn));
    assert_eq!(route.anonymous_len(), 1);
    assert!(route.connections().is_empty());

    assert!(route.leave_anonymous(conn));
    assert!(!route.leave_anonymous(conn));
    assert!(route.anonymous_connections().is_empty());
}

#[test]
fn test_index_presence_per_connection() {
    let index = ConnectionIndex::new();
    let conn = ConnectionId::new();
    let s1 = SessionId::from("s1");
    let s2 = SessionId::from("s2");

    index.mark_present(conn, s1.clone());
    index.mark_present(conn, s2.clone());
    index.clear_present(conn, &s1);
    assert_eq!(index.present_in(conn), vec![s2.clone()]);

    assert_eq!(index.take_presence(conn), vec![s2]);
    assert!(index.present_in(conn).is_empty());
    assert!(index.is_empty(), "presence is not a binding");
}
