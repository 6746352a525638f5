//! Integration tests for the in-process transport hub

use camrelay::directory::ConnectionId;
use camrelay::protocol::ServerEvent;
use camrelay::registry::SessionId;
use camrelay::relay::Relay;
use camrelay::server::Hub;
use camrelay::signaling::Transport;
use std::sync::Arc;
use tokio::sync::mpsc;

fn joined(viewers: usize) -> ServerEvent {
    ServerEvent::ViewerJoined {
        viewer_id: None,
        viewers,
    }
}

/// Drain everything currently queued for a connection
fn drain(receiver: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn test_full_queue_does_not_affect_other_members() {
    let hub = Hub::new();
    let group = SessionId::from("s1");
    let slow = ConnectionId::new();
    let fast = ConnectionId::new();
    let (slow_tx, mut slow_rx) = mpsc::channel(1);
    let (fast_tx, mut fast_rx) = mpsc::channel(16);

    hub.attach(slow, slow_tx);
    hub.attach(fast, fast_tx);
    hub.join_group(&group, slow);
    hub.join_group(&group, fast);

    for viewers in 1..=3 {
        hub.broadcast(&group, joined(viewers), None);
    }

    assert_eq!(drain(&mut fast_rx), vec![joined(1), joined(2), joined(3)]);
    assert_eq!(drain(&mut slow_rx), vec![joined(1)]);

    // The slow member recovers once its queue has room
    hub.send_to(slow, joined(4));
    assert_eq!(drain(&mut slow_rx), vec![joined(4)]);
}

#[test]
fn test_closed_queue_does_not_affect_other_members() {
    let hub = Hub::new();
    let group = SessionId::from("s1");
    let gone = ConnectionId::new();
    let alive = ConnectionId::new();
    let (gone_tx, gone_rx) = mpsc::channel(4);
    let (alive_tx, mut alive_rx) = mpsc::channel(4);

    hub.attach(gone, gone_tx);
    hub.attach(alive, alive_tx);
    hub.join_group(&group, gone);
    hub.join_group(&group, alive);
    drop(gone_rx);

    hub.broadcast(&group, joined(2), None);

    assert_eq!(drain(&mut alive_rx), vec![joined(2)]);
}

#[test]
fn test_broadcast_skips_excepted_member() {
    let hub = Hub::new();
    let group = SessionId::from("s1");
    let sender = ConnectionId::new();
    let other = ConnectionId::new();
    let (sender_tx, mut sender_rx) = mpsc::channel(4);
    let (other_tx, mut other_rx) = mpsc::channel(4);

    hub.attach(sender, sender_tx);
    hub.attach(other, other_tx);
    hub.join_group(&group, sender);
    hub.join_group(&group, other);

    hub.broadcast(&group, joined(2), Some(sender));

    assert!(drain(&mut sender_rx).is_empty());
    assert_eq!(drain(&mut other_rx), vec![joined(2)]);
}

#[test]
fn test_broadcast_reaches_only_its_group() {
    let hub = Hub::new();
    let first = SessionId::from("s1");
    let second = SessionId::from("s2");
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    let (a_tx, mut a_rx) = mpsc::channel(4);
    let (b_tx, mut b_rx) = mpsc::channel(4);

    hub.attach(a, a_tx);
    hub.attach(b, b_tx);
    hub.join_group(&first, a);
    hub.join_group(&second, b);

    hub.broadcast(&first, joined(1), None);

    assert_eq!(drain(&mut a_rx), vec![joined(1)]);
    assert!(drain(&mut b_rx).is_empty());
}

#[test]
fn test_detach_leaves_every_group() {
    let hub = Hub::new();
    let shared = SessionId::from("shared");
    let solo = SessionId::from("solo");
    let leaving = ConnectionId::new();
    let staying = ConnectionId::new();
    let (leaving_tx, _leaving_rx) = mpsc::channel(4);
    let (staying_tx, _staying_rx) = mpsc::channel(4);

    hub.attach(leaving, leaving_tx);
    hub.attach(staying, staying_tx);
    hub.join_group(&shared, leaving);
    hub.join_group(&shared, staying);
    hub.join_group(&solo, leaving);
    assert_eq!(hub.members(&shared).len(), 2);
    assert_eq!(hub.group_count(), 2);

    hub.detach(leaving);

    assert_eq!(hub.members(&shared), vec![staying]);
    assert!(hub.members(&solo).is_empty());
    assert_eq!(hub.group_count(), 1, "empty group is dropped");
    assert_eq!(hub.connection_count(), 1);

    // Sends to a detached connection are dropped quietly
    hub.send_to(leaving, joined(0));
}

#[test]
fn test_leave_group_drops_empty_group() {
    let hub = Hub::new();
    let group = SessionId::from("s1");
    let conn = ConnectionId::new();
    let (tx, _rx) = mpsc::channel(4);

    hub.attach(conn, tx);
    hub.join_group(&group, conn);
    hub.join_group(&group, conn);
    assert_eq!(hub.members(&group), vec![conn]);

    hub.leave_group(&group, conn);

    assert!(hub.members(&group).is_empty());
    assert_eq!(hub.group_count(), 0);
}

#[test]
fn test_stopped_session_leaves_no_group_behind() -> anyhow::Result<()> {
    let hub = Arc::new(Hub::new());
    let relay = Relay::new(Arc::clone(&hub));
    let id = relay.create(None, Some("pw".to_string()))?;
    let streamer = ConnectionId::new();
    let viewer = ConnectionId::new();
    let anonymous = ConnectionId::new();
    let (streamer_tx, mut streamer_rx) = mpsc::channel(8);
    let (viewer_tx, _viewer_rx) = mpsc::channel(8);
    let (anonymous_tx, mut anonymous_rx) = mpsc::channel(8);

    hub.attach(streamer, streamer_tx);
    hub.attach(viewer, viewer_tx);
    hub.attach(anonymous, anonymous_tx);
    relay.register_streamer(streamer, &id);
    relay.register_viewer(viewer, &id, "v1");
    relay.join(anonymous, &id);
    assert_eq!(hub.members(&id).len(), 3);

    relay.stop(&id, "pw")?;

    assert!(hub.members(&id).is_empty());
    assert_eq!(hub.group_count(), 0);
    let ended = ServerEvent::SessionEnded {
        session_id: id.clone(),
    };
    assert_eq!(drain(&mut streamer_rx).last(), Some(&ended));
    assert_eq!(drain(&mut anonymous_rx).last(), Some(&ended));

    Ok(())
}
