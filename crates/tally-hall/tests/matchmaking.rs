//! Integration tests for the waiting hall.
//!
//! Hall connections are plain channels here; rooms are real actors in a
//! real registry. Everything runs on a paused clock so the wait window
//! can elapse without actually waiting.

use std::time::Duration;

use tally_hall::{Admission, HallConfig, WaitingHall};
use tally_protocol::{HallMessage, Identify, RoomId};
use tally_room::{Outbound, Outbox, RoomKind, RoomRegistry, Seat};
use tally_transport::ConnectionId;
use tokio::sync::mpsc;
use tokio::time::Instant;

type Inbox = mpsc::UnboundedReceiver<Outbound<HallMessage>>;

fn hall() -> WaitingHall {
    WaitingHall::new(RoomRegistry::default(), HallConfig::default())
}

fn client(id: u64) -> (ConnectionId, Outbox<HallMessage>, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ConnectionId::new(id), tx, rx)
}

fn identify(openid: &str, nick: &str) -> Identify {
    Identify {
        openid: openid.to_string(),
        nick_name: nick.to_string(),
    }
}

async fn next_message(inbox: &mut Inbox) -> HallMessage {
    match inbox.recv().await {
        Some(Outbound::Message(msg)) => msg,
        other => panic!("expected a message, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_arrival_is_queued() {
    let hall = hall();
    let (conn, tx, mut rx) = client(1);

    let admission = hall.identify(conn, tx, identify("a1", "Alice")).await;

    assert_eq!(admission, Admission::Queued);
    assert_eq!(next_message(&mut rx).await, HallMessage::matching());
    assert_eq!(hall.queue_len().await, 1);
    assert!(hall.is_queued("a1").await);
}

#[tokio::test(start_paused = true)]
async fn test_second_arrival_pairs_fifo() {
    let hall = hall();
    let (c1, tx1, mut rx1) = client(1);
    let (c2, tx2, mut rx2) = client(2);

    hall.identify(c1, tx1, identify("a1", "Alice")).await;
    next_message(&mut rx1).await;
    let admission = hall.identify(c2, tx2, identify("b1", "Bob")).await;

    assert_eq!(admission, Admission::Paired(RoomId(0)));
    assert_eq!(
        next_message(&mut rx1).await,
        HallMessage::match_success(RoomId(0))
    );
    assert_eq!(
        next_message(&mut rx2).await,
        HallMessage::match_success(RoomId(0))
    );
    assert_eq!(hall.queue_len().await, 0);

    let room = hall.rooms().get_room(RoomId(0)).await.unwrap();
    assert_eq!(room.kind(), RoomKind::Paired);
    assert_eq!(room.player(Seat::First).identity, "a1");
    assert_eq!(room.player(Seat::Second).identity, "b1");
}

#[tokio::test(start_paused = true)]
async fn test_pairing_cancels_the_wait_timer() {
    let hall = hall();
    let (c1, tx1, mut rx1) = client(1);
    let (c2, tx2, _rx2) = client(2);

    hall.identify(c1, tx1, identify("a1", "Alice")).await;
    hall.identify(c2, tx2, identify("b1", "Bob")).await;
    next_message(&mut rx1).await; // matching
    next_message(&mut rx1).await; // match success

    tokio::time::sleep(Duration::from_secs(20)).await;

    assert!(rx1.try_recv().is_err(), "no bot room after pairing");
    assert_eq!(hall.rooms().room_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_window_expiry_creates_bot_room() {
    let hall = hall();
    let (conn, tx, mut rx) = client(1);
    let start = Instant::now();

    hall.identify(conn, tx, identify("a1", "Alice")).await;
    assert_eq!(next_message(&mut rx).await, HallMessage::matching());

    let matched = next_message(&mut rx).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(8), "expired early: {elapsed:?}");

    assert_eq!(matched, HallMessage::matched(RoomId(0)));
    assert_eq!(hall.queue_len().await, 0);
    assert!(!hall.is_queued("a1").await);

    let room = hall.rooms().get_room(RoomId(0)).await.unwrap();
    assert_eq!(room.kind(), RoomKind::Synthetic);
    assert_eq!(room.player(Seat::First).identity, "a1");
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_before_timeout_is_never_promoted() {
    let hall = hall();
    let (conn, tx, mut rx) = client(1);

    hall.identify(conn, tx, identify("a1", "Alice")).await;
    next_message(&mut rx).await;

    assert!(hall.disconnect(conn).await);
    assert_eq!(hall.queue_len().await, 0);

    tokio::time::sleep(Duration::from_secs(20)).await;

    assert!(rx.try_recv().is_err(), "nothing sent to a dead connection");
    assert_eq!(hall.rooms().room_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_of_unqueued_connection_is_noop() {
    let hall = hall();
    let (c1, tx1, _rx1) = client(1);
    hall.identify(c1, tx1, identify("a1", "Alice")).await;

    assert!(!hall.disconnect(ConnectionId::new(99)).await);
    assert_eq!(hall.queue_len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_identify_while_queued_is_ignored() {
    let hall = hall();
    let (c1, tx1, mut rx1) = client(1);
    let (c2, tx2, mut rx2) = client(2);

    hall.identify(c1, tx1.clone(), identify("a1", "Alice")).await;
    next_message(&mut rx1).await;

    // Same identity from another connection.
    let again = hall.identify(c2, tx2, identify("a1", "Alice")).await;
    assert_eq!(again, Admission::AlreadyQueued);
    assert!(rx2.try_recv().is_err());

    // Another identity from the connection that is already waiting.
    let other = hall.identify(c1, tx1, identify("z9", "Zed")).await;
    assert_eq!(other, Admission::AlreadyQueued);

    assert_eq!(hall.queue_len().await, 1);
    assert!(rx1.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_identity_already_in_room_gets_matching() {
    let hall = hall();
    let (c1, tx1, _rx1) = client(1);
    let (c2, tx2, _rx2) = client(2);
    hall.identify(c1, tx1, identify("a1", "Alice")).await;
    hall.identify(c2, tx2, identify("b1", "Bob")).await;

    let (c3, tx3, mut rx3) = client(3);
    let admission = hall.identify(c3, tx3, identify("a1", "Alice")).await;

    assert_eq!(admission, Admission::AlreadyInRoom);
    assert_eq!(next_message(&mut rx3).await, HallMessage::matching());
    assert_eq!(hall.queue_len().await, 0, "a seated identity is not queued");
}

#[tokio::test(start_paused = true)]
async fn test_third_arrival_queues_after_pairing() {
    let hall = hall();
    let (c1, tx1, _rx1) = client(1);
    let (c2, tx2, _rx2) = client(2);
    let (c3, tx3, mut rx3) = client(3);

    hall.identify(c1, tx1, identify("a1", "Alice")).await;
    hall.identify(c2, tx2, identify("b1", "Bob")).await;
    let admission = hall.identify(c3, tx3, identify("c1", "Carol")).await;

    assert_eq!(admission, Admission::Queued);
    assert_eq!(next_message(&mut rx3).await, HallMessage::matching());
    assert_eq!(hall.queue_len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_queue_never_exceeds_one() {
    let hall = hall();
    let mut inboxes = Vec::new();

    for i in 0..7u64 {
        let (conn, tx, rx) = client(i);
        inboxes.push(rx);
        hall.identify(conn, tx, identify(&format!("p{i}"), "P")).await;
        let len = hall.queue_len().await;
        assert!(len <= 1, "queue grew to {len}");
        assert_eq!(len, usize::from(i % 2 == 0));
    }

    assert_eq!(hall.rooms().room_count().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_custom_match_wait() {
    let config = HallConfig {
        match_wait: Duration::from_secs(1),
    };
    let hall = WaitingHall::new(RoomRegistry::default(), config);
    let (conn, tx, mut rx) = client(1);
    let start = Instant::now();

    hall.identify(conn, tx, identify("a1", "Alice")).await;
    next_message(&mut rx).await;
    assert_eq!(next_message(&mut rx).await, HallMessage::matched(RoomId(0)));

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(2));
}
