//! The waiting hall: matchmaking queue, pairing, and bot fallback.
//!
//! # Concurrency note
//!
//! Every hall connection handler, and every wait timer, calls into the
//! same `WaitingHall`. All queue reads and writes happen under one
//! `tokio::sync::Mutex`, and room creation happens while that lock is
//! still held, so "pop the waiting player" and "create the room for it"
//! are one step as far as any other caller can tell. The registry has
//! its own lock; the hall always takes its lock first.

use std::collections::VecDeque;
use std::sync::Arc;

use tally_protocol::{HallMessage, Identify, RoomId};
use tally_room::{Outbound, Outbox, Player, RoomRegistry, Seat};
use tally_transport::ConnectionId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::HallConfig;

/// What the hall did with an identify message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Nobody was waiting; the player is now queued and was told
    /// "matching".
    Queued,
    /// The player was paired with the waiting player; both were told
    /// "match success" with this room.
    Paired(RoomId),
    /// This identity (or this connection) is already at the head of the
    /// queue. Nothing was sent.
    AlreadyQueued,
    /// This identity already sits in a room. It was told "matching" and
    /// not queued.
    AlreadyInRoom,
}

/// Matches arriving players into rooms.
///
/// ## Lifecycle of a queue entry
///
/// ```text
/// identify() ──→ [queued] ──┬── identify() by someone else ──→ paired room
///                           ├── match_wait elapses ─────────→ bot room
///                           └── disconnect() ───────────────→ gone
/// ```
///
/// Exactly one of the three exits happens per entry. Each entry carries
/// a ticket; its timer only acts if an entry with that ticket is still in
/// the queue when it gets the lock, and is aborted outright when the
/// entry leaves any other way.
#[derive(Clone)]
pub struct WaitingHall {
    inner: Arc<Mutex<HallInner>>,
    rooms: RoomRegistry,
    config: HallConfig,
}

struct HallInner {
    /// Players waiting for a partner. Never longer than one: the second
    /// arrival always drains it.
    queue: VecDeque<Waiting>,
    next_ticket: u64,
}

/// A queued player and how to reach them.
struct Waiting {
    player: Player,
    conn: ConnectionId,
    outbox: Outbox<HallMessage>,
    ticket: u64,
    timer: Option<JoinHandle<()>>,
}

/// Pushes a status update to a hall connection. A handler that already
/// went away is logged and skipped.
fn notify(conn: ConnectionId, outbox: &Outbox<HallMessage>, msg: HallMessage) {
    if outbox.send(Outbound::Message(msg)).is_err() {
        tracing::debug!(conn_id = %conn, "hall connection gone before notification");
    }
}

impl Waiting {
    fn notify(&self, msg: HallMessage) {
        notify(self.conn, &self.outbox, msg);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl WaitingHall {
    /// Creates an empty hall that creates its rooms in `rooms`.
    pub fn new(rooms: RoomRegistry, config: HallConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HallInner {
                queue: VecDeque::new(),
                next_ticket: 0,
            })),
            rooms,
            config,
        }
    }

    /// The registry this hall creates rooms in.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Handles an identify message from connection `conn`.
    ///
    /// Status replies go to `outbox`. If the player ends up waiting, the
    /// hall keeps `outbox` and later sends either "match success" (when
    /// someone pairs with them) or "matched" (when the wait window runs
    /// out and a synthetic room is created).
    pub async fn identify(
        &self,
        conn: ConnectionId,
        outbox: Outbox<HallMessage>,
        identify: Identify,
    ) -> Admission {
        let Identify { openid, nick_name } = identify;
        let mut inner = self.inner.lock().await;

        let head_is_same = inner
            .queue
            .front()
            .is_some_and(|w| w.player.identity == openid || w.conn == conn);
        if head_is_same {
            tracing::debug!(%conn, identity = %openid, "duplicate identify ignored");
            return Admission::AlreadyQueued;
        }

        if self.rooms.check_player_in_rooms(&openid).await {
            tracing::info!(%conn, identity = %openid, "identity already in a room");
            notify(conn, &outbox, HallMessage::matching());
            return Admission::AlreadyInRoom;
        }

        match inner.queue.pop_front() {
            None => {
                let ticket = inner.next_ticket;
                inner.next_ticket += 1;

                let waiting = Waiting {
                    player: Player::new(openid, nick_name, Seat::First),
                    conn,
                    outbox,
                    ticket,
                    timer: Some(self.spawn_timer(ticket)),
                };
                waiting.notify(HallMessage::matching());
                tracing::info!(
                    %conn,
                    player = %waiting.player,
                    ticket,
                    "player queued"
                );
                inner.queue.push_back(waiting);
                Admission::Queued
            }
            Some(mut waiting) => {
                waiting.cancel_timer();
                let arriving = Player::new(openid, nick_name, Seat::Second);
                let room_id = self.rooms.assign(&waiting.player, &arriving).await;

                tracing::info!(
                    %room_id,
                    first = %waiting.player,
                    second = %arriving,
                    "players paired"
                );
                waiting.notify(HallMessage::match_success(room_id));
                notify(conn, &outbox, HallMessage::match_success(room_id));
                Admission::Paired(room_id)
            }
        }
    }

    /// Removes whatever `conn` has queued. Returns `true` if something
    /// was removed; its pending timeout will never act.
    pub async fn disconnect(&self, conn: ConnectionId) -> bool {
        let mut inner = self.inner.lock().await;
        let before = inner.queue.len();
        inner.queue.retain_mut(|waiting| {
            if waiting.conn != conn {
                return true;
            }
            waiting.cancel_timer();
            tracing::info!(
                %conn,
                player = %waiting.player,
                "queued player disconnected"
            );
            false
        });
        inner.queue.len() != before
    }

    /// Number of players currently waiting.
    pub async fn queue_len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    /// Returns `true` if `identity` is waiting in the queue.
    pub async fn is_queued(&self, identity: &str) -> bool {
        self.inner
            .lock()
            .await
            .queue
            .iter()
            .any(|w| w.player.identity == identity)
    }

    fn spawn_timer(&self, ticket: u64) -> JoinHandle<()> {
        let hall = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(hall.config.match_wait).await;
            hall.expire(ticket).await;
        })
    }

    /// The wait window for `ticket` ran out. If that entry is still
    /// queued, promote it to a synthetic room.
    async fn expire(&self, ticket: u64) {
        let mut inner = self.inner.lock().await;
        let Some(pos) = inner.queue.iter().position(|w| w.ticket == ticket)
        else {
            tracing::debug!(ticket, "wait timer fired for a consumed entry");
            return;
        };
        let Some(waiting) = inner.queue.remove(pos) else {
            return;
        };

        let room_id = self.rooms.assign_bot(&waiting.player).await;
        tracing::info!(
            %room_id,
            player = %waiting.player,
            "no partner arrived, matched with bot"
        );
        waiting.notify(HallMessage::matched(room_id));
    }
}
