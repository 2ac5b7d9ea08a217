//! Room actor: an isolated Tokio task that owns one two-seat room.
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel. Every read and write of a room's counts and links
//! happens inside that task, so binds, increments, disconnects and the
//! synthetic opponent's ticks are serialized without a lock.

use std::fmt;

use tally_protocol::{RoomId, RoomMessage};
use tally_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::pacer::{wait_for_pacer, BotPacer};
use crate::{
    BotConfig, Outbox, PeerLink, Player, RoomError, RoomRegistry, Seat,
};

/// Whether the second seat is a person or the synthetic opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// Two humans paired in the hall.
    Paired,
    /// One human and a self-driving counter.
    Synthetic,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paired => write!(f, "paired"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends the command and waits for the answer on it.
pub(crate) enum RoomCommand {
    /// Attach a connection to a seat and resync it.
    Bind {
        seat: Seat,
        conn: ConnectionId,
        outbox: Outbox<RoomMessage>,
        reply: oneshot::Sender<()>,
    },

    /// The player in `seat` counted one more.
    Add { seat: Seat },

    /// The connection bound to `seat` went away.
    Disconnect { seat: Seat, conn: ConnectionId },

    /// Request a snapshot of the room.
    Info { reply: oneshot::Sender<RoomInfo> },
}

/// A snapshot of a room's counters and links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub kind: RoomKind,
    pub first_count: u32,
    pub second_count: u32,
    /// `true` while a live connection is bound to the first seat.
    pub first_bound: bool,
    /// `true` while a live connection is bound to the second seat.
    pub second_bound: bool,
    pub closed: bool,
}

/// Handle to a running room actor.
///
/// Cheap to clone: an `mpsc::Sender` plus the two player records, which
/// never change for the life of the room. Keeping the records here lets
/// the registry answer "is this identity seated?" and the room endpoint
/// pick a seat without a round trip to the actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    kind: RoomKind,
    players: [Player; 2],
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn kind(&self) -> RoomKind {
        self.kind
    }

    /// The player record for a seat.
    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    /// The seat a client with this identity may bind to.
    ///
    /// The synthetic opponent's seat is never offered, so nobody can
    /// take over the bot by guessing its identity.
    pub fn seat_of(&self, identity: &str) -> Option<Seat> {
        [Seat::First, Seat::Second].into_iter().find(|&seat| {
            let bindable =
                self.kind == RoomKind::Paired || seat == Seat::First;
            bindable && self.player(seat).identity == identity
        })
    }

    /// Returns `true` if either seat belongs to `identity`.
    pub fn has_player(&self, identity: &str) -> bool {
        self.players.iter().any(|p| p.identity == identity)
    }

    /// Binds a connection to `seat` and sends it the other side's
    /// current count and nickname.
    ///
    /// If the seat already had a different live connection, that one is
    /// told to close; its later disconnect is ignored by the room.
    pub async fn bind(
        &self,
        seat: Seat,
        conn: ConnectionId,
        outbox: Outbox<RoomMessage>,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Bind {
            seat,
            conn,
            outbox,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Counts one for `seat` and relays it to the other side
    /// (fire-and-forget).
    pub async fn add(&self, seat: Seat) -> Result<(), RoomError> {
        self.send(RoomCommand::Add { seat }).await
    }

    /// Reports that `conn`, bound to `seat`, went away. The first such
    /// report from a current connection tears the room down.
    pub async fn disconnect(
        &self,
        seat: Seat,
        conn: ConnectionId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { seat, conn }).await
    }

    /// Requests a snapshot of the room.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// One seat's state inside the actor.
struct Slot {
    player: Player,
    link: PeerLink,
    count: u32,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    kind: RoomKind,
    slots: [Slot; 2],
    /// Once set, nothing in the room changes and nothing more is sent.
    closed: bool,
    registry: RoomRegistry,
    /// Present only in synthetic rooms.
    pacer: Option<BotPacer>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room closes.
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            kind = %self.kind,
            first = %self.slots[0].player,
            second = %self.slots[1].player,
            "room actor started"
        );

        while !self.closed {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                () = wait_for_pacer(self.pacer.as_ref()) => {
                    self.bot_turn().await;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Bind {
                seat,
                conn,
                outbox,
                reply,
            } => {
                self.bind(seat, conn, outbox);
                let _ = reply.send(());
            }
            RoomCommand::Add { seat } => self.player_add_num(seat),
            RoomCommand::Disconnect { seat, conn } => {
                self.disconnect(seat, conn).await;
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    fn slot(&self, seat: Seat) -> &Slot {
        &self.slots[seat.index()]
    }

    fn slot_mut(&mut self, seat: Seat) -> &mut Slot {
        &mut self.slots[seat.index()]
    }

    fn bind(
        &mut self,
        seat: Seat,
        conn: ConnectionId,
        outbox: Outbox<RoomMessage>,
    ) {
        let previous = std::mem::replace(
            &mut self.slot_mut(seat).link,
            PeerLink::Live { conn, outbox },
        );
        if let Some(old) = previous.conn() {
            if old != conn {
                tracing::info!(
                    room_id = %self.room_id,
                    %seat,
                    %old,
                    new = %conn,
                    "seat rebound, closing superseded connection"
                );
                previous.close();
            }
        }
        tracing::debug!(room_id = %self.room_id, %seat, %conn, "seat bound");
        self.send_another_count(seat);
    }

    /// Tells `seat` where the other side stands.
    fn send_another_count(&self, seat: Seat) {
        let other = self.slot(seat.other());
        self.slot(seat)
            .link
            .send(RoomMessage::update(&other.player.nickname, other.count));
    }

    /// Counts one for `seat` and pushes the new total to the other side
    /// if it has a live connection. Nothing is echoed to the sender.
    fn player_add_num(&mut self, seat: Seat) {
        let slot = self.slot_mut(seat);
        slot.count = slot.count.saturating_add(1);
        let update = RoomMessage::update(&slot.player.nickname, slot.count);
        let count = slot.count;

        let relayed = self.slot(seat.other()).link.send(update);
        tracing::debug!(
            room_id = %self.room_id,
            %seat,
            count,
            relayed,
            "count added"
        );
    }

    /// Sends the same payload to both seats.
    fn broadcast(&self, msg: &RoomMessage) {
        for slot in &self.slots {
            slot.link.send(msg.clone());
        }
    }

    async fn disconnect(&mut self, seat: Seat, conn: ConnectionId) {
        if self.closed {
            return;
        }
        if self.slot(seat).link.conn() != Some(conn) {
            tracing::debug!(
                room_id = %self.room_id,
                %seat,
                %conn,
                "ignoring disconnect from a connection no longer bound"
            );
            return;
        }

        tracing::info!(
            room_id = %self.room_id,
            player = %self.slot(seat).player,
            "player disconnected, closing room"
        );
        self.slot_mut(seat).link = PeerLink::Vacant;
        self.teardown().await;

        let other = self.slot(seat.other());
        other.link.send(RoomMessage::peer_left());
        other.link.close();
    }

    /// One cycle of the synthetic opponent: after each pause, either
    /// leave or count one more.
    async fn bot_turn(&mut self) {
        let ceiling = match &self.pacer {
            Some(pacer) => pacer.config().score_ceiling,
            None => return,
        };
        let bot_count = self.slot(Seat::Second).count;
        let human_gone = !self.slot(Seat::First).link.is_live();

        if bot_count >= ceiling || self.closed || human_gone {
            tracing::info!(
                room_id = %self.room_id,
                bot_count,
                human_gone,
                "bot leaving"
            );
            self.teardown().await;
            self.broadcast(&RoomMessage::bot_left());
            self.slot(Seat::First).link.close();
            return;
        }

        self.player_add_num(Seat::Second);
        if let Some(pacer) = self.pacer.as_mut() {
            pacer.reschedule();
        }
    }

    /// Marks the room closed and drops it from the registry. Runs at most
    /// once; the actor loop exits right after.
    async fn teardown(&mut self) {
        self.closed = true;
        self.pacer = None;
        self.registry.leave(self.room_id).await;
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            kind: self.kind,
            first_count: self.slot(Seat::First).count,
            second_count: self.slot(Seat::Second).count,
            first_bound: self.slot(Seat::First).link.is_live(),
            second_bound: self.slot(Seat::Second).link.is_live(),
            closed: self.closed,
        }
    }
}

/// Spawns a room actor and returns a handle to it.
///
/// Both seats start without a connection: whatever connections the
/// players used in the hall are not carried over. With `bot` set the
/// room is synthetic, the second seat is a null sink, and the actor
/// paces the opponent itself.
pub(crate) fn spawn_room(
    room_id: RoomId,
    first: Player,
    second: Player,
    bot: Option<BotConfig>,
    registry: RoomRegistry,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let kind = if bot.is_some() {
        RoomKind::Synthetic
    } else {
        RoomKind::Paired
    };
    let second_link = match kind {
        RoomKind::Paired => PeerLink::Vacant,
        RoomKind::Synthetic => PeerLink::Null,
    };

    let handle = RoomHandle {
        room_id,
        kind,
        players: [first.clone(), second.clone()],
        sender: tx,
    };

    let actor = RoomActor {
        room_id,
        kind,
        slots: [
            Slot {
                player: first,
                link: PeerLink::Vacant,
                count: 0,
            },
            Slot {
                player: second,
                link: second_link,
                count: 0,
            },
        ],
        closed: false,
        registry,
        pacer: bot.map(BotPacer::new),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    handle
}
