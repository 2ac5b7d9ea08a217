//! Per-connection handlers for the hall and room endpoints.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The request path picks the endpoint:
//!   - `/ws/hall` → identify, then relay hall status updates
//!   - `/ws/room/{roomId}/{openid}` → bind to a seat, then relay counts
//!   - anything else → closed immediately
//!
//! Hall and rooms never write to sockets. Each handler owns its socket
//! and an outbox receiver, and `select!`s between the two.

use std::sync::Arc;

use tally_hall::WaitingHall;
use tally_protocol::{ClientCommand, Codec, Identify, RoomId};
use tally_room::{Outbound, RoomError, RoomHandle, Seat};
use tally_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::TallyError;
use crate::server::ServerState;

/// Which endpoint a connection asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    Hall,
    Room { room_id: RoomId, identity: String },
}

impl Route {
    /// Parses a request path. Unknown paths, non-numeric room ids, and
    /// empty identities are `None`.
    pub(crate) fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        match segments.as_slice() {
            ["", "ws", "hall"] => Some(Self::Hall),
            ["", "ws", "room", room_id, identity] if !identity.is_empty() => {
                let room_id = room_id.parse().ok().map(RoomId)?;
                Some(Self::Room {
                    room_id,
                    identity: (*identity).to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Takes a connection out of the hall queue when the hall handler exits.
///
/// Normal exits call [`release`](Self::release), which finishes the
/// removal before the handler returns, so a wait timer can never promote
/// a player whose socket is already gone. If the handler leaves early
/// through `?`, `Drop` still removes the entry; since `Drop` is
/// synchronous, that path spawns a fire-and-forget task for the async
/// lock.
struct HallGuard {
    conn_id: ConnectionId,
    hall: Option<WaitingHall>,
}

impl HallGuard {
    async fn release(mut self) {
        if let Some(hall) = self.hall.take() {
            hall.disconnect(self.conn_id).await;
        }
    }
}

impl Drop for HallGuard {
    fn drop(&mut self) {
        if let Some(hall) = self.hall.take() {
            let conn_id = self.conn_id;
            tokio::spawn(async move {
                hall.disconnect(conn_id).await;
            });
        }
    }
}

/// Reports a room connection as gone when the room handler exits.
///
/// Same shape as [`HallGuard`]. A room ignores reports from connections
/// that are no longer bound to the seat, so a superseded connection's
/// guard is harmless.
struct RoomGuard {
    conn_id: ConnectionId,
    seat: Seat,
    room: Option<RoomHandle>,
}

impl RoomGuard {
    async fn release(mut self) {
        if let Some(room) = self.room.take() {
            report_disconnect(room, self.seat, self.conn_id).await;
        }
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        if let Some(room) = self.room.take() {
            let (conn_id, seat) = (self.conn_id, self.seat);
            tokio::spawn(report_disconnect(room, seat, conn_id));
        }
    }
}

/// Closes a socket whose handler is finishing anyway. A failure only
/// means the peer is already gone.
async fn close_quietly(conn: &WebSocketConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(conn_id = %conn.id(), error = %e, "close failed");
    }
}

async fn report_disconnect(room: RoomHandle, seat: Seat, conn_id: ConnectionId) {
    if let Err(e) = room.disconnect(seat, conn_id).await {
        // Closed rooms have no actor left to tell.
        tracing::debug!(%conn_id, error = %e, "room already gone on disconnect");
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TallyError> {
    let conn_id = conn.id();

    match Route::parse(conn.path()) {
        Some(Route::Hall) => handle_hall(conn, state).await,
        Some(Route::Room { room_id, identity }) => {
            handle_room(conn, state, room_id, identity).await
        }
        None => {
            tracing::info!(%conn_id, path = conn.path(), "unknown endpoint, closing");
            conn.close().await?;
            Ok(())
        }
    }
}

/// The hall endpoint: every text frame is an identify attempt; status
/// updates from the hall are encoded and sent back.
async fn handle_hall<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TallyError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "hall connection opened");

    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let guard = HallGuard {
        conn_id,
        hall: Some(state.hall.clone()),
    };

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                let text = match incoming {
                    Ok(Some(text)) => text,
                    Ok(None) => {
                        tracing::info!(%conn_id, "hall connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "hall recv error");
                        break;
                    }
                };

                let identify: Identify = match state.codec.decode(&text) {
                    Ok(identify) => identify,
                    Err(e) => {
                        tracing::info!(
                            %conn_id,
                            error = %e,
                            "malformed identify, closing"
                        );
                        close_quietly(&conn).await;
                        break;
                    }
                };

                let admission =
                    state.hall.identify(conn_id, outbox.clone(), identify).await;
                tracing::debug!(%conn_id, ?admission, "identify handled");
            }
            Some(out) = inbox.recv() => match out {
                Outbound::Message(msg) => {
                    let text = state.codec.encode(&msg)?;
                    conn.send(&text).await?;
                }
                Outbound::Close => {
                    close_quietly(&conn).await;
                    break;
                }
            },
        }
    }

    guard.release().await;
    Ok(())
}

/// The room endpoint: binds to the caller's seat, turns `add` tokens
/// into increments, and relays whatever the room sends this seat.
async fn handle_room<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
    room_id: RoomId,
    identity: String,
) -> Result<(), TallyError> {
    let conn_id = conn.id();

    let (room, seat) = match find_seat(&state, room_id, &identity).await {
        Ok(found) => found,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "rejecting room connection");
            conn.close().await?;
            return Ok(());
        }
    };

    let (outbox, mut inbox) = mpsc::unbounded_channel();
    if let Err(e) = room.bind(seat, conn_id, outbox).await {
        close_quietly(&conn).await;
        return Err(e.into());
    }
    let guard = RoomGuard {
        conn_id,
        seat,
        room: Some(room.clone()),
    };
    tracing::info!(
        %conn_id,
        %room_id,
        identity = %identity,
        %seat,
        "room connection bound"
    );

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                let text = match incoming {
                    Ok(Some(text)) => text,
                    Ok(None) => {
                        tracing::info!(%conn_id, %room_id, "room connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "room recv error");
                        break;
                    }
                };

                match ClientCommand::parse(&text) {
                    Some(ClientCommand::Add) => {
                        if room.add(seat).await.is_err() {
                            // The room closed under us; its Close is on
                            // the way or the actor is already gone.
                            break;
                        }
                    }
                    None => {
                        tracing::debug!(
                            %conn_id,
                            text = %text,
                            "ignoring unknown room command"
                        );
                    }
                }
            }
            out = inbox.recv() => match out {
                Some(Outbound::Message(msg)) => {
                    let text = state.codec.encode(&msg)?;
                    conn.send(&text).await?;
                }
                Some(Outbound::Close) | None => {
                    close_quietly(&conn).await;
                    break;
                }
            },
        }
    }

    guard.release().await;
    Ok(())
}

/// Looks up the room and the seat `identity` may bind to.
async fn find_seat<C: Codec>(
    state: &ServerState<C>,
    room_id: RoomId,
    identity: &str,
) -> Result<(RoomHandle, Seat), RoomError> {
    let room = state.rooms.get_room(room_id).await?;
    let seat = room
        .seat_of(identity)
        .ok_or_else(|| RoomError::NotInRoom(identity.to_string(), room_id))?;
    Ok((room, seat))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tally_hall::HallConfig;
    use tally_protocol::HallMessage;
    use tally_room::{Outbox, RoomRegistry};

    use super::*;

    async fn queued_hall() -> (WaitingHall, ConnectionId, Outbox<HallMessage>) {
        let hall = WaitingHall::new(RoomRegistry::default(), HallConfig::default());
        let conn_id = ConnectionId::new(1);
        let (outbox, _inbox) = mpsc::unbounded_channel();
        let identify = Identify {
            openid: "a1".into(),
            nick_name: "Alice".into(),
        };
        hall.identify(conn_id, outbox.clone(), identify).await;
        (hall, conn_id, outbox)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hall_guard_release_dequeues_before_returning() {
        let (hall, conn_id, _outbox) = queued_hall().await;
        let guard = HallGuard {
            conn_id,
            hall: Some(hall.clone()),
        };

        guard.release().await;

        // No yield in between: the entry must already be gone.
        assert_eq!(hall.queue_len().await, 0);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(hall.rooms().room_count().await, 0, "never promoted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hall_guard_drop_still_dequeues() {
        let (hall, conn_id, _outbox) = queued_hall().await;
        drop(HallGuard {
            conn_id,
            hall: Some(hall.clone()),
        });

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(hall.queue_len().await, 0);
    }

    #[test]
    fn test_parse_hall_route() {
        assert_eq!(Route::parse("/ws/hall"), Some(Route::Hall));
        assert_eq!(Route::parse("/ws/hall/"), Some(Route::Hall));
    }

    #[test]
    fn test_parse_room_route() {
        assert_eq!(
            Route::parse("/ws/room/12/oAbc-9"),
            Some(Route::Room {
                room_id: RoomId(12),
                identity: "oAbc-9".into(),
            })
        );
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        for path in [
            "/",
            "/ws",
            "/ws/lobby",
            "/ws/room/12",
            "/ws/room/abc/a1",
            "/ws/room/-1/a1",
            "/ws/room/1/a1/extra",
            "/hall",
        ] {
            assert_eq!(Route::parse(path), None, "{path} should not route");
        }
    }
}
