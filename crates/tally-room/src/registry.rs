//! Room registry: allocates room IDs and owns the set of live rooms.

use std::collections::BTreeMap;
use std::sync::Arc;

use tally_protocol::RoomId;
use tokio::sync::Mutex;

use crate::room::spawn_room;
use crate::{BotConfig, Player, RoomError, RoomHandle, Seat};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// The single source of truth for which rooms exist and who sits in them.
///
/// This is a cheap, cloneable handle: the hall, every room actor, and
/// every room connection handler hold one. Rooms are keyed by a stable
/// id that is never reused, so removing one room never changes how any
/// other room is addressed.
///
/// The lock is only held for short, non-suspending map operations; no
/// method awaits a room actor while holding it, which is what lets a
/// room actor call [`leave`](Self::leave) on itself.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    bot_config: BotConfig,
}

struct RegistryInner {
    /// Live rooms in id order.
    rooms: BTreeMap<RoomId, RoomHandle>,
    /// The id the next room gets. Only ever increases.
    next_id: u64,
}

impl RoomRegistry {
    /// Creates an empty registry whose synthetic rooms use `bot_config`.
    pub fn new(bot_config: BotConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                rooms: BTreeMap::new(),
                next_id: 0,
            })),
            bot_config: bot_config.validated(),
        }
    }

    /// Creates a room for two humans and returns its ID.
    ///
    /// Only identity and nickname are copied from the given records; the
    /// room gets fresh players in the first and second seats.
    pub async fn assign(&self, first: &Player, second: &Player) -> RoomId {
        self.insert(
            first.reseated(Seat::First),
            second.reseated(Seat::Second),
            None,
        )
        .await
    }

    /// Creates a room that pairs `first` with a synthetic opponent and
    /// starts the opponent's pacing. Returns the room's ID.
    pub async fn assign_bot(&self, first: &Player) -> RoomId {
        let bot = Player::synthetic(&self.bot_config.nickname);
        self.insert(
            first.reseated(Seat::First),
            bot,
            Some(self.bot_config.clone()),
        )
        .await
    }

    async fn insert(
        &self,
        first: Player,
        second: Player,
        bot: Option<BotConfig>,
    ) -> RoomId {
        let mut inner = self.inner.lock().await;
        let room_id = RoomId(inner.next_id);
        inner.next_id += 1;

        let handle = spawn_room(
            room_id,
            first,
            second,
            bot,
            self.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        tracing::info!(%room_id, kind = %handle.kind(), "room created");
        inner.rooms.insert(room_id, handle);
        room_id
    }

    /// Removes a room. Returns `false` if it was already gone.
    pub async fn leave(&self, room_id: RoomId) -> bool {
        let removed = self.inner.lock().await.rooms.remove(&room_id).is_some();
        if removed {
            tracing::info!(%room_id, "room removed");
        }
        removed
    }

    /// Looks up a live room.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if no room has this id, either
    /// because it was never allocated or because it has been removed.
    pub async fn get_room(
        &self,
        room_id: RoomId,
    ) -> Result<RoomHandle, RoomError> {
        self.inner
            .lock()
            .await
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::NotFound(room_id))
    }

    /// Returns `true` if `identity` holds a seat in any live room.
    ///
    /// This is a linear scan, used by the hall as a best-effort guard
    /// against stale identify attempts, not as a lock.
    pub async fn check_player_in_rooms(&self, identity: &str) -> bool {
        self.inner
            .lock()
            .await
            .rooms
            .values()
            .any(|room| room.has_player(identity))
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.inner.lock().await.rooms.len()
    }

    /// Lists live room IDs in ascending order.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.inner.lock().await.rooms.keys().copied().collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(BotConfig::default())
    }
}
