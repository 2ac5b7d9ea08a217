//! `TallyServer` builder and server loop.
//!
//! This is the entry point for running a Tally server. It ties together
//! all the layers: transport → protocol → hall → rooms.

use std::sync::Arc;
use std::time::Duration;

use tally_hall::{HallConfig, WaitingHall};
use tally_protocol::{Codec, JsonCodec};
use tally_room::{BotConfig, RoomRegistry};
use tally_transport::{PendingConnection, Transport, WebSocketTransport};

use crate::TallyError;
use crate::handler::handle_connection;

/// Address used when none is configured.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:1667";

/// How long a client may take to complete the WebSocket upgrade.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared server state passed to each connection handler task.
///
/// The hall and the registry are themselves cheap handles around their
/// own locks, so the state needs no extra locking.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) hall: WaitingHall,
    pub(crate) rooms: RoomRegistry,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Tally server.
///
/// # Example
///
/// ```rust,ignore
/// use tally::prelude::*;
///
/// let server = TallyServer::builder()
///     .bind("0.0.0.0:1667")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TallyServerBuilder {
    bind_addr: String,
    hall_config: HallConfig,
    bot_config: BotConfig,
}

impl TallyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            hall_config: HallConfig::default(),
            bot_config: BotConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets how long the hall waits before falling back to a bot.
    pub fn hall_config(mut self, config: HallConfig) -> Self {
        self.hall_config = config;
        self
    }

    /// Sets how synthetic opponents behave.
    pub fn bot_config(mut self, config: BotConfig) -> Self {
        self.bot_config = config;
        self
    }

    /// Binds the listener and wires up the hall and registry.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<TallyServer<JsonCodec>, TallyError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let rooms = RoomRegistry::new(self.bot_config);
        let hall = WaitingHall::new(rooms.clone(), self.hall_config);
        let state = Arc::new(ServerState {
            hall,
            rooms,
            codec: JsonCodec,
        });

        Ok(TallyServer { transport, state })
    }
}

impl Default for TallyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Tally server, bound and ready.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TallyServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl TallyServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> TallyServerBuilder {
        TallyServerBuilder::new()
    }
}

impl<C: Codec> TallyServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The waiting hall this server matches players in.
    pub fn hall(&self) -> &WaitingHall {
        &self.state.hall
    }

    /// The registry holding this server's live rooms.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.state.rooms
    }

    /// Runs the server accept loop.
    ///
    /// The loop only takes raw streams off the listener. Each stream gets
    /// its own task that performs the WebSocket handshake (bounded by
    /// [`HANDSHAKE_TIMEOUT`]) and then handles the connection. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), TallyError> {
        tracing::info!("Tally server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(serve(pending, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Upgrades one accepted stream and runs its handler.
async fn serve<C: Codec>(pending: PendingConnection, state: Arc<ServerState<C>>) {
    let peer = pending.peer_addr();
    let upgrade = WebSocketTransport::handshake(pending);

    let conn = match tokio::time::timeout(HANDSHAKE_TIMEOUT, upgrade).await {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            tracing::debug!(%peer, error = %e, "handshake failed");
            return;
        }
        Err(_) => {
            tracing::debug!(%peer, "handshake timed out");
            return;
        }
    };

    if let Err(e) = handle_connection(conn, state).await {
        tracing::debug!(error = %e, "connection ended with error");
    }
}
