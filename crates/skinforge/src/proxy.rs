//! Proxy side of the relay.
//!
//! The proxy doesn't own players' skins; it forwards requests to the
//! backend the player is connected to. Sending is fire-and-forget: there is
//! no acknowledgement and no retry, and a backend that doesn't know the
//! player drops the message.

use skinforge_protocol::{
    Codec, JsonCodec, PluginMessage, RelayMessage, SKINS_CHANNEL, Skin, SkinModel,
};
use skinforge_transport::{Connection, WebSocketConnection, WebSocketTransport};

use crate::SkinsError;

/// One link from a proxy to a backend's relay.
pub struct ProxyMessenger<L, C = JsonCodec> {
    link: L,
    codec: C,
}

impl ProxyMessenger<WebSocketConnection, JsonCodec> {
    /// Connects to a backend relay at `addr` (`host:port`).
    pub async fn connect(addr: &str) -> Result<Self, SkinsError> {
        let link = WebSocketTransport::connect(addr).await?;
        tracing::info!(%addr, link = %link.id(), "connected to backend relay");
        Ok(Self::new(link, JsonCodec))
    }
}

impl<L, C> ProxyMessenger<L, C>
where
    L: Connection,
    SkinsError: From<L::Error>,
    C: Codec,
{
    /// Wraps an already open link.
    pub fn new(link: L, codec: C) -> Self {
        Self { link, codec }
    }

    /// Encodes and sends one message on [`SKINS_CHANNEL`].
    pub async fn send(&self, message: &RelayMessage) -> Result<(), SkinsError> {
        let payload = self.codec.encode(message)?;
        let frame = PluginMessage::new(SKINS_CHANNEL, payload).encode()?;
        self.link.send(&frame).await?;
        tracing::debug!(player = %message.player, action = %message.action, "relay message sent");
        Ok(())
    }

    pub async fn set_skin(&self, player: &str, skin: &Skin) -> Result<(), SkinsError> {
        self.send(&RelayMessage::set(player, skin)).await
    }

    pub async fn reset_skin(&self, player: &str) -> Result<(), SkinsError> {
        self.send(&RelayMessage::reset(player)).await
    }

    pub async fn set_skin_from_name(&self, player: &str, name: &str) -> Result<(), SkinsError> {
        self.send(&RelayMessage::set_by_name(player, name)).await
    }

    pub async fn set_skin_from_image(
        &self,
        player: &str,
        url: &str,
        model: SkinModel,
    ) -> Result<(), SkinsError> {
        self.send(&RelayMessage::set_by_image(player, url, model)).await
    }

    /// Closes the link.
    pub async fn close(&self) -> Result<(), SkinsError> {
        self.link.close().await?;
        Ok(())
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}
