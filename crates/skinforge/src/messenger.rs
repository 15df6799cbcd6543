//! Backend side of the proxy relay.
//!
//! A proxy asks a backend to change a skin by sending a [`RelayMessage`]
//! inside a [`PluginMessage`] frame on [`SKINS_CHANNEL`]. The
//! [`Messenger`] decodes the frame, looks the action up in its dispatch
//! table, finds the target player by name or UUID and hands the resulting
//! [`SkinRequest`] to [`SkinsApi::apply_request`].
//!
//! ```text
//! frame ─► PluginMessage ─► channel? ─► Codec ─► RelayMessage
//!                                                   │ dispatch table
//!                                                   ▼
//!                      SkinsApi::apply_request ◄─ SkinRequest
//! ```
//!
//! Nothing goes back to the proxy. Every message ends in a [`Delivery`]
//! that is logged here and returned for tests; a bad message never ends
//! the link it arrived on. On a served link each request runs on its own
//! task, so requests for different players never wait on each other and
//! requests for one player are not ordered.

use std::collections::HashMap;
use std::sync::Arc;

use skinforge_protocol::{
    Codec, JsonCodec, PluginMessage, ProtocolError, RelayMessage, SKINS_CHANNEL, Skin, SkinModel,
    action,
};
use skinforge_session::DefaultSkinProvider;
use skinforge_transport::{Connection, Transport};

use crate::SkinsError;
use crate::api::{SkinRequest, SkinsApi};
use crate::source::SkinSource;
use crate::storage::Storage;

/// Turns a relay message into a request, or says why it can't.
pub type ActionParser = fn(&RelayMessage) -> Result<SkinRequest, ProtocolError>;

/// What happened to one relay message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The request reached `SkinsApi` and was accepted.
    Applied,
    /// Nobody by that name or UUID is tracked here.
    TargetOffline,
    /// The frame, payload or action couldn't be understood.
    Malformed,
    /// The frame was for another channel.
    Ignored,
    /// `SkinsApi` rejected the request (storage failure, unknown skin).
    Failed,
}

/// Receives relay messages and applies them.
pub struct Messenger<S, P, K, C = JsonCodec> {
    api: SkinsApi<S, P, K>,
    codec: C,
    actions: Arc<HashMap<String, ActionParser>>,
}

impl<S, P, K, C: Clone> Clone for Messenger<S, P, K, C> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            codec: self.codec.clone(),
            actions: Arc::clone(&self.actions),
        }
    }
}

impl<S, P, K> Messenger<S, P, K, JsonCodec>
where
    S: Storage,
    P: DefaultSkinProvider,
    K: SkinSource,
{
    /// A messenger speaking JSON with the built-in actions registered.
    pub fn new(api: SkinsApi<S, P, K>) -> Self {
        Self::with_codec(api, JsonCodec)
    }
}

impl<S, P, K, C> Messenger<S, P, K, C>
where
    S: Storage,
    P: DefaultSkinProvider,
    K: SkinSource,
    C: Codec + Clone,
{
    /// A messenger with a custom payload codec.
    ///
    /// Registers `set`, `reset`, `setByName` and `setByImage`, plus `name`
    /// and `image` as aliases for the last two.
    pub fn with_codec(api: SkinsApi<S, P, K>, codec: C) -> Self {
        let mut actions: HashMap<String, ActionParser> = HashMap::new();
        actions.insert(action::SET.into(), parse_set);
        actions.insert(action::RESET.into(), parse_reset);
        actions.insert(action::SET_BY_NAME.into(), parse_set_by_name);
        actions.insert(action::SET_BY_IMAGE.into(), parse_set_by_image);
        actions.insert("name".into(), parse_set_by_name);
        actions.insert("image".into(), parse_set_by_image);

        Self {
            api,
            codec,
            actions: Arc::new(actions),
        }
    }

    /// Adds or replaces an action. Call before [`serve`](Self::serve) or
    /// cloning; later clones share the table.
    pub fn register(&mut self, action: impl Into<String>, parser: ActionParser) {
        Arc::make_mut(&mut self.actions).insert(action.into(), parser);
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // -----------------------------------------------------------------------
    // Handling
    // -----------------------------------------------------------------------

    /// Handles one raw frame from a proxy link.
    pub async fn handle_frame(&self, frame: &[u8]) -> Delivery {
        match self.route(frame) {
            Ok((message, request)) => self.dispatch(message, request).await,
            Err(delivery) => delivery,
        }
    }

    /// Handles the payload of a frame already known to be on
    /// [`SKINS_CHANNEL`].
    pub async fn handle_payload(&self, payload: &[u8]) -> Delivery {
        match self.accept(payload) {
            Ok((message, request)) => self.dispatch(message, request).await,
            Err(delivery) => delivery,
        }
    }

    /// Decodes a frame down to a request. Frames that go no further are
    /// logged here and come back as their final [`Delivery`].
    fn route(&self, frame: &[u8]) -> Result<(RelayMessage, SkinRequest), Delivery> {
        let message = PluginMessage::decode(frame).map_err(|e| {
            tracing::warn!(error = %e, "dropping malformed relay frame");
            Delivery::Malformed
        })?;

        if message.channel != SKINS_CHANNEL {
            tracing::debug!(channel = %message.channel, "ignoring message on foreign channel");
            return Err(Delivery::Ignored);
        }
        self.accept(&message.data)
    }

    fn accept(&self, payload: &[u8]) -> Result<(RelayMessage, SkinRequest), Delivery> {
        self.parse(payload).map_err(|e| {
            tracing::warn!(error = %e, "dropping malformed relay message");
            Delivery::Malformed
        })
    }

    fn parse(&self, payload: &[u8]) -> Result<(RelayMessage, SkinRequest), SkinsError> {
        let message: RelayMessage = self.codec.decode(payload)?;
        let parser = self.actions.get(&message.action).ok_or_else(|| {
            ProtocolError::InvalidMessage(format!("unknown action '{}'", message.action))
        })?;
        let request = parser(&message)?;
        Ok((message, request))
    }

    /// Finds the target and runs the request against `SkinsApi`.
    async fn dispatch(&self, message: RelayMessage, request: SkinRequest) -> Delivery {
        let Some(handle) = self.api.get_player(&message.player) else {
            tracing::debug!(player = %message.player, action = %message.action, "relay target not online here");
            return Delivery::TargetOffline;
        };
        let uuid = handle.lock().await.uuid;

        match self.api.apply_request(uuid, request).await {
            Ok(()) => {
                tracing::debug!(player = %uuid, action = %message.action, "relay request applied");
                Delivery::Applied
            }
            Err(SkinsError::NotOnline(_)) => {
                tracing::debug!(player = %uuid, "relay target left before apply");
                Delivery::TargetOffline
            }
            Err(e) => {
                tracing::warn!(player = %uuid, action = %message.action, error = %e, "relay request failed");
                Delivery::Failed
            }
        }
    }

    // -----------------------------------------------------------------------
    // Serving
    // -----------------------------------------------------------------------

    /// Accepts proxy links until the transport fails for good. Each link
    /// gets its own task.
    pub async fn serve<T: Transport>(self, mut transport: T) {
        tracing::info!("relay messenger serving");
        loop {
            match transport.accept().await {
                Ok(conn) => {
                    let messenger = self.clone();
                    tokio::spawn(async move { messenger.run_link(conn).await });
                }
                Err(e) => {
                    tracing::error!(error = %e, "relay accept failed");
                }
            }
        }
    }

    async fn run_link<L: Connection>(&self, conn: L) {
        let link = conn.id();
        tracing::info!(%link, "proxy link opened");

        loop {
            match conn.recv().await {
                Ok(Some(frame)) => {
                    // Decoded in arrival order, applied concurrently.
                    let Ok((message, request)) = self.route(&frame) else {
                        continue;
                    };
                    let messenger = self.clone();
                    tokio::spawn(async move { messenger.dispatch(message, request).await });
                }
                Ok(None) => {
                    tracing::info!(%link, "proxy link closed");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%link, error = %e, "proxy link failed");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in actions
// ---------------------------------------------------------------------------

fn parse_set(message: &RelayMessage) -> Result<SkinRequest, ProtocolError> {
    Ok(SkinRequest::Set(Skin::new(
        message.field("skin_value")?,
        message.field("skin_signature")?,
    )))
}

fn parse_reset(_message: &RelayMessage) -> Result<SkinRequest, ProtocolError> {
    Ok(SkinRequest::Reset)
}

fn parse_set_by_name(message: &RelayMessage) -> Result<SkinRequest, ProtocolError> {
    Ok(SkinRequest::FromName(message.field("name")?.to_string()))
}

fn parse_set_by_image(message: &RelayMessage) -> Result<SkinRequest, ProtocolError> {
    let url = message.field("url")?.to_string();
    let model: SkinModel = message.field("model")?.parse()?;
    Ok(SkinRequest::FromImage { url, model })
}
