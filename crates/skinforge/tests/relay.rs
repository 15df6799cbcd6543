//! Relay tests: the backend `Messenger` dispatch table driven directly, and
//! a real proxy → backend WebSocket link.

use std::time::Duration;

use skinforge::prelude::*;
use skinforge::{Delivery, RelayConfig, SourceError};
use skinforge_protocol::{Codec, JsonCodec, PacketKind, PluginMessage, SKINS_CHANNEL};
use skinforge_transport::Connection;
use tokio::sync::mpsc::UnboundedReceiver;

// =========================================================================
// Helpers
// =========================================================================

type Plugin = SkinsPlugin<LoginProfiles, StallingSource>;

/// A skin table where the account `slow` never answers.
struct StallingSource(StaticSkinSource);

impl SkinSource for StallingSource {
    async fn skin_by_name(&self, name: &str) -> Result<Option<Skin>, SourceError> {
        if name == "slow" {
            std::future::pending::<()>().await;
        }
        self.0.skin_by_name(name).await
    }

    async fn skin_from_image(&self, url: &str, model: SkinModel) -> Result<Option<Skin>, SourceError> {
        self.0.skin_from_image(url, model).await
    }
}

fn world() -> World {
    let mut world = World::new("org.bukkit.craftbukkit.v1_15_R1");
    world.add_level(LevelInfo::new("world", Dimension::Overworld));
    world
}

async fn enable(relay: Option<&str>) -> Plugin {
    let config = SkinsConfig {
        tick_rate_hz: 0,
        relay: RelayConfig {
            bind: relay.map(str::to_string),
        },
        ..SkinsConfig::default()
    };
    SkinsPlugin::builder(config)
        .source(StallingSource(
            StaticSkinSource::new().with_name("Notch", Skin::new("notch", "sig")),
        ))
        .enable(world())
        .await
        .unwrap()
}

async fn join(plugin: &Plugin, name: &str) -> (PlayerUuid, UnboundedReceiver<ClientboundPacket>) {
    let uuid = PlayerUuid::random();
    let joined = plugin
        .listener()
        .on_join(JoinRequest::new(uuid, name))
        .await
        .unwrap();
    joined.skin_load.await.unwrap();
    let mut packets = joined.packets;
    settle(plugin).await;
    drain(&mut packets);
    (uuid, packets)
}

async fn settle(plugin: &Plugin) {
    plugin.main_thread().call(|_| ()).await.unwrap();
}

fn drain(rx: &mut UnboundedReceiver<ClientboundPacket>) -> Vec<PacketKind> {
    let mut out = Vec::new();
    while let Ok(packet) = rx.try_recv() {
        out.push(packet.kind());
    }
    out
}

fn frame(message: &RelayMessage) -> Vec<u8> {
    let payload = JsonCodec.encode(message).unwrap();
    PluginMessage::new(SKINS_CHANNEL, payload).encode().unwrap()
}

fn raw_frame(json: &str) -> Vec<u8> {
    PluginMessage::new(SKINS_CHANNEL, json.as_bytes().to_vec())
        .encode()
        .unwrap()
}

async fn live_skin(plugin: &Plugin, uuid: PlayerUuid) -> Option<Skin> {
    let adapter = plugin.api().adapter().clone();
    plugin
        .main_thread()
        .call(move |world| world.player(uuid).and_then(|p| adapter.get_skin(p)))
        .await
        .unwrap()
}

async fn wait_for_skin(plugin: &Plugin, uuid: PlayerUuid, expected: &Skin) {
    for _ in 0..200 {
        if live_skin(plugin, uuid).await.as_ref() == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("skin never arrived");
}

// =========================================================================
// Dispatch
// =========================================================================

#[tokio::test]
async fn test_relayed_set_updates_record_and_refreshes_once() {
    let plugin = enable(None).await;
    let (uuid, mut rx) = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());
    let skin = Skin::new("relayed", "sig");

    let delivery = messenger.handle_frame(&frame(&RelayMessage::set("Alice", &skin))).await;
    settle(&plugin).await;

    assert_eq!(delivery, Delivery::Applied);
    let handle = plugin.api().get_player("Alice").unwrap();
    assert_eq!(handle.lock().await.custom_skin, Some(skin.clone()));
    assert_eq!(live_skin(&plugin, uuid).await, Some(skin));

    let respawns = drain(&mut rx)
        .into_iter()
        .filter(|&k| k == PacketKind::Respawn)
        .count();
    assert_eq!(respawns, 1);
}

#[tokio::test]
async fn test_relayed_set_by_uuid_string() {
    let plugin = enable(None).await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());
    let skin = Skin::new("by-uuid", "sig");

    let delivery = messenger
        .handle_frame(&frame(&RelayMessage::set(uuid.to_string(), &skin)))
        .await;
    settle(&plugin).await;

    assert_eq!(delivery, Delivery::Applied);
    assert_eq!(live_skin(&plugin, uuid).await, Some(skin));
}

#[tokio::test]
async fn test_relayed_message_for_absent_player_is_noop() {
    let plugin = enable(None).await;
    let (uuid, mut rx) = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());

    let delivery = messenger
        .handle_frame(&frame(&RelayMessage::set("Bob", &Skin::new("v", "s"))))
        .await;
    settle(&plugin).await;

    assert_eq!(delivery, Delivery::TargetOffline);
    assert!(drain(&mut rx).is_empty());
    assert_eq!(live_skin(&plugin, uuid).await, None);
    assert_eq!(plugin.api().tracked_count(), 1);
}

#[tokio::test]
async fn test_relayed_reset_restores_default() {
    let plugin = enable(None).await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());
    plugin.api().set_skin(uuid, Skin::new("custom", "s")).await.unwrap();

    let delivery = messenger.handle_frame(&frame(&RelayMessage::reset("Alice"))).await;
    settle(&plugin).await;

    assert_eq!(delivery, Delivery::Applied);
    let handle = plugin.api().get_player("Alice").unwrap();
    assert_eq!(handle.lock().await.custom_skin, None);
}

#[tokio::test]
async fn test_legacy_name_alias_is_dispatched() {
    let plugin = enable(None).await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());

    let delivery = messenger
        .handle_frame(&raw_frame(r#"{"action":"name","player":"Alice","name":"Notch"}"#))
        .await;
    settle(&plugin).await;

    assert_eq!(delivery, Delivery::Applied);
    assert_eq!(live_skin(&plugin, uuid).await, Some(Skin::new("notch", "sig")));
}

#[tokio::test]
async fn test_builtin_actions_registered() {
    let plugin = enable(None).await;
    let messenger = Messenger::new(plugin.api().clone());
    assert_eq!(
        messenger.actions(),
        vec!["image", "name", "reset", "set", "setByImage", "setByName"]
    );
}

#[tokio::test]
async fn test_unknown_action_is_malformed() {
    let plugin = enable(None).await;
    let _alice = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());

    let delivery = messenger
        .handle_frame(&raw_frame(r#"{"action":"menu","player":"Alice"}"#))
        .await;
    assert_eq!(delivery, Delivery::Malformed);
}

#[tokio::test]
async fn test_missing_field_is_malformed() {
    let plugin = enable(None).await;
    let _alice = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());

    let delivery = messenger
        .handle_frame(&raw_frame(r#"{"action":"set","player":"Alice","skin_value":"v"}"#))
        .await;
    assert_eq!(delivery, Delivery::Malformed);
}

#[tokio::test]
async fn test_garbage_frame_is_malformed() {
    let plugin = enable(None).await;
    let messenger = Messenger::new(plugin.api().clone());

    assert_eq!(messenger.handle_frame(b"\x00").await, Delivery::Malformed);
    assert_eq!(messenger.handle_frame(&raw_frame("not json")).await, Delivery::Malformed);
}

#[tokio::test]
async fn test_foreign_channel_is_ignored() {
    let plugin = enable(None).await;
    let _alice = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());
    let payload = JsonCodec.encode(&RelayMessage::reset("Alice")).unwrap();
    let frame = PluginMessage::new("bungeecord:main", payload).encode().unwrap();

    assert_eq!(messenger.handle_frame(&frame).await, Delivery::Ignored);
}

#[tokio::test]
async fn test_source_miss_is_failed() {
    let plugin = enable(None).await;
    let _alice = join(&plugin, "Alice").await;
    let messenger = Messenger::new(plugin.api().clone());

    let delivery = messenger
        .handle_frame(&frame(&RelayMessage::set_by_name("Alice", "nobody")))
        .await;
    assert_eq!(delivery, Delivery::Failed);
}

// =========================================================================
// Proxy → backend over WebSocket
// =========================================================================

#[tokio::test]
async fn test_proxy_set_skin_reaches_backend() {
    let plugin = enable(Some("127.0.0.1:0")).await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let addr = plugin.relay_addr().unwrap();

    let proxy = ProxyMessenger::connect(&addr.to_string()).await.unwrap();
    let skin = Skin::new("over-the-wire", "sig");
    proxy.set_skin("Alice", &skin).await.unwrap();

    wait_for_skin(&plugin, uuid, &skin).await;
}

#[tokio::test]
async fn test_bad_frame_does_not_end_link() {
    let plugin = enable(Some("127.0.0.1:0")).await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let addr = plugin.relay_addr().unwrap();

    let proxy = ProxyMessenger::connect(&addr.to_string()).await.unwrap();
    proxy.link().send(b"garbage").await.unwrap();
    proxy.set_skin("Nobody", &Skin::new("x", "y")).await.unwrap();
    let skin = Skin::new("still-alive", "sig");
    proxy.set_skin("Alice", &skin).await.unwrap();

    wait_for_skin(&plugin, uuid, &skin).await;
}

#[tokio::test]
async fn test_hung_request_does_not_block_other_player_on_link() {
    let plugin = enable(Some("127.0.0.1:0")).await;
    let (_alice, _alice_rx) = join(&plugin, "Alice").await;
    let (bob, _bob_rx) = join(&plugin, "Bob").await;
    let addr = plugin.relay_addr().unwrap();
    let proxy = ProxyMessenger::connect(&addr.to_string()).await.unwrap();

    proxy.set_skin_from_name("Alice", "slow").await.unwrap();
    let skin = Skin::new("V", "S");
    proxy.set_skin("Bob", &skin).await.unwrap();

    wait_for_skin(&plugin, bob, &skin).await;
    let handle = plugin.api().get_player("Bob").unwrap();
    assert_eq!(handle.lock().await.custom_skin, Some(skin));
    let alice = plugin.api().get_player("Alice").unwrap();
    assert_eq!(alice.lock().await.custom_skin, None);
}

#[tokio::test]
async fn test_proxy_reset_over_wire() {
    let plugin = enable(Some("127.0.0.1:0")).await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let addr = plugin.relay_addr().unwrap();
    let proxy = ProxyMessenger::connect(&addr.to_string()).await.unwrap();

    let custom = Skin::new("custom", "sig");
    proxy.set_skin("Alice", &custom).await.unwrap();
    wait_for_skin(&plugin, uuid, &custom).await;

    proxy.reset_skin("Alice").await.unwrap();
    for _ in 0..200 {
        if live_skin(&plugin, uuid).await.is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("reset never arrived");
}
