//! End-to-end tests for `SkinsApi` through a fully enabled plugin:
//! join/quit, set/reset semantics, and startup failures.

use skinforge::prelude::*;
use skinforge::{DatabaseConfig, StorageBackend};
use skinforge_protocol::{PacketKind, PlayerInfoAction, ProfileProperty, TEXTURES_PROPERTY};
use tokio::sync::mpsc::UnboundedReceiver;

// =========================================================================
// Helpers
// =========================================================================

fn world() -> World {
    let mut world = World::new("org.bukkit.craftbukkit.v1_16_R1");
    world.add_level(LevelInfo::new("world", Dimension::Overworld));
    world
}

fn config() -> SkinsConfig {
    SkinsConfig {
        tick_rate_hz: 0,
        ..SkinsConfig::default()
    }
}

fn login_skin() -> Skin {
    Skin::new("login-value", "login-sig")
}

async fn enable() -> SkinsPlugin<LoginProfiles, StaticSkinSource> {
    let source = StaticSkinSource::new()
        .with_name("Notch", Skin::new("notch-value", "notch-sig"))
        .with_image("https://i.example/a.png", SkinModel::Alex, Skin::new("img", "img-sig"));
    SkinsPlugin::builder(config())
        .source(source)
        .enable(world())
        .await
        .unwrap()
}

/// Joins a player with a login skin and waits for their record to load.
async fn join(
    plugin: &SkinsPlugin<LoginProfiles, StaticSkinSource>,
    name: &str,
) -> (PlayerUuid, UnboundedReceiver<ClientboundPacket>) {
    let uuid = PlayerUuid::random();
    let request = JoinRequest::new(uuid, name).with_property(ProfileProperty {
        name: TEXTURES_PROPERTY.into(),
        value: login_skin().value().into(),
        signature: Some(login_skin().signature().into()),
    });
    let joined = plugin.listener().on_join(request).await.unwrap();
    joined.skin_load.await.unwrap();

    let mut packets = joined.packets;
    settle(plugin).await;
    drain(&mut packets);
    (uuid, packets)
}

/// Waits until every main-thread task queued so far has run.
async fn settle(plugin: &SkinsPlugin<LoginProfiles, StaticSkinSource>) {
    plugin.main_thread().call(|_| ()).await.unwrap();
}

fn drain(rx: &mut UnboundedReceiver<ClientboundPacket>) -> Vec<PacketKind> {
    let mut out = Vec::new();
    while let Ok(packet) = rx.try_recv() {
        out.push(packet.kind());
    }
    out
}

fn respawns(kinds: &[PacketKind]) -> usize {
    kinds.iter().filter(|&&k| k == PacketKind::Respawn).count()
}

async fn live_skin(
    plugin: &SkinsPlugin<LoginProfiles, StaticSkinSource>,
    uuid: PlayerUuid,
) -> Option<Skin> {
    let adapter = plugin.api().adapter().clone();
    plugin
        .main_thread()
        .call(move |world| world.player(uuid).and_then(|p| adapter.get_skin(p)))
        .await
        .unwrap()
}

async fn tracked_skin(
    plugin: &SkinsPlugin<LoginProfiles, StaticSkinSource>,
    uuid: PlayerUuid,
) -> Option<Skin> {
    let handle = plugin.api().get_player(&uuid.to_string()).unwrap();
    let record = handle.lock().await;
    record.custom_skin.clone()
}

fn stored(plugin: &SkinsPlugin<LoginProfiles, StaticSkinSource>, uuid: PlayerUuid) -> PlayerRecord {
    match plugin.api().storage() {
        StorageBackend::Memory(memory) => memory.get(uuid).expect("record persisted"),
        StorageBackend::File(_) => panic!("tests run on memory storage"),
    }
}

// =========================================================================
// Join / quit
// =========================================================================

#[tokio::test]
async fn test_join_registers_record_with_login_skin() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    assert!(plugin.api().is_tracked(uuid));
    let handle = plugin.api().get_player("alice").unwrap();
    let record = handle.lock().await;
    assert_eq!(record.uuid, uuid);
    assert_eq!(record.default_skin, Some(login_skin()));
    assert_eq!(record.custom_skin, None);
    assert_eq!(stored(&plugin, uuid).name, "Alice");
}

#[tokio::test]
async fn test_quit_evicts_record_and_later_set_is_not_online() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    assert!(plugin.listener().on_quit(uuid).await.unwrap());
    assert!(!plugin.api().is_tracked(uuid));

    let result = plugin.api().set_skin(uuid, Skin::new("v", "s")).await;
    assert!(matches!(result, Err(SkinsError::NotOnline(_))));
    assert!(!plugin.listener().on_quit(uuid).await.unwrap());
}

#[tokio::test]
async fn test_rejoin_reapplies_stored_custom_skin() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let custom = Skin::new("custom", "custom-sig");
    plugin.api().set_skin(uuid, custom.clone()).await.unwrap();
    plugin.listener().on_quit(uuid).await.unwrap();

    let request = JoinRequest::new(uuid, "Alice");
    let joined = plugin.listener().on_join(request).await.unwrap();
    joined.skin_load.await.unwrap();
    settle(&plugin).await;

    assert_eq!(live_skin(&plugin, uuid).await, Some(custom.clone()));
    assert_eq!(tracked_skin(&plugin, uuid).await, Some(custom));
}

/// Textures value of every info ADD entry for `target` in `packets`.
fn added_textures(packets: &[ClientboundPacket], target: PlayerUuid) -> Vec<Option<String>> {
    packets
        .iter()
        .filter_map(|p| match p {
            ClientboundPacket::PlayerInfo {
                action: PlayerInfoAction::AddPlayer,
                entries,
            } => Some(entries),
            _ => None,
        })
        .flatten()
        .filter(|e| e.uuid == target)
        .map(|e| e.textures().map(|t| t.value.clone()))
        .collect()
}

fn drain_packets(rx: &mut UnboundedReceiver<ClientboundPacket>) -> Vec<ClientboundPacket> {
    let mut out = Vec::new();
    while let Ok(packet) = rx.try_recv() {
        out.push(packet);
    }
    out
}

#[tokio::test]
async fn test_dead_at_load_then_respawn_shows_custom_skin() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;
    let (_bob, mut bob_rx) = join(&plugin, "Bob").await;
    let custom = Skin::new("custom", "custom-sig");
    plugin.api().set_skin(uuid, custom.clone()).await.unwrap();
    plugin.listener().on_quit(uuid).await.unwrap();
    drain_packets(&mut bob_rx);

    // Back in the world but dead before the record load reaches the loop.
    let _alice_rx = plugin
        .main_thread()
        .call(move |world| world.join(JoinRequest::new(uuid, "Alice")))
        .await
        .unwrap()
        .unwrap();
    plugin
        .main_thread()
        .call(move |world| world.player_mut(uuid).unwrap().dead = true)
        .await
        .unwrap();
    plugin.api().load_player(uuid, "Alice".into()).await.unwrap();
    settle(&plugin).await;

    assert_eq!(live_skin(&plugin, uuid).await, Some(custom.clone()));
    let seen = added_textures(&drain_packets(&mut bob_rx), uuid);
    assert!(!seen.contains(&Some("custom".to_string())), "refreshed while dead: {seen:?}");

    assert!(plugin.listener().on_respawn(uuid).await.unwrap());
    settle(&plugin).await;

    let seen = added_textures(&drain_packets(&mut bob_rx), uuid);
    assert_eq!(seen.last(), Some(&Some("custom".to_string())));
    let alive = plugin
        .main_thread()
        .call(move |world| !world.player(uuid).unwrap().is_dead())
        .await
        .unwrap();
    assert!(alive);
}

#[tokio::test]
async fn test_respawn_without_custom_skin_refreshes_nothing() {
    let plugin = enable().await;
    let (uuid, mut rx) = join(&plugin, "Alice").await;

    assert!(!plugin.listener().on_respawn(uuid).await.unwrap());
    settle(&plugin).await;
    assert_eq!(respawns(&drain(&mut rx)), 0);

    assert!(!plugin.listener().on_respawn(PlayerUuid::random()).await.unwrap());
}

// =========================================================================
// set_skin
// =========================================================================

#[tokio::test]
async fn test_set_skin_updates_storage_registry_and_profile() {
    let plugin = enable().await;
    let (uuid, mut rx) = join(&plugin, "Alice").await;
    let skin = Skin::new("custom", "custom-sig");

    plugin.api().set_custom_skin(uuid, skin.clone()).await.unwrap();
    settle(&plugin).await;

    assert_eq!(stored(&plugin, uuid).custom_skin, Some(skin.clone()));
    assert_eq!(tracked_skin(&plugin, uuid).await, Some(skin.clone()));
    assert_eq!(live_skin(&plugin, uuid).await, Some(skin));
    assert_eq!(respawns(&drain(&mut rx)), 1);
}

#[tokio::test]
async fn test_set_skin_untracked_player_is_not_online() {
    let plugin = enable().await;
    let result = plugin.api().set_skin(PlayerUuid::random(), Skin::new("v", "s")).await;
    assert!(matches!(result, Err(SkinsError::NotOnline(_))));
}

#[tokio::test]
async fn test_consecutive_set_skin_last_write_wins() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    for n in 0..5 {
        plugin
            .api()
            .set_skin(uuid, Skin::new(format!("v{n}"), "s"))
            .await
            .unwrap();
    }
    settle(&plugin).await;

    let last = Some(Skin::new("v4", "s"));
    assert_eq!(stored(&plugin, uuid).custom_skin, last);
    assert_eq!(tracked_skin(&plugin, uuid).await, last);
    assert_eq!(live_skin(&plugin, uuid).await, last);
}

#[tokio::test]
async fn test_racing_set_skin_storage_registry_and_profile_agree() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    let mut tasks = Vec::new();
    for n in 0..10 {
        let api = plugin.api().clone();
        tasks.push(tokio::spawn(async move {
            api.set_skin(uuid, Skin::new(format!("v{n}"), "s")).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    settle(&plugin).await;

    let tracked = tracked_skin(&plugin, uuid).await;
    assert!(tracked.is_some());
    assert_eq!(stored(&plugin, uuid).custom_skin, tracked);
    assert_eq!(live_skin(&plugin, uuid).await, tracked);
}

#[tokio::test]
async fn test_concurrent_set_skin_two_players_independent() {
    let plugin = enable().await;
    let (alice, _a) = join(&plugin, "Alice").await;
    let (bob, _b) = join(&plugin, "Bob").await;
    let api = plugin.api();

    let (ra, rb) = tokio::join!(
        api.set_skin(alice, Skin::new("alice-skin", "a")),
        api.set_skin(bob, Skin::new("bob-skin", "b")),
    );
    ra.unwrap();
    rb.unwrap();
    settle(&plugin).await;

    assert_eq!(live_skin(&plugin, alice).await, Some(Skin::new("alice-skin", "a")));
    assert_eq!(live_skin(&plugin, bob).await, Some(Skin::new("bob-skin", "b")));
    assert_eq!(stored(&plugin, alice).custom_skin, Some(Skin::new("alice-skin", "a")));
    assert_eq!(stored(&plugin, bob).custom_skin, Some(Skin::new("bob-skin", "b")));
}

// =========================================================================
// reset_skin
// =========================================================================

#[tokio::test]
async fn test_reset_skin_restores_login_skin() {
    let plugin = enable().await;
    let (uuid, mut rx) = join(&plugin, "Alice").await;
    plugin.api().set_skin(uuid, Skin::new("custom", "s")).await.unwrap();
    settle(&plugin).await;
    drain(&mut rx);

    plugin.api().reset_skin(uuid).await.unwrap();
    settle(&plugin).await;

    assert_eq!(live_skin(&plugin, uuid).await, Some(login_skin()));
    assert_eq!(stored(&plugin, uuid).custom_skin, None);
    assert_eq!(tracked_skin(&plugin, uuid).await, None);
    assert_eq!(respawns(&drain(&mut rx)), 1);
}

#[tokio::test]
async fn test_reset_skin_twice_second_is_noop() {
    let plugin = enable().await;
    let (uuid, mut rx) = join(&plugin, "Alice").await;
    plugin.api().set_skin(uuid, Skin::new("custom", "s")).await.unwrap();
    plugin.api().reset_skin(uuid).await.unwrap();
    settle(&plugin).await;
    drain(&mut rx);

    plugin.api().reset_skin(uuid).await.unwrap();
    settle(&plugin).await;

    assert!(drain(&mut rx).is_empty());
    assert_eq!(live_skin(&plugin, uuid).await, Some(login_skin()));
    assert_eq!(stored(&plugin, uuid).custom_skin, None);
}

#[tokio::test]
async fn test_reset_without_custom_skin_sends_nothing() {
    let plugin = enable().await;
    let (uuid, mut rx) = join(&plugin, "Alice").await;

    plugin.api().reset_skin(uuid).await.unwrap();
    settle(&plugin).await;

    assert!(drain(&mut rx).is_empty());
}

// =========================================================================
// Name and image sources
// =========================================================================

#[tokio::test]
async fn test_set_skin_from_name_copies_account_skin() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    plugin.api().set_skin_from_name(uuid, "notch").await.unwrap();
    settle(&plugin).await;

    assert_eq!(live_skin(&plugin, uuid).await, Some(Skin::new("notch-value", "notch-sig")));
}

#[tokio::test]
async fn test_set_skin_from_name_unknown_is_skin_not_found() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    let result = plugin.api().set_skin_from_name(uuid, "nobody").await;
    assert!(matches!(result, Err(SkinsError::SkinNotFound(_))));
    assert_eq!(tracked_skin(&plugin, uuid).await, None);
}

#[tokio::test]
async fn test_set_skin_from_image_caches_result() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    plugin
        .api()
        .set_skin_from_image(uuid, "https://i.example/a.png", SkinModel::Alex)
        .await
        .unwrap();
    settle(&plugin).await;

    assert_eq!(plugin.api().hashes().len(), 1);
    assert_eq!(live_skin(&plugin, uuid).await, Some(Skin::new("img", "img-sig")));
}

// =========================================================================
// Startup
// =========================================================================

#[tokio::test]
async fn test_enable_unsupported_revision_fails() {
    let world = World::new("org.bukkit.craftbukkit.v1_8_R3");
    let result = SkinsPlugin::builder(config()).enable(world).await;
    assert!(matches!(result, Err(SkinsError::UnsupportedProtocolVersion(_))));
}

#[tokio::test]
async fn test_enable_forced_revision_overrides_package() {
    let world = World::new("org.bukkit.craftbukkit.v1_8_R3");
    let config = SkinsConfig {
        protocol_version: Some("v1_15_R1".into()),
        ..config()
    };
    let plugin = SkinsPlugin::builder(config).enable(world).await.unwrap();
    assert_eq!(plugin.api().adapter().revision(), "v1_15_R1");
}

#[tokio::test]
async fn test_enable_unwritable_storage_fails() {
    let blocker = std::env::temp_dir().join(format!("skinforge-blocker-{}", PlayerUuid::random()));
    tokio::fs::write(&blocker, b"not a directory").await.unwrap();
    let config = SkinsConfig {
        database: DatabaseConfig::File {
            path: blocker.clone(),
        },
        ..config()
    };

    let result = SkinsPlugin::builder(config).enable(world()).await;
    assert!(matches!(result, Err(SkinsError::StorageUnavailable(_))));
    tokio::fs::remove_file(blocker).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_returns_world() {
    let plugin = enable().await;
    let (uuid, _rx) = join(&plugin, "Alice").await;

    let world = plugin.shutdown().await.unwrap();
    assert!(world.is_online(uuid));
}
