//! A backend and a proxy in one process.
//!
//! The backend enables Skinforge with the relay on a random local port and
//! lets two players join. The proxy connects to the relay and changes one
//! player's skin; the other player sees the refresh packets arrive.
//!
//! Run with `RUST_LOG=debug` for the full packet-level story.

use std::time::Duration;

use skinforge::prelude::*;
use skinforge::{RelayConfig, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("skinforge=info,relay_demo=info");

    let mut world = World::new("org.bukkit.craftbukkit.v1_16_R1");
    world.add_level(LevelInfo::new("world", Dimension::Overworld));

    let config = SkinsConfig {
        relay: RelayConfig {
            bind: Some("127.0.0.1:0".into()),
        },
        ..SkinsConfig::default()
    };
    let plugin = SkinsPlugin::builder(config)
        .source(StaticSkinSource::new().with_name("Notch", Skin::new("bm90Y2g=", "c2ln")))
        .enable(world)
        .await?;
    let addr = plugin.relay_addr().ok_or("relay did not bind")?;

    let alice = plugin
        .listener()
        .on_join(JoinRequest::new(PlayerUuid::random(), "Alice"))
        .await?;
    let mut bob = plugin
        .listener()
        .on_join(JoinRequest::new(PlayerUuid::random(), "Bob"))
        .await?;
    alice.skin_load.await?;
    bob.skin_load.await?;
    while bob.packets.try_recv().is_ok() {}

    let proxy = ProxyMessenger::connect(&addr.to_string()).await?;
    proxy.set_skin_from_name("Alice", "Notch").await?;

    let mut seen = Vec::new();
    while let Ok(Some(packet)) =
        tokio::time::timeout(Duration::from_millis(500), bob.packets.recv()).await
    {
        seen.push(packet.kind());
    }
    tracing::info!(packets = ?seen, "Bob saw Alice's skin change");

    proxy.close().await?;
    plugin.shutdown().await?;
    Ok(())
}
