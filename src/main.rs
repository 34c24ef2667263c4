mod background;
mod commands;
mod consts;
mod core;
mod events;

use anyhow::Result;
use tracing::{error, info};
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt};

use crate::core::{app_state::AppState, config::EnvConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv()?;
    tracing_subscriber::fmt::init();

    info!("Load Config...");
    let config = EnvConfig::from_env()?;

    let app = AppState::new(config);
    let intents = Intents::GUILDS
        | Intents::GUILD_MEMBERS
        | Intents::GUILD_MESSAGES
        | Intents::MESSAGE_CONTENT
        | Intents::DIRECT_MESSAGES;
    let mut shard = Shard::new(ShardId::ONE, app.config.discord_token.clone(), intents);
    let wanted_event_types = EventTypeFlags::READY
        | EventTypeFlags::GUILD_CREATE
        | EventTypeFlags::MEMBER_ADD
        | EventTypeFlags::MEMBER_UPDATE
        | EventTypeFlags::MEMBER_CHUNK
        | EventTypeFlags::MESSAGE_CREATE;

    background::run(app.clone());

    while let Some(item) = shard.next_event(wanted_event_types).await {
        let Ok(event) = item else {
            error!(source = ?item.unwrap_err(), "Error receiving event");
            continue;
        };

        let app = app.clone();
        tokio::spawn(async move {
            let Err(err) = events::event_handler(app, event).await else {
                return;
            };
            error!(?err, "Error handling event");
        });
    }

    Ok(())
}
