use anyhow::Result;
use twilight_model::{
    channel::message::embed::EmbedField,
    id::{Id, marker::ChannelMarker},
};
use twilight_util::builder::embed::EmbedBuilder;

use crate::{consts, core::app_state::AppState};

pub async fn run(state: AppState, channel: Id<ChannelMarker>) -> Result<()> {
    let stats = state.engine.stats().await?;
    let uptime_minutes = state.started_at.elapsed().as_secs() / 60;

    let embed = EmbedBuilder::new()
        .title("Bot Statistics")
        .field(EmbedField {
            inline: true,
            name: "Source Server".to_string(),
            value: format!(
                "Members: {}\nBoosters: {}",
                stats.source_total, stats.boosters
            ),
        })
        .field(EmbedField {
            inline: true,
            name: "Target Server".to_string(),
            value: format!(
                "Members: {}\nWith Access: {}\nWith Denied: {}",
                stats.target_total, stats.with_access, stats.with_denied
            ),
        })
        .field(EmbedField {
            inline: true,
            name: "Bot Uptime".to_string(),
            value: format!("{uptime_minutes} minutes"),
        })
        .color(consts::colors::INFO_COLOR)
        .build();

    state
        .http
        .create_message(channel)
        .embeds(&[embed])
        .await?;
    Ok(())
}
