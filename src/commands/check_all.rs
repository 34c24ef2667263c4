use anyhow::Result;
use tracing::info;
use twilight_model::{
    channel::message::embed::EmbedField,
    id::{Id, marker::ChannelMarker},
};
use twilight_util::builder::embed::EmbedBuilder;

use crate::{commands::reply, consts, core::app_state::AppState};

pub async fn run(state: AppState, channel: Id<ChannelMarker>) -> Result<()> {
    info!("owner requested a full member sweep");
    reply(
        &state,
        channel,
        "🔍 Checking ALL members in the target server... This may take a minute.",
    )
    .await?;

    let report = state.engine.reconcile_all().await?;

    let color = if report.errors > 0 {
        consts::colors::WARN_COLOR
    } else {
        consts::colors::OK_COLOR
    };
    let description = if report.updated > 0 {
        format!("Fixed role assignments for {} members", report.updated)
    } else {
        "All roles are already correct!".to_string()
    };

    let count_field = |name: &str, value: usize| EmbedField {
        inline: true,
        name: name.to_string(),
        value: value.to_string(),
    };
    let embed = EmbedBuilder::new()
        .title("Member Check Complete")
        .description(description)
        .field(count_field("Total Members", report.total))
        .field(count_field("Updated", report.updated))
        .field(count_field("Errors", report.errors))
        .color(color)
        .build();

    state
        .http
        .create_message(channel)
        .embeds(&[embed])
        .await?;
    Ok(())
}
