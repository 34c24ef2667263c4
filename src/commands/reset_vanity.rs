use anyhow::Result;
use twilight_model::id::{Id, marker::ChannelMarker};

use crate::{commands::reply, core::app_state::AppState};

pub async fn run(state: AppState, channel: Id<ChannelMarker>, arg: Option<&str>) -> Result<()> {
    let Some(arg) = arg else {
        return reply(&state, channel, "Usage: `!resetvanity <name | all>`").await;
    };

    if arg == "all" {
        state.vanity.reset_all();
        return reply(&state, channel, "✅ All vanity monitors reset.").await;
    }

    if state.vanity.reset(arg) {
        reply(&state, channel, &format!("✅ Vanity **{arg}** reset.")).await
    } else {
        reply(&state, channel, "❌ Vanity not found.").await
    }
}
