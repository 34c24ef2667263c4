pub mod check_all;
pub mod fix_user;
pub mod reset_vanity;
pub mod stats;

use anyhow::Result;
use twilight_model::id::{Id, marker::ChannelMarker};

use crate::core::app_state::AppState;

pub async fn reply(state: &AppState, channel: Id<ChannelMarker>, text: &str) -> Result<()> {
    state.http.create_message(channel).content(text).await?;
    Ok(())
}
