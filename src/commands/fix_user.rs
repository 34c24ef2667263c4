use std::fmt::Write;

use anyhow::Result;
use twilight_mention::ParseMention;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};

use crate::{
    commands::reply,
    core::{app_state::AppState, engine::AccessState},
};

pub async fn run(state: AppState, channel: Id<ChannelMarker>, arg: Option<&str>) -> Result<()> {
    let user_id = arg.and_then(parse_user);
    let Some(user_id) = user_id else {
        return reply(&state, channel, "Usage: `!fixuser <userid|@mention>`").await;
    };

    let outcome = state.engine.reconcile_one(user_id).await;

    let mut response = format!("**Fixed roles for <@{user_id}>**\n");
    let _ = writeln!(
        &mut response,
        "Custom role: {}",
        if outcome.custom_role {
            "✅ Present"
        } else {
            "❌ Absent"
        }
    );
    let _ = write!(
        &mut response,
        "Target access: {}",
        match outcome.access {
            AccessState::Granted => "✅ Granted",
            AccessState::Denied => "❌ Denied",
            AccessState::Unset => "⚠️ Not in target server",
        }
    );

    reply(&state, channel, &response).await
}

fn parse_user(arg: &str) -> Option<Id<UserMarker>> {
    arg.parse()
        .ok()
        .or_else(|| Id::<UserMarker>::parse(arg).ok())
}
