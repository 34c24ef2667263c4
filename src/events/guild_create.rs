use anyhow::Result;
use twilight_model::gateway::payload::incoming::GuildCreate;

use crate::core::{adapter::snapshot, app_state::AppState};

pub fn handle(state: AppState, guild_create: Box<GuildCreate>) -> Result<()> {
    let GuildCreate::Available(guild) = *guild_create else {
        return Ok(());
    };

    if guild.id != state.config.bridge.source_guild {
        return Ok(());
    }

    // Seed the booster cache from the initial member list.
    let boosters = guild
        .members
        .iter()
        .map(snapshot)
        .filter(|member| state.engine.source_is_boosting(member))
        .map(|member| member.user_id)
        .collect();

    *state.cache.boosters.lock().unwrap() = boosters;

    Ok(())
}
