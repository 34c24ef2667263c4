use anyhow::Result;
use twilight_model::gateway::payload::incoming::MemberChunk;

use crate::core::{adapter::snapshot, app_state::AppState};

pub fn handle(state: AppState, member_chunk: MemberChunk) -> Result<()> {
    if member_chunk.guild_id != state.config.bridge.source_guild {
        return Ok(());
    }

    let mut boosters = state.cache.boosters.lock().unwrap();

    member_chunk
        .members
        .iter()
        .map(snapshot)
        .filter(|member| state.engine.source_is_boosting(member))
        .for_each(|member| {
            boosters.insert(member.user_id);
        });

    Ok(())
}
