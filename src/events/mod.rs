mod guild_create;
mod member_add;
mod member_chunk;
mod member_update;
mod message_create;
mod ready;

use anyhow::Result;
use twilight_gateway::Event;

use crate::core::app_state::AppState;

pub async fn event_handler(state: AppState, event: Event) -> Result<()> {
    match event {
        Event::Ready(ready) => ready::handle(state, ready).await,
        Event::GuildCreate(guild_create) => guild_create::handle(state, guild_create),
        Event::MemberChunk(member_chunk) => member_chunk::handle(state, member_chunk),
        Event::MemberAdd(member_add) => member_add::handle(state, member_add).await,
        Event::MemberUpdate(member_update) => member_update::handle(state, member_update).await,
        Event::MessageCreate(msg) => message_create::handle(state, msg).await,
        _ => Ok(()), // Ignore other events
    }
}
