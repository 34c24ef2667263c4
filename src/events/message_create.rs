use anyhow::Result;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::{commands, consts::command, core::app_state::AppState};

/// Owner-only prefix commands, the administrative surface over the engine.
pub async fn handle(state: AppState, msg: Box<MessageCreate>) -> Result<()> {
    if msg.author.id != state.config.owner_id || msg.author.bot {
        return Ok(());
    }
    let Some(body) = msg.content.strip_prefix('!') else {
        return Ok(());
    };

    let mut args = body.split_whitespace();
    let Some(name) = args.next() else {
        return Ok(());
    };

    match name.to_lowercase().as_str() {
        command::CHECK_ALL => commands::check_all::run(state, msg.channel_id).await,
        command::FIX_USER => commands::fix_user::run(state, msg.channel_id, args.next()).await,
        command::RESET_VANITY => {
            commands::reset_vanity::run(state, msg.channel_id, args.next()).await
        }
        command::STATS => commands::stats::run(state, msg.channel_id).await,
        _ => Ok(()),
    }
}
