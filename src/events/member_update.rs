use anyhow::Result;
use tracing::{info, warn};
use twilight_model::gateway::payload::incoming::MemberUpdate;

use crate::core::{adapter::MemberSnapshot, app_state::AppState};

/// Attribute change in the source guild. The gateway only carries the new
/// member state, so the old boost status comes from the booster cache;
/// updates that leave the status unchanged are dropped early.
pub async fn handle(state: AppState, member_update: Box<MemberUpdate>) -> Result<()> {
    if member_update.guild_id != state.config.bridge.source_guild {
        return Ok(());
    }

    let user_id = member_update.user.id;
    let member = MemberSnapshot {
        user_id,
        display_name: member_update
            .nick
            .clone()
            .unwrap_or_else(|| member_update.user.name.clone()),
        bot: member_update.user.bot,
        premium: member_update.premium_since.is_some(),
        roles: member_update.roles.clone(),
    };
    let now_boosting = state.engine.source_is_boosting(&member);

    let was_boosting = {
        let mut boosters = state.cache.boosters.lock().unwrap();
        let was = boosters.contains(&user_id);
        if now_boosting {
            boosters.insert(user_id);
        } else {
            boosters.remove(&user_id);
        }
        was
    };

    if was_boosting == now_boosting {
        return Ok(());
    }

    info!(
        name = %member.display_name,
        was_boosting,
        now_boosting,
        "boost status changed"
    );

    if now_boosting {
        state.engine.recent.mark(user_id);
        if let Err(err) = state.engine.grant_custom_role(user_id).await {
            warn!(%user_id, %err, "failed to give custom booster role");
        }
        state.engine.set_target_access(user_id, true).await?;
    } else {
        // The downgrade waits out a grace window and re-checks status itself,
        // so a quick re-boost aborts it without explicit cancellation.
        let state = state.clone();
        tokio::spawn(async move {
            state.engine.delayed_downgrade(user_id).await;
        });
    }

    Ok(())
}
