use anyhow::Result;
use tracing::{error, info};
use twilight_model::gateway::payload::incoming::MemberAdd;

use crate::{consts, core::app_state::AppState};

/// A member joined the target guild: wait for upstream boost state to settle,
/// then grant or deny based on their source-guild status. Any failure on this
/// path fails closed by attaching the denied role directly, so nobody is left
/// unmanaged.
pub async fn handle(state: AppState, member_add: Box<MemberAdd>) -> Result<()> {
    if member_add.guild_id != state.config.bridge.target_guild {
        return Ok(());
    }

    let user_id = member_add.member.user.id;
    let name = member_add.member.user.name.clone();
    info!(%name, "member joined the target guild");

    tokio::time::sleep(consts::JOIN_SETTLE_DELAY).await;

    let result: Result<()> = async {
        let source = state.engine.fetch_source(user_id).await;

        if source
            .as_ref()
            .is_some_and(|member| state.engine.source_is_boosting(member))
        {
            info!(%name, "joined while boosting, granting access");
            state.engine.recent.mark(user_id);
            state.engine.set_target_access(user_id, true).await?;
            state.engine.grant_custom_role(user_id).await?;
        } else {
            info!(%name, "joined without boosting, denying access");
            state.engine.set_target_access(user_id, false).await?;
        }

        Ok(())
    }
    .await;

    if let Err(err) = result {
        error!(%name, %err, "join handling failed, denying access outright");
        state.engine.deny_unmanaged(user_id).await?;
    }

    Ok(())
}
