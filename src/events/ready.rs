use anyhow::Result;
use tracing::info;
use twilight_model::gateway::payload::incoming::Ready;

use crate::core::app_state::AppState;

pub async fn handle(state: AppState, ready: Box<Ready>) -> Result<()> {
    info!("{} is ready!", ready.user.name);

    // Startup convergence pass; events from here on only keep it current.
    info!("Running initial member sweep...");
    state.engine.reconcile_all().await?;
    Ok(())
}
