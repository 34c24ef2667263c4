use tracing::{error, info};

use crate::{consts, core::app_state::AppState};

pub fn run(state: AppState) {
    tokio::spawn(clear_recent_boosters(state.clone()));
    tokio::spawn(watch_vanities(state.clone()));
    tokio::spawn(periodic_sweep(state));
}

/// Drops the whole debounce set every window; entries never expire one by one.
async fn clear_recent_boosters(state: AppState) {
    loop {
        tokio::time::sleep(consts::RECENT_BOOSTER_TTL).await;
        let entries = state.engine.recent.clear_all();
        info!(entries, "cleared recent boosters cache");
    }
}

async fn watch_vanities(state: AppState) {
    loop {
        tokio::time::sleep(consts::VANITY_CHECK_INTERVAL).await;
        state
            .vanity
            .tick(&state.adapter, &state.adapter, state.config.owner_id)
            .await;
    }
}

/// Convergence backstop catching anything the event-driven paths missed.
async fn periodic_sweep(state: AppState) {
    loop {
        tokio::time::sleep(consts::FULL_SWEEP_INTERVAL).await;
        info!("Running scheduled sweep of all members...");
        if let Err(err) = state.engine.reconcile_all().await {
            error!(%err, "scheduled sweep failed");
        }
    }
}
