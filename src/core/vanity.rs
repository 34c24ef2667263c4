use std::{collections::BTreeMap, sync::Mutex};

use chrono::Utc;
use tracing::{debug, error, info};
use twilight_model::id::{Id, marker::UserMarker};

use crate::{
    consts,
    core::adapter::{InviteLookup, LookupStatus, Notify},
};

#[derive(Debug, Default, Clone, Copy)]
struct VanityState {
    misses: u32,
    notified: bool,
}

/// Watches a fixed set of vanity invite codes for availability. A code is
/// considered available after a streak of consecutive not-found lookups; one
/// direct message is sent and the code stays muted until explicitly reset.
/// Lookup errors leave the streak untouched so a flaky connection cannot
/// produce a false alarm.
#[derive(Debug)]
pub struct VanityMonitor {
    states: Mutex<BTreeMap<String, VanityState>>,
}

impl VanityMonitor {
    pub fn new(codes: impl IntoIterator<Item = String>) -> VanityMonitor {
        VanityMonitor {
            states: Mutex::new(
                codes
                    .into_iter()
                    .map(|code| (code, VanityState::default()))
                    .collect(),
            ),
        }
    }

    /// One polling round over every code not yet notified.
    pub async fn tick<L: InviteLookup, N: Notify>(
        &self,
        lookup: &L,
        notify: &N,
        recipient: Id<UserMarker>,
    ) {
        let pending: Vec<String> = self
            .states
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, state)| !state.notified)
            .map(|(code, _)| code.clone())
            .collect();

        for code in pending {
            let status = match lookup.lookup_invite(&code).await {
                Ok(status) => status,
                Err(err) => {
                    debug!(code, %err, "invite lookup failed, keeping streak");
                    continue;
                }
            };

            let fire = {
                let mut states = self.states.lock().unwrap();
                let Some(state) = states.get_mut(&code) else {
                    continue;
                };
                match status {
                    LookupStatus::Found => {
                        state.misses = 0;
                        false
                    }
                    LookupStatus::NotFound => {
                        state.misses += 1;
                        if state.misses >= consts::VANITY_MISS_THRESHOLD && !state.notified {
                            state.notified = true;
                            true
                        } else {
                            false
                        }
                    }
                }
            };

            if fire {
                info!(code, "vanity became available");
                let text = format!(
                    "🚨 **VANITY AVAILABLE** 🚨\n\n\
                     Vanity: **discord.gg/{code}**\n\
                     Time: **{}**",
                    Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
                );
                if let Err(err) = notify.direct_message(recipient, &text).await {
                    error!(code, %err, "failed to deliver vanity notification");
                }
            }
        }
    }

    /// Administrative reset of one code. Returns false for a code that was
    /// never monitored.
    pub fn reset(&self, code: &str) -> bool {
        let mut states = self.states.lock().unwrap();
        match states.get_mut(code) {
            Some(state) => {
                *state = VanityState::default();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&self) {
        let mut states = self.states.lock().unwrap();
        for state in states.values_mut() {
            *state = VanityState::default();
        }
    }
}
