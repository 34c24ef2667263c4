use std::time::Duration;

/// Grace period after a target-guild join before the source guild is queried,
/// so a boost applied moments before the join has time to propagate.
pub const JOIN_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Wait before acting on a lost boost, in case the member re-boosts right away
/// (subscription renewal jitter).
pub const DOWNGRADE_DELAY: Duration = Duration::from_secs(30);

/// The recent-booster set is cleared wholesale on this period, never per entry.
pub const RECENT_BOOSTER_TTL: Duration = Duration::from_secs(10 * 60);

/// Convergence backstop: full sweep of the target guild.
pub const FULL_SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Pause between members during a sweep, to stay under rate limits.
pub const SWEEP_PACE: Duration = Duration::from_millis(100);

pub const VANITY_CHECK_INTERVAL: Duration = Duration::from_secs(30);
pub const VANITY_MISS_THRESHOLD: u32 = 5;

pub const FETCH_ATTEMPTS: u32 = 3;
pub const FETCH_BACKOFF_STEP: Duration = Duration::from_millis(500);

pub mod command {
    pub const CHECK_ALL: &str = "checkall";
    pub const FIX_USER: &str = "fixuser";
    pub const RESET_VANITY: &str = "resetvanity";
    pub const STATS: &str = "stats";
}

pub mod colors {
    pub const OK_COLOR: u32 = 0x00ff00;
    pub const WARN_COLOR: u32 = 0xff9900;
    pub const INFO_COLOR: u32 = 0x0099ff;
}
