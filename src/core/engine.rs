use tracing::{debug, info, warn};
use twilight_model::id::{
    Id,
    marker::{RoleMarker, UserMarker},
};

use crate::{
    consts,
    core::{
        adapter::{Directory, DirectoryError, MemberSnapshot, fetch_member_with_retry},
        config::BridgeConfig,
        recent::RecentBoosterCache,
    },
};

/// True when the member counts as boosting in the source guild: either the
/// native booster role or an active premium subscription.
pub fn is_boosting(member: &MemberSnapshot, cfg: &BridgeConfig) -> bool {
    member.premium || member.has_role(cfg.booster_role)
}

/// Derived access standing in the target guild. The access and denied roles
/// are mutually exclusive in steady state; any other combination reads as
/// `Unset` and gets corrected on the next reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessState {
    Granted,
    Denied,
    #[default]
    Unset,
}

impl AccessState {
    pub fn derive(member: Option<&MemberSnapshot>, cfg: &BridgeConfig) -> AccessState {
        let Some(member) = member else {
            return AccessState::Unset;
        };
        match (
            member.has_role(cfg.access_role),
            member.has_role(cfg.denied_role),
        ) {
            (true, false) => AccessState::Granted,
            (false, true) => AccessState::Denied,
            _ => AccessState::Unset,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemberOutcome {
    /// Whether the member ends up holding the custom booster role.
    pub custom_role: bool,
    pub access: AccessState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Target-guild member count, bots included.
    pub total: usize,
    /// Members whose roles actually changed.
    pub updated: usize,
    /// Members whose processing failed.
    pub errors: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BridgeStats {
    pub source_total: usize,
    pub boosters: usize,
    pub target_total: usize,
    pub with_access: usize,
    pub with_denied: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct SyncOutcome {
    custom_role: bool,
    access: AccessState,
    changed: bool,
    failed: bool,
}

/// Converges target-guild access roles onto source-guild boost status.
/// All role mutations are idempotent and checked against current state
/// first, so overlapping invocations for the same member are safe.
#[derive(Debug)]
pub struct Engine<D> {
    dir: D,
    cfg: BridgeConfig,
    pub recent: RecentBoosterCache,
    sweep_lock: tokio::sync::Mutex<()>,
}

impl<D: Directory> Engine<D> {
    pub fn new(dir: D, cfg: BridgeConfig) -> Engine<D> {
        Engine {
            dir,
            cfg,
            recent: RecentBoosterCache::default(),
            sweep_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn fetch_source(&self, user: Id<UserMarker>) -> Option<MemberSnapshot> {
        fetch_member_with_retry(&self.dir, self.cfg.source_guild, user).await
    }

    pub fn source_is_boosting(&self, member: &MemberSnapshot) -> bool {
        is_boosting(member, &self.cfg)
    }

    /// Reconcile a single member, best effort. Never fails: an unreachable
    /// member reads as not boosting, and individual mutation failures are
    /// logged and skipped.
    pub async fn reconcile_one(&self, user: Id<UserMarker>) -> MemberOutcome {
        let target = fetch_member_with_retry(&self.dir, self.cfg.target_guild, user).await;
        let outcome = self.sync_member(user, target.as_ref()).await;
        MemberOutcome {
            custom_role: outcome.custom_role,
            access: outcome.access,
        }
    }

    /// Walk every member of the target guild and converge each one onto its
    /// source status. Members absent from the source guild (and not recently
    /// granted) are forced to denied. Source-only members are out of scope;
    /// target membership is the iteration boundary.
    pub async fn reconcile_all(&self) -> Result<SweepReport, DirectoryError> {
        let _guard = self.sweep_lock.lock().await;

        info!("starting sweep of the target guild");
        let members = self.dir.list_members(self.cfg.target_guild).await?;
        let total = members.len();
        let mut updated = 0;
        let mut errors = 0;

        for member in &members {
            if member.bot {
                continue;
            }

            let outcome = self.sync_member(member.user_id, Some(member)).await;
            if outcome.changed {
                updated += 1;
            }
            if outcome.failed {
                errors += 1;
            }

            tokio::time::sleep(consts::SWEEP_PACE).await;
        }

        info!(total, updated, errors, "sweep complete");
        Ok(SweepReport {
            total,
            updated,
            errors,
        })
    }

    /// Shared decision path for `reconcile_one` and the sweep. `target` is
    /// the member's current target-guild state, or `None` when they have no
    /// target presence (in which case only the custom role is managed).
    async fn sync_member(
        &self,
        user: Id<UserMarker>,
        target: Option<&MemberSnapshot>,
    ) -> SyncOutcome {
        let source = fetch_member_with_retry(&self.dir, self.cfg.source_guild, user).await;
        let boosting = source
            .as_ref()
            .is_some_and(|member| is_boosting(member, &self.cfg));

        let mut outcome = SyncOutcome {
            custom_role: boosting,
            access: AccessState::derive(target, &self.cfg),
            ..Default::default()
        };

        if boosting {
            if let Some(member) = &source {
                self.ensure_custom_role(member, true, &mut outcome).await;
            }
            self.recent.mark(user);

            if let Some(member) = target {
                if !member.has_role(self.cfg.access_role) {
                    match self
                        .dir
                        .add_role(self.cfg.target_guild, user, self.cfg.access_role)
                        .await
                    {
                        Ok(()) => {
                            info!(name = %member.display_name, "granted access");
                            outcome.changed = true;
                        }
                        Err(err) => {
                            warn!(name = %member.display_name, %err, "failed to grant access");
                            outcome.failed = true;
                        }
                    }
                }
                if member.has_role(self.cfg.denied_role) {
                    outcome.changed |= self
                        .remove_role_best_effort(user, self.cfg.denied_role)
                        .await;
                }
                outcome.access = AccessState::Granted;
            }
        } else if !self.recent.contains(user) {
            if let Some(member) = &source {
                self.ensure_custom_role(member, false, &mut outcome).await;
            }

            if let Some(member) = target {
                if member.has_role(self.cfg.access_role) {
                    outcome.changed |= self
                        .remove_role_best_effort(user, self.cfg.access_role)
                        .await;
                }
                if !member.has_role(self.cfg.denied_role) {
                    match self
                        .dir
                        .add_role(self.cfg.target_guild, user, self.cfg.denied_role)
                        .await
                    {
                        Ok(()) => {
                            info!(name = %member.display_name, "denied access");
                            outcome.changed = true;
                        }
                        Err(err) => {
                            warn!(name = %member.display_name, %err, "failed to deny access");
                            outcome.failed = true;
                        }
                    }
                }
                outcome.access = AccessState::Denied;
            }
        } else {
            debug!(%user, "recently granted, skipping downgrade");
        }

        outcome
    }

    async fn ensure_custom_role(
        &self,
        member: &MemberSnapshot,
        wanted: bool,
        outcome: &mut SyncOutcome,
    ) {
        if member.has_role(self.cfg.custom_role) == wanted {
            return;
        }

        let result = if wanted {
            self.dir
                .add_role(self.cfg.source_guild, member.user_id, self.cfg.custom_role)
                .await
        } else {
            self.dir
                .remove_role(self.cfg.source_guild, member.user_id, self.cfg.custom_role)
                .await
        };

        match result {
            Ok(()) => {
                info!(
                    name = %member.display_name,
                    wanted,
                    "updated custom booster role"
                );
                outcome.changed = true;
            }
            Err(err) => {
                warn!(name = %member.display_name, %err, "custom booster role update failed");
            }
        }
    }

    /// Removal whose failure is discarded by design; the next sweep will
    /// retry it.
    async fn remove_role_best_effort(
        &self,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> bool {
        match self.dir.remove_role(self.cfg.target_guild, user, role).await {
            Ok(()) => true,
            Err(err) => {
                debug!(%user, %role, %err, "role removal failed, leaving for next sweep");
                false
            }
        }
    }

    /// Grant or withdraw target access for one member, used by the event
    /// handlers. A withdrawal is suppressed while the member is in the
    /// recent-booster cache. Returns the resulting state; fails only when a
    /// required role add fails, so callers can fail closed.
    pub async fn set_target_access(
        &self,
        user: Id<UserMarker>,
        grant: bool,
    ) -> Result<AccessState, DirectoryError> {
        let target = fetch_member_with_retry(&self.dir, self.cfg.target_guild, user).await;
        let Some(member) = target else {
            debug!(%user, "not in the target guild, nothing to update");
            return Ok(AccessState::Unset);
        };

        if grant {
            if !member.has_role(self.cfg.access_role) {
                self.dir
                    .add_role(self.cfg.target_guild, user, self.cfg.access_role)
                    .await?;
            }
            if member.has_role(self.cfg.denied_role) {
                self.remove_role_best_effort(user, self.cfg.denied_role)
                    .await;
            }
            self.recent.mark(user);
            info!(name = %member.display_name, "granted access");
            Ok(AccessState::Granted)
        } else {
            if self.recent.contains(user) {
                debug!(name = %member.display_name, "recently granted, skipping withdrawal");
                return Ok(AccessState::derive(Some(&member), &self.cfg));
            }
            if member.has_role(self.cfg.access_role) {
                self.remove_role_best_effort(user, self.cfg.access_role)
                    .await;
            }
            if !member.has_role(self.cfg.denied_role) {
                self.dir
                    .add_role(self.cfg.target_guild, user, self.cfg.denied_role)
                    .await?;
            }
            info!(name = %member.display_name, "denied access");
            Ok(AccessState::Denied)
        }
    }

    /// Ensure the custom booster role is present in the source guild.
    /// Returns whether a role was actually added.
    pub async fn grant_custom_role(
        &self,
        user: Id<UserMarker>,
    ) -> Result<bool, DirectoryError> {
        let Some(member) = self.fetch_source(user).await else {
            return Ok(false);
        };
        if member.has_role(self.cfg.custom_role) {
            return Ok(false);
        }
        self.dir
            .add_role(self.cfg.source_guild, user, self.cfg.custom_role)
            .await?;
        info!(name = %member.display_name, "gave custom booster role");
        Ok(true)
    }

    /// Deferred downgrade after a lost boost. Sleeps out the grace window,
    /// re-fetches status, and aborts itself if the member is boosting again
    /// by then; no cancellation handle is needed.
    pub async fn delayed_downgrade(&self, user: Id<UserMarker>) {
        tokio::time::sleep(consts::DOWNGRADE_DELAY).await;

        let source = self.fetch_source(user).await;
        if source
            .as_ref()
            .is_some_and(|member| is_boosting(member, &self.cfg))
        {
            debug!(%user, "boost resumed within the grace window, keeping roles");
            return;
        }

        if let Some(member) = &source
            && member.has_role(self.cfg.custom_role)
        {
            if let Err(err) = self
                .dir
                .remove_role(self.cfg.source_guild, user, self.cfg.custom_role)
                .await
            {
                warn!(%user, %err, "failed to remove custom booster role");
            } else {
                info!(name = %member.display_name, "removed custom booster role");
            }
        }

        if let Err(err) = self.set_target_access(user, false).await {
            warn!(%user, %err, "failed to withdraw access after lost boost");
        }
    }

    /// Fail-closed fallback for a join we could not classify: attach the
    /// denied role directly, bypassing the usual state checks.
    pub async fn deny_unmanaged(&self, user: Id<UserMarker>) -> Result<(), DirectoryError> {
        self.dir
            .add_role(self.cfg.target_guild, user, self.cfg.denied_role)
            .await
    }

    pub async fn stats(&self) -> Result<BridgeStats, DirectoryError> {
        let source = self.dir.list_members(self.cfg.source_guild).await?;
        let target = self.dir.list_members(self.cfg.target_guild).await?;

        Ok(BridgeStats {
            source_total: source.len(),
            boosters: source
                .iter()
                .filter(|member| is_boosting(member, &self.cfg))
                .count(),
            target_total: target.len(),
            with_access: target
                .iter()
                .filter(|member| member.has_role(self.cfg.access_role))
                .count(),
            with_denied: target
                .iter()
                .filter(|member| member.has_role(self.cfg.denied_role))
                .count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{FakeDirectory, test_bridge};
    use twilight_model::id::Id;

    const USER: Id<UserMarker> = Id::new(500);

    fn engine(dir: FakeDirectory) -> Engine<FakeDirectory> {
        Engine::new(dir, test_bridge())
    }

    fn booster_in_both(dir: &FakeDirectory) {
        let cfg = test_bridge();
        dir.insert_member(cfg.source_guild, USER, "mira", false, true, &[]);
        dir.insert_member(cfg.target_guild, USER, "mira", false, false, &[]);
    }

    #[tokio::test(start_paused = true)]
    async fn reconcile_one_is_idempotent() {
        let dir = FakeDirectory::new();
        booster_in_both(&dir);
        let engine = engine(dir);

        let first = engine.reconcile_one(USER).await;
        assert_eq!(first.access, AccessState::Granted);
        assert!(first.custom_role);
        let mutations = engine.dir.mutation_count();
        assert!(mutations > 0);

        let second = engine.reconcile_one(USER).await;
        assert_eq!(second.access, AccessState::Granted);
        assert!(second.custom_role);
        assert_eq!(engine.dir.mutation_count(), mutations);
    }

    #[tokio::test(start_paused = true)]
    async fn boosting_member_converges_from_any_prior_state() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(cfg.source_guild, USER, "mira", false, true, &[]);
        dir.insert_member(
            cfg.target_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.denied_role],
        );
        let engine = engine(dir);

        let outcome = engine.reconcile_one(USER).await;
        assert_eq!(outcome.access, AccessState::Granted);
        assert!(engine.dir.has_role(cfg.source_guild, USER, cfg.custom_role));
        assert!(engine.dir.has_role(cfg.target_guild, USER, cfg.access_role));
        assert!(!engine.dir.has_role(cfg.target_guild, USER, cfg.denied_role));
        assert!(engine.recent.contains(USER));
    }

    #[tokio::test(start_paused = true)]
    async fn lapsed_member_is_denied_and_stripped() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(
            cfg.source_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.custom_role],
        );
        dir.insert_member(
            cfg.target_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.access_role],
        );
        let engine = engine(dir);

        let outcome = engine.reconcile_one(USER).await;
        assert_eq!(outcome.access, AccessState::Denied);
        assert!(!outcome.custom_role);
        assert!(!engine.dir.has_role(cfg.source_guild, USER, cfg.custom_role));
        assert!(!engine.dir.has_role(cfg.target_guild, USER, cfg.access_role));
        assert!(engine.dir.has_role(cfg.target_guild, USER, cfg.denied_role));
    }

    #[tokio::test(start_paused = true)]
    async fn recent_member_is_not_downgraded() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(cfg.source_guild, USER, "mira", false, false, &[]);
        dir.insert_member(
            cfg.target_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.access_role],
        );
        let engine = engine(dir);
        engine.recent.mark(USER);

        let outcome = engine.reconcile_one(USER).await;
        assert_eq!(outcome.access, AccessState::Granted);
        assert_eq!(engine.dir.mutation_count(), 0);
        assert!(engine.dir.has_role(cfg.target_guild, USER, cfg.access_role));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_counts_updates_errors_and_bots() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();

        // Bot: counted in total only.
        dir.insert_member(cfg.target_guild, Id::new(1), "bot", true, false, &[]);
        // Correct already: booster with access in place.
        dir.insert_member(cfg.source_guild, Id::new(2), "ok", false, true, &[cfg.custom_role]);
        dir.insert_member(cfg.target_guild, Id::new(2), "ok", false, false, &[cfg.access_role]);
        // Needs fixing: no source presence, no denied role yet.
        dir.insert_member(cfg.target_guild, Id::new(3), "gone", false, false, &[]);
        // Fails: denied add rejected.
        dir.insert_member(cfg.target_guild, Id::new(4), "walled", false, false, &[]);
        dir.fail_add(cfg.target_guild, Id::new(4), cfg.denied_role);

        let engine = engine(dir);
        let report = engine.reconcile_all().await.unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.updated, 1);
        assert_eq!(report.errors, 1);
        assert!(engine.dir.has_role(cfg.target_guild, Id::new(3), cfg.denied_role));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_forces_denial_for_source_absent_members() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(
            cfg.target_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.access_role],
        );
        let engine = engine(dir);

        let report = engine.reconcile_all().await.unwrap();
        assert_eq!(report.updated, 1);
        assert!(!engine.dir.has_role(cfg.target_guild, USER, cfg.access_role));
        assert!(engine.dir.has_role(cfg.target_guild, USER, cfg.denied_role));
    }

    #[tokio::test(start_paused = true)]
    async fn withdrawal_is_suppressed_while_recent() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(
            cfg.target_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.access_role],
        );
        let engine = engine(dir);
        engine.recent.mark(USER);

        let state = engine.set_target_access(USER, false).await.unwrap();
        assert_eq!(state, AccessState::Granted);
        assert_eq!(engine.dir.mutation_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_boost_downgrades_after_the_grace_window() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(
            cfg.source_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.custom_role],
        );
        dir.insert_member(
            cfg.target_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.access_role],
        );
        let engine = engine(dir);

        engine.delayed_downgrade(USER).await;

        assert!(!engine.dir.has_role(cfg.source_guild, USER, cfg.custom_role));
        assert!(!engine.dir.has_role(cfg.target_guild, USER, cfg.access_role));
        assert!(engine.dir.has_role(cfg.target_guild, USER, cfg.denied_role));
    }

    #[tokio::test(start_paused = true)]
    async fn reboost_within_the_grace_window_aborts_the_downgrade() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(
            cfg.source_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.custom_role],
        );
        dir.insert_member(
            cfg.target_guild,
            USER,
            "mira",
            false,
            false,
            &[cfg.access_role],
        );
        let engine = engine(dir);

        let reboost = async {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            engine.dir.set_premium(cfg.source_guild, USER, true);
        };
        tokio::join!(engine.delayed_downgrade(USER), reboost);

        assert!(engine.dir.has_role(cfg.source_guild, USER, cfg.custom_role));
        assert!(engine.dir.has_role(cfg.target_guild, USER, cfg.access_role));
        assert!(!engine.dir.has_role(cfg.target_guild, USER, cfg.denied_role));
    }

    #[tokio::test(start_paused = true)]
    async fn stats_counts_both_guilds() {
        let cfg = test_bridge();
        let dir = FakeDirectory::new();
        dir.insert_member(cfg.source_guild, Id::new(1), "a", false, true, &[]);
        dir.insert_member(cfg.source_guild, Id::new(2), "b", false, false, &[cfg.booster_role]);
        dir.insert_member(cfg.source_guild, Id::new(3), "c", false, false, &[]);
        dir.insert_member(cfg.target_guild, Id::new(1), "a", false, false, &[cfg.access_role]);
        dir.insert_member(cfg.target_guild, Id::new(3), "c", false, false, &[cfg.denied_role]);
        let engine = engine(dir);

        let stats = engine.stats().await.unwrap();
        assert_eq!(stats.source_total, 3);
        assert_eq!(stats.boosters, 2);
        assert_eq!(stats.target_total, 2);
        assert_eq!(stats.with_access, 1);
        assert_eq!(stats.with_denied, 1);
    }
}
