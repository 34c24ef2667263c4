//! In-memory fakes for the adapter traits, used by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use twilight_model::id::{
    Id,
    marker::{GuildMarker, RoleMarker, UserMarker},
};

use crate::core::{
    adapter::{Directory, DirectoryError, InviteLookup, LookupStatus, MemberSnapshot, Notify},
    config::BridgeConfig,
};

pub fn test_bridge() -> BridgeConfig {
    BridgeConfig {
        source_guild: Id::new(100),
        target_guild: Id::new(200),
        booster_role: Id::new(11),
        custom_role: Id::new(12),
        access_role: Id::new(13),
        denied_role: Id::new(14),
    }
}

type MemberKey = (Id<GuildMarker>, Id<UserMarker>);

#[derive(Debug, Default)]
struct FakeInner {
    members: HashMap<MemberKey, MemberSnapshot>,
    fetch_failures: HashMap<MemberKey, u32>,
    fetch_calls: HashMap<MemberKey, u32>,
    failing_adds: HashSet<(MemberKey, Id<RoleMarker>)>,
    mutations: u32,
}

#[derive(Debug, Default)]
pub struct FakeDirectory {
    inner: Mutex<FakeInner>,
}

impl FakeDirectory {
    pub fn new() -> FakeDirectory {
        FakeDirectory::default()
    }

    pub fn insert_member(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        name: &str,
        bot: bool,
        premium: bool,
        roles: &[Id<RoleMarker>],
    ) {
        self.inner.lock().unwrap().members.insert(
            (guild, user),
            MemberSnapshot {
                user_id: user,
                display_name: name.to_string(),
                bot,
                premium,
                roles: roles.to_vec(),
            },
        );
    }

    pub fn set_premium(&self, guild: Id<GuildMarker>, user: Id<UserMarker>, premium: bool) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(member) = inner.members.get_mut(&(guild, user)) {
            member.premium = premium;
        }
    }

    pub fn has_role(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> bool {
        self.inner
            .lock()
            .unwrap()
            .members
            .get(&(guild, user))
            .is_some_and(|member| member.roles.contains(&role))
    }

    /// Make the next `count` fetches of this member fail transiently.
    pub fn fail_fetches(&self, guild: Id<GuildMarker>, user: Id<UserMarker>, count: u32) {
        self.inner
            .lock()
            .unwrap()
            .fetch_failures
            .insert((guild, user), count);
    }

    /// Reject every add of this role to this member.
    pub fn fail_add(&self, guild: Id<GuildMarker>, user: Id<UserMarker>, role: Id<RoleMarker>) {
        self.inner
            .lock()
            .unwrap()
            .failing_adds
            .insert(((guild, user), role));
    }

    pub fn fetch_count(&self, guild: Id<GuildMarker>, user: Id<UserMarker>) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .fetch_calls
            .get(&(guild, user))
            .copied()
            .unwrap_or(0)
    }

    /// Total add/remove calls issued so far, successful or not.
    pub fn mutation_count(&self) -> u32 {
        self.inner.lock().unwrap().mutations
    }
}

impl Directory for FakeDirectory {
    async fn fetch_member(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
    ) -> Result<Option<MemberSnapshot>, DirectoryError> {
        let mut inner = self.inner.lock().unwrap();
        *inner.fetch_calls.entry((guild, user)).or_default() += 1;

        if let Some(remaining) = inner.fetch_failures.get_mut(&(guild, user))
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(DirectoryError::Transient("injected failure".to_string()));
        }

        Ok(inner.members.get(&(guild, user)).cloned())
    }

    async fn list_members(
        &self,
        guild: Id<GuildMarker>,
    ) -> Result<Vec<MemberSnapshot>, DirectoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .members
            .iter()
            .filter(|((member_guild, _), _)| *member_guild == guild)
            .map(|(_, member)| member.clone())
            .collect())
    }

    async fn add_role(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> Result<(), DirectoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.mutations += 1;

        if inner.failing_adds.contains(&((guild, user), role)) {
            return Err(DirectoryError::Forbidden);
        }

        let member = inner
            .members
            .get_mut(&(guild, user))
            .ok_or(DirectoryError::NotFound)?;
        if !member.roles.contains(&role) {
            member.roles.push(role);
        }
        Ok(())
    }

    async fn remove_role(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> Result<(), DirectoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.mutations += 1;

        let member = inner
            .members
            .get_mut(&(guild, user))
            .ok_or(DirectoryError::NotFound)?;
        member.roles.retain(|held| *held != role);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum LookupScript {
    Respond(LookupStatus),
    Fail,
}

#[derive(Debug)]
pub struct FakeLookup {
    script: LookupScript,
}

impl FakeLookup {
    pub fn always(result: Result<LookupStatus, DirectoryError>) -> FakeLookup {
        FakeLookup {
            script: match result {
                Ok(status) => LookupScript::Respond(status),
                Err(_) => LookupScript::Fail,
            },
        }
    }

    pub fn failing() -> FakeLookup {
        FakeLookup {
            script: LookupScript::Fail,
        }
    }
}

impl InviteLookup for FakeLookup {
    async fn lookup_invite(&self, _code: &str) -> Result<LookupStatus, DirectoryError> {
        match self.script {
            LookupScript::Respond(status) => Ok(status),
            LookupScript::Fail => Err(DirectoryError::Transient("injected failure".to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeNotify {
    sent: Mutex<Vec<(Id<UserMarker>, String)>>,
}

impl FakeNotify {
    pub fn sent(&self) -> Vec<(Id<UserMarker>, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notify for FakeNotify {
    async fn direct_message(
        &self,
        user: Id<UserMarker>,
        text: &str,
    ) -> Result<(), DirectoryError> {
        self.sent.lock().unwrap().push((user, text.to_string()));
        Ok(())
    }
}
