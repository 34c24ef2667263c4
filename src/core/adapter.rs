use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use twilight_http::{Client as HttpClient, error::ErrorType};
use twilight_model::{
    guild::Member,
    id::{
        Id,
        marker::{GuildMarker, RoleMarker, UserMarker},
    },
};

use crate::consts;

/// Point-in-time view of a guild member, everything the engine needs to make
/// a decision without holding twilight types.
#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub user_id: Id<UserMarker>,
    pub display_name: String,
    pub bot: bool,
    pub premium: bool,
    pub roles: Vec<Id<RoleMarker>>,
}

impl MemberSnapshot {
    pub fn has_role(&self, role: Id<RoleMarker>) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("member or resource not found")]
    NotFound,
    #[error("missing permission")]
    Forbidden,
    #[error("rate limited")]
    RateLimited,
    #[error("transient api failure: {0}")]
    Transient(String),
}

/// Member directory of the chat platform: lookups and role mutations.
/// Role mutations are idempotent on the platform side; callers still check
/// current state first to avoid burning rate limit on no-ops.
#[allow(async_fn_in_trait)]
pub trait Directory {
    async fn fetch_member(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
    ) -> Result<Option<MemberSnapshot>, DirectoryError>;

    async fn list_members(
        &self,
        guild: Id<GuildMarker>,
    ) -> Result<Vec<MemberSnapshot>, DirectoryError>;

    async fn add_role(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> Result<(), DirectoryError>;

    async fn remove_role(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> Result<(), DirectoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Found,
    NotFound,
}

#[allow(async_fn_in_trait)]
pub trait InviteLookup {
    async fn lookup_invite(&self, code: &str) -> Result<LookupStatus, DirectoryError>;
}

#[allow(async_fn_in_trait)]
pub trait Notify {
    async fn direct_message(
        &self,
        user: Id<UserMarker>,
        text: &str,
    ) -> Result<(), DirectoryError>;
}

/// Fetch a member, retrying transient failures with a growing backoff.
/// Exhausting the retries is treated the same as the member being absent,
/// so callers get one code path for "cannot be observed right now".
pub async fn fetch_member_with_retry<D: Directory>(
    dir: &D,
    guild: Id<GuildMarker>,
    user: Id<UserMarker>,
) -> Option<MemberSnapshot> {
    for attempt in 0..consts::FETCH_ATTEMPTS {
        match dir.fetch_member(guild, user).await {
            Ok(found) => return found,
            Err(err) if attempt + 1 < consts::FETCH_ATTEMPTS => {
                debug!(
                    %user,
                    attempt = attempt + 1,
                    %err,
                    "retrying member fetch"
                );
                tokio::time::sleep(consts::FETCH_BACKOFF_STEP * (attempt + 1)).await;
            }
            Err(err) => {
                debug!(%user, %err, "member fetch failed after retries");
                return None;
            }
        }
    }
    None
}

const MEMBER_PAGE_SIZE: u16 = 1000;

/// Production directory backed by the twilight REST client.
#[derive(Debug, Clone)]
pub struct TwilightAdapter {
    http: Arc<HttpClient>,
}

impl TwilightAdapter {
    pub fn new(http: Arc<HttpClient>) -> TwilightAdapter {
        TwilightAdapter { http }
    }
}

pub fn snapshot(member: &Member) -> MemberSnapshot {
    MemberSnapshot {
        user_id: member.user.id,
        display_name: member
            .nick
            .clone()
            .unwrap_or_else(|| member.user.name.clone()),
        bot: member.user.bot,
        premium: member.premium_since.is_some(),
        roles: member.roles.clone(),
    }
}

fn classify(err: twilight_http::Error) -> DirectoryError {
    match err.kind() {
        ErrorType::Response { status, .. } => match status.get() {
            404 => DirectoryError::NotFound,
            403 => DirectoryError::Forbidden,
            429 => DirectoryError::RateLimited,
            _ => DirectoryError::Transient(err.to_string()),
        },
        _ => DirectoryError::Transient(err.to_string()),
    }
}

fn body_error(err: twilight_http::response::DeserializeBodyError) -> DirectoryError {
    DirectoryError::Transient(err.to_string())
}

impl Directory for TwilightAdapter {
    async fn fetch_member(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
    ) -> Result<Option<MemberSnapshot>, DirectoryError> {
        match self.http.guild_member(guild, user).await {
            Ok(response) => {
                let member = response.model().await.map_err(body_error)?;
                Ok(Some(snapshot(&member)))
            }
            Err(err) => match classify(err) {
                DirectoryError::NotFound => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn list_members(
        &self,
        guild: Id<GuildMarker>,
    ) -> Result<Vec<MemberSnapshot>, DirectoryError> {
        let mut members = Vec::new();
        let mut after = None;

        loop {
            let mut request = self.http.guild_members(guild).limit(MEMBER_PAGE_SIZE);
            if let Some(after) = after {
                request = request.after(after);
            }

            let page = request
                .await
                .map_err(classify)?
                .models()
                .await
                .map_err(body_error)?;

            let Some(last) = page.last() else { break };
            after = Some(last.user.id);
            let full_page = page.len() == usize::from(MEMBER_PAGE_SIZE);
            members.extend(page.iter().map(snapshot));

            if !full_page {
                break;
            }
        }

        Ok(members)
    }

    async fn add_role(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> Result<(), DirectoryError> {
        self.http
            .add_guild_member_role(guild, user, role)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn remove_role(
        &self,
        guild: Id<GuildMarker>,
        user: Id<UserMarker>,
        role: Id<RoleMarker>,
    ) -> Result<(), DirectoryError> {
        self.http
            .remove_guild_member_role(guild, user, role)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

impl InviteLookup for TwilightAdapter {
    async fn lookup_invite(&self, code: &str) -> Result<LookupStatus, DirectoryError> {
        match self.http.invite(code).await {
            Ok(_) => Ok(LookupStatus::Found),
            Err(err) => match classify(err) {
                DirectoryError::NotFound => Ok(LookupStatus::NotFound),
                other => Err(other),
            },
        }
    }
}

impl Notify for TwilightAdapter {
    async fn direct_message(
        &self,
        user: Id<UserMarker>,
        text: &str,
    ) -> Result<(), DirectoryError> {
        let channel = self
            .http
            .create_private_channel(user)
            .await
            .map_err(classify)?
            .model()
            .await
            .map_err(body_error)?;

        self.http
            .create_message(channel.id)
            .content(text)
            .await
            .map_err(classify)?;
        Ok(())
    }
}
