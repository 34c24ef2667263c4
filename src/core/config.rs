use anyhow::Result;
use twilight_model::id::{
    Id,
    marker::{GuildMarker, RoleMarker, UserMarker},
};

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub discord_token: String,
    pub owner_id: Id<UserMarker>,
    pub bridge: BridgeConfig,
    pub vanity_codes: Vec<String>,
}

/// Guild and role ids the reconciliation engine operates on.
#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// Guild whose booster status is authoritative.
    pub source_guild: Id<GuildMarker>,
    /// Guild whose access roles are derived from it.
    pub target_guild: Id<GuildMarker>,
    /// Discord's native booster role in the source guild.
    pub booster_role: Id<RoleMarker>,
    /// Our own booster role mirroring the native one.
    pub custom_role: Id<RoleMarker>,
    pub access_role: Id<RoleMarker>,
    pub denied_role: Id<RoleMarker>,
}

impl EnvConfig {
    pub fn from_env() -> Result<EnvConfig> {
        let vanity_codes = std::env::var("VANITY_CODES")?
            .split(',')
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();

        Ok(EnvConfig {
            discord_token: std::env::var("DISCORD_TOKEN")?,
            owner_id: std::env::var("OWNER_ID")?.parse()?,
            bridge: BridgeConfig {
                source_guild: std::env::var("SOURCE_GUILD_ID")?.parse()?,
                target_guild: std::env::var("TARGET_GUILD_ID")?.parse()?,
                booster_role: std::env::var("BOOSTER_ROLE_ID")?.parse()?,
                custom_role: std::env::var("CUSTOM_BOOSTER_ROLE_ID")?.parse()?,
                access_role: std::env::var("ACCESS_ROLE_ID")?.parse()?,
                denied_role: std::env::var("DENIED_ROLE_ID")?.parse()?,
            },
            vanity_codes,
        })
    }
}
