use crate::error::ModerationError;
use crate::moderation::api::{CommunityHandle, MemberSnapshot, ModerationApi, TargetUser};
use crate::moderation::outcome::{ActionKind, ModerationOutcome};
use crate::moderation::permission::holds;
use serenity::model::id::{GuildId, UserId};
use serenity::model::permissions::Permissions;
use tracing::{debug, info};

/// Discord accepts at most a week of message pruning on ban.
pub const MAX_PRUNE_DAYS: u8 = 7;

/// One moderation command, already past the permission gate.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub community: CommunityHandle,
    pub target: TargetUser,
    pub moderator_tag: String,
    pub reason: String,
}

impl ActionRequest {
    fn outcome(&self, action: ActionKind, prune_days: Option<u8>) -> ModerationOutcome {
        ModerationOutcome {
            action,
            target: self.target.clone(),
            moderator_tag: self.moderator_tag.clone(),
            reason: Some(self.reason.clone()),
            origin: self.community.name.clone(),
            prune_days,
        }
    }
}

/// The bot's own membership in `community`, required to reason about rank and permissions.
pub async fn bot_member(
    api: &dyn ModerationApi,
    community: GuildId,
) -> Result<MemberSnapshot, ModerationError> {
    api.fetch_member(community, api.current_user_id())
        .await?
        .ok_or_else(|| ModerationError::MissingPermissions("I am not a member of that server.".to_string()))
}

async fn require_bot_permission(
    api: &dyn ModerationApi,
    community: GuildId,
    required: Permissions,
    label: &str,
) -> Result<MemberSnapshot, ModerationError> {
    let me = bot_member(api, community).await?;
    if !holds(me.permissions, required) {
        return Err(ModerationError::MissingPermissions(format!(
            "I need {} permission.",
            label
        )));
    }
    Ok(me)
}

fn check_hierarchy(me: &MemberSnapshot, target: &MemberSnapshot) -> Result<(), ModerationError> {
    if me.highest_role_position <= target.highest_role_position {
        return Err(ModerationError::HierarchyError);
    }
    Ok(())
}

async fn current_member(
    api: &dyn ModerationApi,
    request: &ActionRequest,
) -> Result<Option<MemberSnapshot>, ModerationError> {
    api.fetch_member(request.community.id, request.target.id)
        .await
        .map_err(|why| {
            debug!("Member lookup for {} failed: {}", request.target.id, why);
            why
        })
}

/// Bans `user`, remembering the ban as ours until its gateway event comes back.
pub async fn issue_ban(
    api: &dyn ModerationApi,
    community: GuildId,
    user: UserId,
    reason: &str,
    prune_days: u8,
) -> Result<(), ModerationError> {
    api.issued_bans().record(community, user);
    let result = api.ban_member(community, user, reason, prune_days).await;
    if result.is_err() {
        api.issued_bans().forget(community, user);
    }
    result
}

pub async fn execute_ban(
    api: &dyn ModerationApi,
    request: &ActionRequest,
    prune_days: u8,
) -> Result<ModerationOutcome, ModerationError> {
    let prune_days = prune_days.min(MAX_PRUNE_DAYS);
    let me = require_bot_permission(api, request.community.id, Permissions::BAN_MEMBERS, "Ban Members").await?;
    if let Some(target) = current_member(api, request).await? {
        check_hierarchy(&me, &target)?;
    }

    issue_ban(api, request.community.id, request.target.id, &request.reason, prune_days)
        .await?;
    info!(
        "Banned {} in {} ({})",
        request.target.id, request.community.name, request.reason
    );
    Ok(request.outcome(ActionKind::Ban, Some(prune_days)))
}

pub async fn execute_kick(
    api: &dyn ModerationApi,
    request: &ActionRequest,
) -> Result<ModerationOutcome, ModerationError> {
    let me = require_bot_permission(api, request.community.id, Permissions::KICK_MEMBERS, "Kick Members").await?;
    let target = current_member(api, request).await?.ok_or_else(|| {
        ModerationError::TargetNotFound("User is not currently in the server.".to_string())
    })?;
    check_hierarchy(&me, &target)?;

    api.kick_member(request.community.id, request.target.id, &request.reason)
        .await?;
    info!("Kicked {} from {}", request.target.id, request.community.name);
    Ok(request.outcome(ActionKind::Kick, None))
}

pub async fn execute_unban(
    api: &dyn ModerationApi,
    request: &ActionRequest,
) -> Result<ModerationOutcome, ModerationError> {
    require_bot_permission(api, request.community.id, Permissions::BAN_MEMBERS, "Ban Members").await?;

    api.unban_member(request.community.id, request.target.id, &request.reason)
        .await?;
    info!("Unbanned {} in {}", request.target.id, request.community.name);
    Ok(request.outcome(ActionKind::Unban, None))
}
