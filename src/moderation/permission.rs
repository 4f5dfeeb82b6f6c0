use crate::data::config::CommunityConfig;
use serenity::model::guild::Member;
use serenity::model::id::RoleId;
use serenity::model::permissions::Permissions;

/// The parts of the invoking member the gate looks at.
#[derive(Debug, Clone)]
pub struct Actor {
    pub permissions: Permissions,
    pub role_ids: Vec<RoleId>,
}

impl From<&Member> for Actor {
    fn from(member: &Member) -> Self {
        Self {
            permissions: member.permissions.unwrap_or_else(Permissions::empty),
            role_ids: member.roles.clone(),
        }
    }
}

/// Administrator implies every other permission.
pub fn holds(permissions: Permissions, required: Permissions) -> bool {
    permissions.administrator() || permissions.contains(required)
}

pub fn can_manage_setup(actor: &Actor) -> bool {
    holds(actor.permissions, Permissions::MANAGE_GUILD)
}

/// Whether `actor` may run `/ban`, `/kick` or `/unban`.
pub fn can_moderate(actor: &Actor, config: Option<&CommunityConfig>) -> bool {
    if can_manage_setup(actor) {
        return true;
    }
    match config {
        Some(config) => actor
            .role_ids
            .iter()
            .any(|role| config.moderator_role_ids.contains(role)),
        None => false,
    }
}
