use crate::error::ModerationError;
use crate::moderation::api::TargetUser;
use serenity::model::channel::ChannelType;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::prelude::interaction::application_command::{
    CommandDataOption, CommandDataOptionValue,
};

/// A channel option, reduced to what setup validation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelArg {
    pub id: ChannelId,
    pub text_based: bool,
}

fn resolved<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a CommandDataOptionValue> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.resolved.as_ref())
}

pub fn string(options: &[CommandDataOption], name: &str) -> Option<String> {
    match resolved(options, name) {
        Some(CommandDataOptionValue::String(value)) if !value.trim().is_empty() => {
            Some(value.trim().to_string())
        }
        _ => None,
    }
}

pub fn integer(options: &[CommandDataOption], name: &str) -> Option<i64> {
    match resolved(options, name) {
        Some(CommandDataOptionValue::Integer(value)) => Some(*value),
        _ => None,
    }
}

pub fn user(options: &[CommandDataOption], name: &str) -> Option<TargetUser> {
    match resolved(options, name) {
        Some(CommandDataOptionValue::User(user, _)) => Some(TargetUser {
            id: user.id,
            tag: user.tag(),
        }),
        _ => None,
    }
}

pub fn role(options: &[CommandDataOption], name: &str) -> Option<(RoleId, String)> {
    match resolved(options, name) {
        Some(CommandDataOptionValue::Role(role)) => Some((role.id, role.name.clone())),
        _ => None,
    }
}

pub fn channel(options: &[CommandDataOption], name: &str) -> Option<ChannelArg> {
    match resolved(options, name) {
        Some(CommandDataOptionValue::Channel(channel)) => Some(ChannelArg {
            id: channel.id,
            text_based: matches!(channel.kind, ChannelType::Text | ChannelType::News),
        }),
        _ => None,
    }
}

fn snowflake(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

pub fn community_id(raw: &str) -> Result<GuildId, ModerationError> {
    snowflake(raw)
        .map(GuildId)
        .ok_or_else(|| ModerationError::InvalidTarget(format!("`{}` is not a valid server ID.", raw)))
}

pub fn user_id(raw: &str) -> Result<UserId, ModerationError> {
    snowflake(raw)
        .map(UserId)
        .ok_or_else(|| ModerationError::InvalidTarget(format!("`{}` is not a valid user ID.", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snowflakes() {
        assert_eq!(community_id(" 968428801728069662 ").unwrap(), GuildId(968428801728069662));
        assert_eq!(user_id("42").unwrap(), UserId(42));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(matches!(community_id("abc"), Err(ModerationError::InvalidTarget(_))));
        assert!(matches!(community_id("0"), Err(ModerationError::InvalidTarget(_))));
        assert!(matches!(user_id("-5"), Err(ModerationError::InvalidTarget(_))));
    }
}
