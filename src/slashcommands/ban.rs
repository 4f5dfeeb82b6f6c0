use crate::error::ModerationError;
use crate::moderation::api::TargetUser;
use crate::moderation::executor::{execute_ban, ActionRequest, MAX_PRUNE_DAYS};
use crate::moderation::notifier::{notify, LogRecord};
use crate::moderation::propagation::{propagate_ban, OriginBan};
use crate::slashcommands::options;
use crate::slashcommands::{reply_outcome, Invocation, Reply};
use anyhow::Result;
use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::command::CommandOptionType;
use serenity::model::prelude::interaction::application_command::CommandDataOption;
use tracing::error;

#[derive(Debug, Clone)]
pub struct BanArgs {
    pub target: TargetUser,
    pub reason: Option<String>,
    pub delete_days: u8,
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("ban")
        .description("Ban a user (restricted to moderation roles)")
        .create_option(|option| {
            option
                .name("user")
                .description("User to ban")
                .kind(CommandOptionType::User)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("reason")
                .description("Reason for ban")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("delete_days")
                .description("Prune message days (0-7)")
                .kind(CommandOptionType::Integer)
                .required(false)
        })
}

pub fn parse(options: &[CommandDataOption]) -> Result<BanArgs, ModerationError> {
    let target = options::user(options, "user")
        .ok_or_else(|| ModerationError::InvalidTarget("Please provide a user to target.".to_string()))?;
    let delete_days = options::integer(options, "delete_days")
        .unwrap_or(0)
        .clamp(0, MAX_PRUNE_DAYS as i64) as u8;

    Ok(BanArgs {
        target,
        reason: options::string(options, "reason"),
        delete_days,
    })
}

pub async fn run(inv: &Invocation<'_>, args: BanArgs, reply: &mut dyn Reply) -> Result<()> {
    if let Err(why) = inv.require_moderator().await {
        return reply.reject(&why).await;
    }
    if args.target.id == inv.invoker.id {
        return reply
            .reject(&ModerationError::InvalidTarget("You cannot target yourself.".to_string()))
            .await;
    }

    let reason = args
        .reason
        .unwrap_or_else(|| format!("Action by {}", inv.invoker.tag));
    let request = ActionRequest {
        community: inv.community.clone(),
        target: args.target.clone(),
        moderator_tag: inv.invoker.tag.clone(),
        reason: reason.clone(),
    };

    let outcome = match execute_ban(inv.api, &request, args.delete_days).await {
        Ok(outcome) => outcome,
        Err(why) => {
            error!("Ban failed: {}", why);
            return reply.reject(&why).await;
        }
    };

    let record = LogRecord::from(&outcome);
    let sent = reply_outcome(reply, record.clone()).await;
    notify(inv.api, inv.store, inv.community.id, &record).await;

    let ban = OriginBan {
        origin: inv.community.clone(),
        target: args.target,
        moderator_tag: inv.invoker.tag.clone(),
        reason: Some(reason),
        prune_days: outcome.prune_days,
    };
    propagate_ban(inv.api, inv.store, &ban).await;
    sent
}
