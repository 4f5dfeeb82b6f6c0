pub mod ban;
pub mod kick;
pub mod options;
pub mod setup;
pub mod unban;

use crate::data::store::SharedStore;
use crate::error::ModerationError;
use crate::moderation::api::{CommunityHandle, ModerationApi, TargetUser};
use crate::moderation::notifier::LogRecord;
use crate::moderation::permission::{can_moderate, Actor};
use crate::utils::embeds;
use crate::utils::embeds::render;
use anyhow::Result;
use serenity::async_trait;
use serenity::builder::CreateApplicationCommands;
use serenity::client::Context;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use tracing::{error, warn};

/// Everything a command handler needs about who invoked it and where.
pub struct Invocation<'a> {
    pub api: &'a dyn ModerationApi,
    pub store: &'a SharedStore,
    pub community: CommunityHandle,
    pub invoker: TargetUser,
    pub actor: Actor,
}

impl Invocation<'_> {
    pub async fn require_moderator(&self) -> Result<(), ModerationError> {
        let store = self.store.read().await;
        if can_moderate(&self.actor, store.community(self.community.id)) {
            Ok(())
        } else {
            Err(ModerationError::PermissionDenied(
                "❌ You do not have permission to use this command.".to_string(),
            ))
        }
    }
}

/// Where a command sends its single reply.
#[async_trait]
pub trait Reply: Send {
    async fn send(&mut self, record: LogRecord, ephemeral: bool) -> Result<()>;

    fn replied(&self) -> bool;

    async fn reject(&mut self, why: &ModerationError) -> Result<()> {
        self.send(embeds::error(&why.title(), why.user_message()), false)
            .await
    }
}

/// Sends the public reply for a completed action.
///
/// A failed reply is logged and returned, but only after the caller has had
/// the chance to finish the action's logging and propagation.
pub async fn reply_outcome(reply: &mut dyn Reply, record: LogRecord) -> Result<()> {
    let sent = reply.send(record, false).await;
    if let Err(why) = &sent {
        warn!("Cannot respond to slash command: {:?}", why);
    }
    sent
}

/// Handler boundary for an error that escaped command `name`.
pub async fn report_failure(reply: &mut dyn Reply, name: &str, why: &anyhow::Error) {
    error!("Command {} failed: {:?}", name, why);
    if reply.replied() {
        return;
    }
    if let Err(why) = reply
        .send(
            embeds::error(
                "Command Error",
                "An error occurred while executing the command.",
            ),
            true,
        )
        .await
    {
        warn!("Cannot respond to slash command: {}", why);
    }
}

/// Replies to a slash command interaction.
pub struct InteractionReply<'a> {
    ctx: &'a Context,
    command: &'a ApplicationCommandInteraction,
    replied: bool,
}

impl<'a> InteractionReply<'a> {
    pub fn new(ctx: &'a Context, command: &'a ApplicationCommandInteraction) -> Self {
        Self {
            ctx,
            command,
            replied: false,
        }
    }
}

#[async_trait]
impl Reply for InteractionReply<'_> {
    async fn send(&mut self, record: LogRecord, ephemeral: bool) -> Result<()> {
        self.command
            .create_interaction_response(&self.ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message
                            .embed(|e| render(e, &record))
                            .ephemeral(ephemeral)
                    })
            })
            .await?;
        self.replied = true;
        Ok(())
    }

    fn replied(&self) -> bool {
        self.replied
    }
}

pub fn register_all(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
    commands
        .create_application_command(|command| setup::register(command))
        .create_application_command(|command| ban::register(command))
        .create_application_command(|command| kick::register(command))
        .create_application_command(|command| unban::register(command))
}

pub const COMMAND_NAMES: [&str; 4] = ["setup", "ban", "kick", "unban"];

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use serenity::model::id::{GuildId, UserId};
    use serenity::model::permissions::Permissions;

    #[derive(Default)]
    pub struct RecordedReply {
        pub sent: Vec<(LogRecord, bool)>,
    }

    impl RecordedReply {
        pub fn only(&self) -> &LogRecord {
            assert_eq!(self.sent.len(), 1, "expected exactly one reply");
            &self.sent[0].0
        }
    }

    #[async_trait]
    impl Reply for RecordedReply {
        async fn send(&mut self, record: LogRecord, ephemeral: bool) -> Result<()> {
            self.sent.push((record, ephemeral));
            Ok(())
        }

        fn replied(&self) -> bool {
            !self.sent.is_empty()
        }
    }

    /// A reply whose interaction has already expired.
    #[derive(Default)]
    pub struct FailingReply {
        pub attempts: usize,
    }

    #[async_trait]
    impl Reply for FailingReply {
        async fn send(&mut self, _record: LogRecord, _ephemeral: bool) -> Result<()> {
            self.attempts += 1;
            Err(anyhow::anyhow!("Unknown interaction"))
        }

        fn replied(&self) -> bool {
            false
        }
    }

    pub fn invocation<'a>(
        api: &'a dyn ModerationApi,
        store: &'a SharedStore,
        permissions: Permissions,
    ) -> Invocation<'a> {
        Invocation {
            api,
            store,
            community: CommunityHandle {
                id: GuildId(1),
                name: "G1".to_string(),
            },
            invoker: TargetUser {
                id: UserId(77),
                tag: "mod#0077".to_string(),
            },
            actor: Actor {
                permissions,
                role_ids: Vec::new(),
            },
        }
    }
}
