use crate::data::config::{AutoMessage, CommunityConfig};
use crate::error::ModerationError;
use crate::moderation::notifier::{notify, LogRecord};
use crate::moderation::permission::can_manage_setup;
use crate::slashcommands::options::{self, ChannelArg};
use crate::slashcommands::{reply_outcome, Invocation, Reply};
use crate::utils::embeds;
use anyhow::Result;
use serenity::builder::CreateApplicationCommand;
use serenity::model::channel::ChannelType;
use serenity::model::id::{GuildId, RoleId};
use serenity::model::prelude::command::CommandOptionType;
use serenity::model::prelude::interaction::application_command::CommandDataOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupCommand {
    ModerationRole { role: RoleId, name: String },
    BanSync { action: ListAction, community: GuildId },
    View,
    LogChannel(Option<ChannelArg>),
    BlacklistList,
    Blacklist { action: ListAction, community: GuildId },
    AutoMessageSet { channel: Option<ChannelArg>, text: Option<String> },
    AutoMessageClear,
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("setup")
        .description("Configure AutoBanNet for this server")
        .create_option(|sub| {
            sub.name("moderationrole")
                .description("Set a role allowed to use moderation commands")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("role")
                        .description("Role")
                        .kind(CommandOptionType::Role)
                        .required(true)
                })
        })
        .create_option(|sub| {
            sub.name("bansync")
                .description("Add/Remove servers to sync bans with")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("action")
                        .description("add/remove")
                        .kind(CommandOptionType::String)
                        .required(true)
                        .add_string_choice("add", "add")
                        .add_string_choice("remove", "remove")
                })
                .create_sub_option(|option| {
                    option
                        .name("guildid")
                        .description("Guild ID")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|sub| {
            sub.name("view")
                .description("View current setup")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|sub| {
            sub.name("logchannel")
                .description("Set or clear the server's mod-log channel (omit to clear)")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("channel")
                        .description("Channel")
                        .kind(CommandOptionType::Channel)
                        .channel_types(&[ChannelType::Text, ChannelType::News])
                        .required(false)
                })
        })
        .create_option(|sub| {
            sub.name("blacklist")
                .description("Manage global blacklist servers")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("action")
                        .description("add/remove/list")
                        .kind(CommandOptionType::String)
                        .required(true)
                        .add_string_choice("add", "add")
                        .add_string_choice("remove", "remove")
                        .add_string_choice("list", "list")
                })
                .create_sub_option(|option| {
                    option
                        .name("guildid")
                        .description("Guild ID")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
        })
        .create_option(|sub| {
            sub.name("automessage")
                .description("Set or clear an automatic message to be sent every 6 hours")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("action")
                        .description("Set or Clear the message")
                        .kind(CommandOptionType::String)
                        .required(true)
                        .add_string_choice("set", "set")
                        .add_string_choice("clear", "clear")
                })
                .create_sub_option(|option| {
                    option
                        .name("channel")
                        .description("Channel for the message")
                        .kind(CommandOptionType::Channel)
                        .required(false)
                })
                .create_sub_option(|option| {
                    option
                        .name("message")
                        .description("The message content (required for 'set')")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
        })
}

fn list_action(raw: Option<String>) -> Result<ListAction, ModerationError> {
    match raw.as_deref() {
        Some("add") => Ok(ListAction::Add),
        Some("remove") => Ok(ListAction::Remove),
        other => Err(ModerationError::InvalidTarget(format!(
            "Unknown action `{}`.",
            other.unwrap_or_default()
        ))),
    }
}

fn required_community(options: &[CommandDataOption]) -> Result<GuildId, ModerationError> {
    let raw = options::string(options, "guildid").ok_or_else(|| {
        ModerationError::InvalidTarget("You must provide a guild ID for add/remove.".to_string())
    })?;
    options::community_id(&raw)
}

pub fn parse(options: &[CommandDataOption]) -> Result<SetupCommand, ModerationError> {
    let sub = options
        .first()
        .ok_or_else(|| ModerationError::InvalidTarget("Missing subcommand.".to_string()))?;
    let args = sub.options.as_slice();

    match sub.name.as_str() {
        "moderationrole" => {
            let (role, name) = options::role(args, "role")
                .ok_or_else(|| ModerationError::InvalidTarget("Please provide a role.".to_string()))?;
            Ok(SetupCommand::ModerationRole { role, name })
        }
        "bansync" => Ok(SetupCommand::BanSync {
            action: list_action(options::string(args, "action"))?,
            community: required_community(args)?,
        }),
        "view" => Ok(SetupCommand::View),
        "logchannel" => Ok(SetupCommand::LogChannel(options::channel(args, "channel"))),
        "blacklist" => match options::string(args, "action").as_deref() {
            Some("list") => Ok(SetupCommand::BlacklistList),
            action => Ok(SetupCommand::Blacklist {
                action: list_action(action.map(str::to_string))?,
                community: required_community(args)?,
            }),
        },
        "automessage" => match options::string(args, "action").as_deref() {
            Some("set") => Ok(SetupCommand::AutoMessageSet {
                channel: options::channel(args, "channel"),
                text: options::string(args, "message"),
            }),
            Some("clear") => Ok(SetupCommand::AutoMessageClear),
            other => Err(ModerationError::InvalidTarget(format!(
                "Unknown action `{}`.",
                other.unwrap_or_default()
            ))),
        },
        other => Err(ModerationError::InvalidTarget(format!(
            "Unknown subcommand `{}`.",
            other
        ))),
    }
}

/// Applies `change` to this community's record and flushes the store if it reports a change.
async fn update_community<T>(
    inv: &Invocation<'_>,
    change: impl FnOnce(&mut CommunityConfig) -> (bool, T),
) -> T {
    let mut store = inv.store.write().await;
    let (changed, value) = change(store.community_mut(inv.community.id));
    if changed {
        store.flush();
    }
    value
}

fn describe(config: &CommunityConfig) -> String {
    let roles = if config.moderator_role_ids.is_empty() {
        "None".to_string()
    } else {
        config
            .moderator_role_ids
            .iter()
            .map(|r| format!("<@&{}>", r))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let sync = if config.sync_targets.is_empty() {
        "None".to_string()
    } else {
        config
            .sync_targets
            .iter()
            .map(|g| format!("`{}`", g))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let log = config
        .log_channel_id
        .map(|c| format!("<#{}>", c))
        .unwrap_or_else(|| "None".to_string());
    let auto = config
        .auto_message
        .as_ref()
        .map(|m| format!("<#{}>: {}", m.channel_id, m.text))
        .unwrap_or_else(|| "None".to_string());

    format!(
        "**Moderation roles:** {}\n**Ban sync:** {}\n**Log channel:** {}\n**Auto-message:** {}",
        roles, sync, log, auto
    )
}

pub async fn run(inv: &Invocation<'_>, command: SetupCommand, reply: &mut dyn Reply) -> Result<()> {
    if !can_manage_setup(&inv.actor) {
        return reply
            .reject(&ModerationError::PermissionDenied(
                "You need Manage Server permission to run setup.".to_string(),
            ))
            .await;
    }
    let mention = format!("<@{}>", inv.invoker.id);

    match command {
        SetupCommand::ModerationRole { role, name } => {
            let added = update_community(inv, |c| {
                let added = c.add_moderator_role(role);
                (added, added)
            })
            .await;
            if added {
                reply
                    .send(
                        embeds::success(
                            "Moderation Role Added",
                            format!("✅ **{}** is now a moderation role.", name),
                        ),
                        false,
                    )
                    .await
            } else {
                reply
                    .send(
                        embeds::info(
                            "Already Configured",
                            format!("⚠️ **{}** is already a moderation role.", name),
                        ),
                        false,
                    )
                    .await
            }
        }

        SetupCommand::BanSync {
            action: ListAction::Add,
            community,
        } => {
            let added = update_community(inv, |c| {
                let added = c.add_sync_target(community);
                (added, added)
            })
            .await;
            if !added {
                return reply
                    .send(
                        embeds::info(
                            "Already Added",
                            format!("⚠️ Guild ID **{}** is already in the ban sync list.", community),
                        ),
                        false,
                    )
                    .await;
            }
            let sent = reply_outcome(
                reply,
                embeds::success(
                    "Ban Sync Added",
                    format!("✅ Guild ID **{}** added to ban sync list.", community),
                ),
            )
            .await;
            let notice = LogRecord::notice(
                "Ban-Sync: Server Added",
                format!("Guild ID `{}` was added to ban-sync list by {}", community, mention),
            );
            notify(inv.api, inv.store, inv.community.id, &notice).await;
            sent
        }

        SetupCommand::BanSync {
            action: ListAction::Remove,
            community,
        } => {
            update_community(inv, |c| (c.remove_sync_target(community), ())).await;
            let sent = reply_outcome(
                reply,
                embeds::success(
                    "Ban Sync Removed",
                    format!("✅ Guild ID **{}** removed from ban sync list.", community),
                ),
            )
            .await;
            let notice = LogRecord::notice(
                "Ban-Sync: Server Removed",
                format!("Guild ID `{}` removed from ban-sync list by {}", community, mention),
            );
            notify(inv.api, inv.store, inv.community.id, &notice).await;
            sent
        }

        SetupCommand::View => {
            let description = {
                let store = inv.store.read().await;
                store
                    .community(inv.community.id)
                    .map(describe)
                    .unwrap_or_else(|| describe(&CommunityConfig::default()))
            };
            reply
                .send(
                    embeds::info(&format!("Setup for {}", inv.community.name), description),
                    false,
                )
                .await
        }

        SetupCommand::LogChannel(None) => {
            update_community(inv, |c| (c.log_channel_id.take().is_some(), ())).await;
            let sent = reply_outcome(
                reply,
                embeds::success("Log Channel Cleared", "✅ Log channel has been cleared."),
            )
            .await;
            sent
    }

    SetupCommand::LogChannel(Some(channel)) => {
        if !channel.text_based {
            return reply
                .send(embeds::error("Invalid Channel", "Please provide a text channel."), false)
                .await;
        }
        update_community(inv, |c| {
            let changed = c.log_channel_id != Some(channel.id);
            c.log_channel_id = Some(channel.id);
            (changed, ())
        })
        .await;
        reply
            .send(
                embeds::success(
                    "Log Channel Set",
                    format!("✅ Logs will be sent to <#{}> ({}).", channel.id, channel.id),
                ),
                false,
            )
            .await
    }

    SetupCommand::BlacklistList => {
        let list = {
            let store = inv.store.read().await;
            let ids = &store.global().blacklisted_communities;
            if ids.is_empty() {
                "None".to_string()
            } else {
                ids.iter()
                    .map(|g| g.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };
        reply.send(embeds::info("Blacklisted Guilds", list), false).await
    }

    SetupCommand::Blacklist {
        action: ListAction::Add,
        community,
    } => {
        let added = {
            let mut store = inv.store.write().await;
            let added = store.global_mut().add_blacklisted(community);
            if added {
                store.flush();
            }
            added
        };
        if !added {
            return reply
                .send(
                    embeds::info(
                        "Already Blacklisted",
                        format!("⚠️ Guild ID **{}** is already blacklisted.", community),
                    ),
                    false,
                )
                .await;
        }
        let sent = reply_outcome(
            reply,
            embeds::success(
                "Blacklisted Guild Added",
                format!("✅ Guild ID **{}** added to global blacklist.", community),
            ),
        )
        .await;
            let notice = LogRecord::notice(
                "Blacklist: Server Added",
                format!("Guild ID `{}` added to global blacklist by {}", community, mention),
            );
            notify(inv.api, inv.store, inv.community.id, &notice).await;
            sent
        }

        SetupCommand::Blacklist {
            action: ListAction::Remove,
            community,
        } => {
            {
                let mut store = inv.store.write().await;
                if store.global_mut().remove_blacklisted(community) {
                    store.flush();
                }
            }
            let sent = reply_outcome(
                reply,
                embeds::success(
                    "Blacklisted Guild Removed",
                    format!("✅ Guild ID **{}** removed from global blacklist.", community),
                ),
            )
            .await;
            let notice = LogRecord::notice(
                "Blacklist: Server Removed",
                format!("Guild ID `{}` removed from global blacklist by {}", community, mention),
            );
            notify(inv.api, inv.store, inv.community.id, &notice).await;
            sent
        }

        SetupCommand::AutoMessageSet { channel, text } => {
            let (Some(channel), Some(text)) = (channel, text) else {
                return reply
                    .send(
                        embeds::error(
                            "Missing Options",
                            "To set a message, you must provide both a channel and a message.",
                        ),
                        true,
                    )
                    .await;
            };
            if !channel.text_based {
                return reply
                    .send(
                        embeds::error(
                            "Invalid Channel",
                            "Please provide a text channel for the auto-message.",
                        ),
                        true,
                    )
                    .await;
            }
            update_community(inv, |c| {
                c.auto_message = Some(AutoMessage {
                    channel_id: channel.id,
                    text,
                });
                (true, ())
            })
            .await;
            reply
                .send(
                    embeds::success(
                        "Auto-Message Set",
                        format!(
                            "✅ An automatic message has been set to send every 6 hours in <#{}>.",
                            channel.id
                        ),
                    ),
                    false,
                )
                .await
        }

        SetupCommand::AutoMessageClear => {
            update_community(inv, |c| (c.auto_message.take().is_some(), ())).await;
            reply
                .send(
                    embeds::success("Auto-Message Cleared", "✅ The automatic message has been cleared."),
                    false,
                )
                .await
        }
    }
}
