use crate::data::store::SharedStore;
use crate::moderation::api::ModerationApi;
use crate::moderation::outcome::{ActionKind, ModerationOutcome};
use serenity::model::id::GuildId;
use tracing::{debug, warn};

pub const COLOUR_SUCCESS: u32 = 0x22c55e;
pub const COLOUR_INFO: u32 = 0x06b6d4;
pub const COLOUR_ERROR: u32 = 0xef4444;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A log-channel message, independent of how the platform renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<LogField>,
    pub colour: u32,
}

impl LogRecord {
    /// Free-form notice, e.g. a configuration change.
    pub fn notice(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            fields: Vec::new(),
            colour: COLOUR_INFO,
        }
    }

    pub fn with_colour(mut self, colour: u32) -> Self {
        self.colour = colour;
        self
    }

    fn field(&mut self, name: &str, value: impl Into<String>, inline: bool) {
        self.fields.push(LogField {
            name: name.to_string(),
            value: value.into(),
            inline,
        });
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

impl From<&ModerationOutcome> for LogRecord {
    fn from(outcome: &ModerationOutcome) -> Self {
        let label = outcome.action.label();
        let mut record = LogRecord {
            title: format!("{} — {}", label, outcome.target.tag),
            description: None,
            fields: Vec::new(),
            colour: match outcome.action {
                ActionKind::SyncedBanFailed => COLOUR_ERROR,
                _ if label.to_lowercase().contains("ban") => COLOUR_SUCCESS,
                _ => COLOUR_INFO,
            },
        };
        record.field(
            "Target",
            format!("{} (`{}`)", outcome.target.tag, outcome.target.id),
            true,
        );
        record.field("Server", outcome.origin.clone(), true);
        record.field("Moderator", outcome.moderator_tag.clone(), true);
        if let Some(reason) = &outcome.reason {
            record.field("Reason", reason.clone(), false);
        }
        if let Some(days) = outcome.prune_days {
            record.field("Prune Days", days.to_string(), true);
        }
        record
    }
}

/// Delivers `record` to the log channel of `community`, if one is configured.
///
/// Best-effort: returns whether the message went out, never an error.
pub async fn notify(
    api: &dyn ModerationApi,
    store: &SharedStore,
    community: GuildId,
    record: &LogRecord,
) -> bool {
    let channel = {
        let store = store.read().await;
        store.community(community).and_then(|c| c.log_channel_id)
    };
    let Some(channel) = channel else {
        debug!("No log channel for {}, dropping '{}'", community, record.title);
        return false;
    };

    match api.send_log(channel, record).await {
        Ok(()) => true,
        Err(why) => {
            warn!("Failed to send log to {} in {}: {}", channel, community, why);
            false
        }
    }
}
