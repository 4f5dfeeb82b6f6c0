use crate::data::config::AutoMessage;
use crate::data::store::{ConfigStore, SharedStore};
use serenity::http::Http;
use serenity::model::id::GuildId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const AUTO_MESSAGE_PERIOD: Duration = Duration::from_secs(6 * 60 * 60);

/// Auto-messages configured right now, in community order.
pub fn pending_messages(store: &ConfigStore) -> Vec<(GuildId, AutoMessage)> {
    store
        .communities()
        .filter_map(|(id, config)| config.auto_message.clone().map(|m| (*id, m)))
        .collect()
}

/// Posts every configured auto-message once per period, starting one period from now.
pub fn spawn_auto_messages(http: Arc<Http>, store: SharedStore) {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + AUTO_MESSAGE_PERIOD, AUTO_MESSAGE_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Auto-message task started");

        loop {
            ticker.tick().await;
            let messages = pending_messages(&*store.read().await);
            debug!("Sending {} auto-messages", messages.len());

            for (community, message) in messages {
                if let Err(why) = message.channel_id.say(&http, &message.text).await {
                    warn!(
                        "Failed to send auto-message to {} in {}: {}",
                        message.channel_id, community, why
                    );
                }
            }
        }
    });
}
