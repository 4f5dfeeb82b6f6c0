use serenity::model::id::{GuildId, UserId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Gateway ban events for our own bans arrive well within this.
pub const ISSUED_BAN_TTL: Duration = Duration::from_secs(60);

/// Bans this process has asked the platform for and whose gateway event is still expected.
///
/// Entries are consumed by the matching ban event, so a later ban of the same
/// user by someone else is treated as external again.
#[derive(Debug, Default)]
pub struct IssuedBans {
    pending: Mutex<HashMap<(GuildId, UserId), Instant>>,
}

impl IssuedBans {
    pub fn record(&self, community: GuildId, user: UserId) {
        if let Ok(mut pending) = self.pending.lock() {
            let now = Instant::now();
            pending.retain(|_, at| now.duration_since(*at) < ISSUED_BAN_TTL);
            pending.insert((community, user), now);
        }
    }

    /// Drops an entry whose ban call failed.
    pub fn forget(&self, community: GuildId, user: UserId) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&(community, user));
        }
    }

    /// Whether the ban of `user` in `community` was issued by us, consuming the entry.
    pub fn take(&self, community: GuildId, user: UserId) -> bool {
        match self.pending.lock() {
            Ok(mut pending) => pending
                .remove(&(community, user))
                .map_or(false, |at| at.elapsed() < ISSUED_BAN_TTL),
            Err(_) => false,
        }
    }
}
