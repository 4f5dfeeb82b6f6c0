use crate::error::ModerationError;
use serenity::model::id::GuildId;
use std::future::Future;
use tracing::warn;

#[derive(Debug)]
pub struct TargetOutcome<T> {
    pub community: GuildId,
    pub result: Result<T, ModerationError>,
}

impl<T> TargetOutcome<T> {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs `attempt` once per target, in order, and never stops early.
///
/// Calls are sequential. A failed target is logged and recorded; the next
/// target is still attempted.
pub async fn attempt_all<T, I, F, Fut>(
    what: &str,
    targets: I,
    mut attempt: F,
) -> Vec<TargetOutcome<T>>
where
    I: IntoIterator<Item = GuildId>,
    F: FnMut(GuildId) -> Fut,
    Fut: Future<Output = Result<T, ModerationError>>,
{
    let mut outcomes = Vec::new();
    for community in targets {
        let result = attempt(community).await;
        if let Err(why) = &result {
            warn!("{} in {} failed: {}", what, community, why);
        }
        outcomes.push(TargetOutcome { community, result });
    }
    outcomes
}
