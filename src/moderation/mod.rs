//! Moderation core: permission gate, action executor, ban propagation,
//! deny-list monitor and log notifier. Everything talks to the platform
//! through [`api::ModerationApi`].

pub mod api;
pub mod denylist;
pub mod executor;
pub mod fanout;
pub mod issued;
pub mod notifier;
pub mod outcome;
pub mod permission;
pub mod propagation;
pub mod serenity_api;
#[cfg(test)]
pub mod testing;
