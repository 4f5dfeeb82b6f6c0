use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    #[error("{0}")]
    PermissionDenied(String),

    /// The bot itself lacks a capability in the target community.
    #[error("{0}")]
    MissingPermissions(String),

    #[error("I cannot moderate that user due to role hierarchy.")]
    HierarchyError,

    #[error("{0}")]
    TargetNotFound(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("{action} failed: {message}")]
    RemoteCallFailure { action: &'static str, message: String },

    #[error("could not write config: {0}")]
    ConfigWriteFailure(String),
}

impl ModerationError {
    pub fn remote(action: &'static str, err: impl std::fmt::Display) -> Self {
        ModerationError::RemoteCallFailure {
            action,
            message: err.to_string(),
        }
    }

    /// Title of the rejection embed shown to the invoking user.
    pub fn title(&self) -> String {
        match self {
            ModerationError::PermissionDenied(_) => "No Permission".to_string(),
            ModerationError::MissingPermissions(_) => "Missing Permissions".to_string(),
            ModerationError::HierarchyError => "Hierarchy Error".to_string(),
            ModerationError::TargetNotFound(_) => "Not In Server".to_string(),
            ModerationError::InvalidTarget(_) => "Invalid Target".to_string(),
            ModerationError::RemoteCallFailure { action, .. } => format!("{} Failed", action),
            ModerationError::ConfigWriteFailure(_) => "Config Error".to_string(),
        }
    }

    /// Body of the rejection embed.
    pub fn user_message(&self) -> String {
        match self {
            ModerationError::RemoteCallFailure { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
