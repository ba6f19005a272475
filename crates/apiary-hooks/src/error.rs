use thiserror::Error;

pub type Result<T> = std::result::Result<T, HookError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("at least one tab required")]
    NoTabs,

    #[error("no enabled tabs available")]
    NoEnabledTabs,

    #[error("tab {id} not found")]
    TabNotFound { id: String },

    #[error("tab {id} is disabled")]
    TabDisabled { id: String },

    #[error("tab index {index} out of bounds")]
    TabIndexOutOfBounds { index: usize },

    #[error("{message}")]
    Operation { message: String },
}

impl HookError {
    #[must_use]
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn tab_not_found(id: &impl std::fmt::Debug) -> Self {
        Self::TabNotFound {
            id: format!("{id:?}"),
        }
    }

    #[must_use]
    pub fn tab_disabled(id: &impl std::fmt::Debug) -> Self {
        Self::TabDisabled {
            id: format!("{id:?}"),
        }
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::operation(message)
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::operation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(HookError::NoTabs.to_string(), "at least one tab required");
        assert_eq!(
            HookError::tab_not_found(&"body").to_string(),
            "tab \"body\" not found"
        );
        assert_eq!(
            HookError::TabIndexOutOfBounds { index: 4 }.to_string(),
            "tab index 4 out of bounds"
        );
    }

    #[test]
    fn plain_messages_become_operation_errors() {
        let err: HookError = "Network error".into();
        assert_eq!(err, HookError::operation("Network error"));
        assert_eq!(err.to_string(), "Network error");
    }
}
