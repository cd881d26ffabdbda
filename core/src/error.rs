use thiserror::Error;

/// Failures that abort an in-flight `ask`.
///
/// Messages appended before the failure stay in the context.
#[derive(Error, Debug)]
pub enum AssistantError {
    /// The backend asked for a function that is not registered.
    #[error("tool '{name}' not found")]
    ToolNotFound { name: String },

    /// Backend failure, passed through untouched.
    #[error(transparent)]
    Backend(anyhow::Error),

    /// A tool's `execute` failed. Displays the tool's own error.
    #[error("{source}")]
    ToolExecution {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to serialize tool output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Only raised when a round limit is configured.
    #[error("tool-call loop exceeded {rounds} rounds")]
    MaxRoundsExceeded { rounds: usize },
}

impl AssistantError {
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    pub fn is_tool_not_found(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }

    /// Name of the tool involved, if any.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolNotFound { name } | Self::ToolExecution { name, .. } => Some(name),
            _ => None,
        }
    }
}

pub type AssistantResult<T> = std::result::Result<T, AssistantError>;
