use thiserror::Error;

/// Failure taxonomy for the generation pipeline. The webview only ever sees
/// `user_message`; the full detail stays in the operator log.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("unreadable image input: {details}")]
    Encoding { details: String },

    #[error("service returned no usable text")]
    EmptyResponse,

    #[error("generation failed: {details}")]
    Generation { details: String },

    #[error("startup configuration invalid: {details}")]
    StartupConfig { details: String },

    #[error("clipboard write failed: {details}")]
    Clipboard { details: String },
}

impl AppError {
    pub fn encoding(details: impl Into<String>) -> Self {
        Self::Encoding {
            details: details.into(),
        }
    }

    pub fn generation(details: impl Into<String>) -> Self {
        Self::Generation {
            details: details.into(),
        }
    }

    pub fn startup_config(details: impl Into<String>) -> Self {
        Self::StartupConfig {
            details: details.into(),
        }
    }

    pub fn clipboard(details: impl Into<String>) -> Self {
        Self::Clipboard {
            details: details.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::StartupConfig { .. } => {
                "The application is not configured. Set GEMINI_API_KEY and restart.".to_string()
            }
            Self::Clipboard { .. } => "Could not copy to the clipboard.".to_string(),
            _ => "Failed to generate alt text. Please try another image.".to_string(),
        }
    }

    pub fn details(&self) -> String {
        self.to_string()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::generation(value.to_string())
    }
}
