use serde::{Deserialize, Serialize};

/// The one request-lifecycle state the orchestrator owns. Exactly one
/// instance exists; only the orchestrator transitions it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GenerationState {
    #[default]
    Idle,
    Loading,
    #[serde(rename_all = "camelCase")]
    Succeeded { alt_text: String },
    Failed { message: String },
}

impl GenerationState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEvent {
    pub state: GenerationState,
    pub preview: Option<String>,
    pub has_image: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub user_message: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFeedbackEvent {
    pub copied: bool,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragHighlightEvent {
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_with_status_tag() {
        let succeeded = GenerationState::Succeeded {
            alt_text: "A cat.".to_string(),
        };
        let value = serde_json::to_value(&succeeded).expect("serialize");
        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["altText"], "A cat.");

        let idle = serde_json::to_value(GenerationState::Idle).expect("serialize");
        assert_eq!(idle["status"], "idle");
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(GenerationState::default(), GenerationState::Idle);
        assert!(!GenerationState::default().is_loading());
    }
}
