use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-user state supplied by the session layer. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub emotion: String,
    pub mental_health_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message_count: u32,
    /// Prior questionnaire answers, opaque to the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_scores: Option<Value>,
}

impl Default for UserContext {
    fn default() -> Self {
        Self {
            user_id: "anon_user".to_string(),
            emotion: "neutral".to_string(),
            mental_health_status: "Unknown".to_string(),
            name: None,
            message_count: 1,
            assessment_scores: None,
        }
    }
}

impl UserContext {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("there")
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self.emotion.as_str(), "neutral" | "neutral/unsure")
    }

    pub fn is_severe(&self) -> bool {
        matches!(self.mental_health_status.as_str(), "Severe" | "Crisis")
    }
}

/// Minimal profile used by the escalation tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub preferences: String,
}

impl UserProfile {
    pub fn anonymous(user_id: &str, name: Option<&str>) -> Self {
        Self {
            id: user_id.to_string(),
            name: name.unwrap_or("User").to_string(),
            preferences: "General mental health support".to_string(),
        }
    }
}
