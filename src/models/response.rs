use serde::{Deserialize, Serialize};

/// One supporting document reference attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub source: String,
    pub score: f32,
    pub snippet: String,
}

/// Output of the response generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub response: String,
    pub sources: Vec<SourceRef>,
    pub confidence: f32,
}

/// Stable answer contract returned by `SupportEngine::process_query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub response: String,
    pub confidence: f32,
    pub sources: Vec<SourceRef>,
    pub method: String,
}

/// Stable routing contract returned by `SupportEngine::route`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedResponse {
    pub response: String,
    pub agent_name: String,
    pub confidence: f32,
    pub escalation_used: bool,
    pub crisis_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}
