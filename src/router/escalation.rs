use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, SolaceError};
use crate::generation::templates;
use crate::llm::{prompts, LlmProvider};
use crate::models::{UserContext, UserProfile};

/// Fixed emergency-resource reply for crisis-indicating input.
pub const CRISIS_RESPONSE: &str = "Please reach out for immediate help. If you are having thoughts of self-harm, contact the National Mental Health Program at 1717 (available 24/7) or Emergency Services at 112 right away. You are not alone, and trained counselors are ready to support you now.";

pub const CRISIS_CONFIDENCE: f32 = 0.95;

/// Source of user profiles for the escalation tier. The engine falls back
/// to an anonymous profile when a fetch fails.
#[async_trait]
pub trait UserProfileSource: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<UserProfile>;
}

/// Default profile source: every user is anonymous.
pub struct AnonymousProfiles;

#[async_trait]
impl UserProfileSource for AnonymousProfiles {
    async fn fetch(&self, user_id: &str) -> Result<UserProfile> {
        Ok(UserProfile::anonymous(user_id, None))
    }
}

#[derive(Debug, Deserialize)]
struct ConditionLabel {
    condition: String,
}

#[derive(Debug, Clone)]
pub struct EscalationOutcome {
    pub response: String,
    pub condition: String,
}

/// The heavier reasoning tier consulted when retrieval confidence is low:
/// profile retrieval, condition classification, recommendation synthesis.
///
/// Classification failures fall back to "general"; a failed recommendation
/// surfaces as an error so the router can drop to the web-search tier.
pub struct EscalationPipeline {
    llm: LlmProvider,
    profiles: Arc<dyn UserProfileSource>,
}

impl EscalationPipeline {
    pub fn new(llm: LlmProvider, profiles: Arc<dyn UserProfileSource>) -> Self {
        Self { llm, profiles }
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_available()
    }

    pub async fn run(&self, query: &str, user: &UserContext) -> Result<EscalationOutcome> {
        if !self.is_available() {
            return Err(SolaceError::EscalationUnavailable(
                "No language model configured for the escalation tier".to_string(),
            ));
        }

        let profile = match self.profiles.fetch(&user.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Profile retrieval failed, using anonymous profile: {e}");
                UserProfile::anonymous(&user.user_id, user.name.as_deref())
            }
        };
        let profile_json = serde_json::to_string(&profile)?;

        let condition = self.classify_condition(query, &profile_json).await;
        tracing::info!(condition = %condition, "Classified condition");

        let assessment = user
            .assessment_scores
            .as_ref()
            .map(|scores| scores.to_string())
            .unwrap_or_else(|| "{}".to_string());

        let prompt = prompts::recommendation_prompt(
            query,
            &profile_json,
            &condition,
            &assessment,
            &user.mental_health_status,
        );

        let recommendation = self
            .llm
            .complete(&prompt, None)
            .await
            .map_err(|e| SolaceError::Classification(format!("Recommendation failed: {e}")))?;

        // The terminal guarantee holds at this tier too.
        let response = templates::ensure_structure(
            &recommendation,
            query,
            &user.emotion,
            &user.mental_health_status,
        );

        Ok(EscalationOutcome {
            response,
            condition,
        })
    }

    async fn classify_condition(&self, query: &str, profile_json: &str) -> String {
        let prompt = prompts::condition_classification_prompt(query, profile_json);
        match self.llm.complete_structured::<ConditionLabel>(&prompt).await {
            Ok(label) => label.condition.to_lowercase(),
            Err(e) => {
                tracing::warn!("Condition classification failed, defaulting to general: {e}");
                "general".to_string()
            }
        }
    }
}
