//! Prompt templates for LLM-powered stages.
//!
//! Plain `format!()` interpolation: a missing variable is a compile error.

/// Prompt for the primary structured-response path.
///
/// The reply must contain, in order, an empathy section, a
/// solution/information section referencing the retrieved context, and a
/// recommendations section scaled to the user's status.
pub fn structured_support_prompt(
    query: &str,
    context: &str,
    emotion: &str,
    status: &str,
    message_count: u32,
) -> String {
    format!(
        r#"You are a compassionate mental health support assistant. Using the provided context, create a response with EXACTLY 3 sections:

USER QUERY: "{query}"
USER EMOTION: {emotion}
MENTAL HEALTH STATUS: {status}
MESSAGE COUNT: {message_count}

CONTEXT FROM KNOWLEDGE BASE:
{context}

CRITICAL: Your response MUST have ALL THREE sections in this order:

1. EMPATHY/ACKNOWLEDGEMENT (Start with "I understand..." or "I hear..." or "I can see..."):
   - Acknowledge their specific feelings from the query
   - Validate their experience
   - Show understanding and support

2. SOLUTION/INFORMATION (Include words like "can help", "try", "practice", "research shows"):
   - Use the context to provide relevant information about their concern
   - Explain what might be happening or why they feel this way
   - Offer evidence-based insights or coping strategies

3. RECOMMENDATIONS (Include words like "recommend", "consider", "suggest"):
   - Give concrete next steps based on their status ({status})
   - Suggest professional help if needed
   - Provide specific actions they can take

Use the context to make your response more informative and specific. Keep it 6-9 sentences total. Be warm and conversational, not clinical.

Response:"#
    )
}

/// Prompt for classifying the mental-health condition a query concerns.
/// Expects a strict JSON object reply.
pub fn condition_classification_prompt(query: &str, profile: &str) -> String {
    format!(
        r#"Classify the mental health condition this query most likely concerns.

USER QUERY: "{query}"
USER PROFILE: {profile}

Choose one condition label: depression, anxiety, stress, loneliness, sleep, crisis, general.

Respond with valid JSON only, no markdown and no commentary:
{{"condition": "<label>", "explanation": "<one short sentence>"}}"#
    )
}

/// Prompt for the escalation tier's personalized recommendation.
pub fn recommendation_prompt(
    query: &str,
    profile: &str,
    condition: &str,
    assessment: &str,
    interpretation: &str,
) -> String {
    format!(
        r#"You are a mental health support advisor. Produce a personalized recommendation.

USER QUERY: "{query}"
USER PROFILE: {profile}
CLASSIFIED CONDITION: {condition}
ASSESSMENT ANSWERS: {assessment}
ASSESSMENT INTERPRETATION: {interpretation}

Write a warm response with three parts: acknowledge how they feel, explain what can help for {condition}, and recommend concrete next steps. Include the words "recommend" or "consider". Keep it under 8 sentences. Only mention helplines for crisis situations."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_prompt_includes_inputs() {
        let prompt =
            structured_support_prompt("I feel anxious", "[Document 1]\n...", "anxious", "Mild", 3);
        assert!(prompt.contains("I feel anxious"));
        assert!(prompt.contains("[Document 1]"));
        assert!(prompt.contains("MENTAL HEALTH STATUS: Mild"));
        assert!(prompt.contains("MESSAGE COUNT: 3"));
    }

    #[test]
    fn test_classification_prompt_requests_json() {
        let prompt = condition_classification_prompt("I can't sleep", "{}");
        assert!(prompt.contains("valid JSON"));
        assert!(prompt.contains("I can't sleep"));
    }

    #[test]
    fn test_recommendation_prompt_carries_condition() {
        let prompt = recommendation_prompt("query", "{}", "anxiety", "{}", "Unknown");
        assert!(prompt.contains("CLASSIFIED CONDITION: anxiety"));
    }
}
