use crate::query::lexicon;

/// Orchestration record threaded through one routed turn. Created at turn
/// start, mutated by each stage, discarded afterwards.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub current_input: String,
    pub output: Option<String>,
    pub retrieval_confidence: f32,
    pub agent_name: Option<String>,
    pub crisis_detected: bool,
    pub condition_classified: Option<String>,
    pub escalation_used: bool,
    /// Conversation transcript for this turn; the final output is appended
    /// at FINALIZE.
    pub messages: Vec<String>,
}

impl AgentState {
    pub fn new(input: &str) -> Self {
        Self {
            current_input: input.to_string(),
            output: None,
            retrieval_confidence: 0.0,
            agent_name: None,
            crisis_detected: false,
            condition_classified: None,
            escalation_used: false,
            messages: Vec::new(),
        }
    }
}

/// Router states. FINALIZE is terminal; no state is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Retrieve,
    Escalate,
    Crisis,
    ConditionPipeline,
    WebSearch,
    Finalize,
}

/// Pure transition function. Stages mutate the [`AgentState`]; this
/// function only reads it.
///
/// Crisis wins over every other consideration, including an unavailable
/// escalation tier: the crisis response is canned and needs no model.
pub fn next_state(
    state: RouterState,
    agent: &AgentState,
    escalation_available: bool,
    min_confidence: f32,
) -> RouterState {
    match state {
        RouterState::Retrieve => {
            if agent.crisis_detected || agent.retrieval_confidence < min_confidence {
                RouterState::Escalate
            } else {
                RouterState::Finalize
            }
        }
        RouterState::Escalate => {
            if agent.crisis_detected {
                RouterState::Crisis
            } else if !escalation_available {
                RouterState::WebSearch
            } else {
                RouterState::ConditionPipeline
            }
        }
        RouterState::Crisis
        | RouterState::ConditionPipeline
        | RouterState::WebSearch
        | RouterState::Finalize => RouterState::Finalize,
    }
}

/// +0.1 confidence boost (capped at 1.0) for first-person affect queries
/// from a non-neutral user.
pub fn personal_query_boost(confidence: f32, query: &str, emotion: &str) -> f32 {
    let neutral = matches!(emotion, "neutral" | "neutral/unsure");
    if !neutral && lexicon::is_personal_query(query) {
        (confidence + 0.1).min(1.0)
    } else {
        confidence
    }
}
