mod escalation;
mod state;
mod web_search;

pub use escalation::{
    AnonymousProfiles, EscalationOutcome, EscalationPipeline, UserProfileSource, CRISIS_CONFIDENCE,
    CRISIS_RESPONSE,
};
pub use state::{next_state, personal_query_boost, AgentState, RouterState};
pub use web_search::WebSearchResponder;
