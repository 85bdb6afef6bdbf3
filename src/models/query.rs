use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    Definition,
    Treatment,
    Diagnosis,
    Prevention,
    #[default]
    General,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Definition => "definition",
            QueryIntent::Treatment => "treatment",
            QueryIntent::Diagnosis => "diagnosis",
            QueryIntent::Prevention => "prevention",
            QueryIntent::General => "general",
        }
    }
}

/// Everything the query processor learned about one turn's input.
/// Built fresh per turn; `expanded_text` is what gets embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContext {
    pub raw_text: String,
    pub normalized_text: String,
    pub expanded_text: String,
    pub extracted_entities: BTreeMap<String, Vec<String>>,
    pub intent: QueryIntent,
    pub specialty: Option<String>,
}

impl QueryContext {
    /// Fallback context when processing fails: raw query passes through
    /// untouched so retrieval can still run.
    pub fn passthrough(raw: &str) -> Self {
        Self {
            raw_text: raw.to_string(),
            normalized_text: raw.to_lowercase(),
            expanded_text: raw.to_string(),
            extracted_entities: BTreeMap::new(),
            intent: QueryIntent::General,
            specialty: None,
        }
    }
}
