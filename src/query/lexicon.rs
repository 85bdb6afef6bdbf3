//! Keyword tables driving query understanding and crisis detection.
//!
//! All classification in this crate is table-driven so the tables can be
//! reviewed and extended without touching control flow.

/// Entity categories with their match patterns, applied case-insensitively.
pub const ENTITY_CATEGORIES: &[(&str, &str)] = &[
    (
        "mental_health",
        r"(stress|anxiety|depression|suicide|coping|therapy|counseling|mindfulness|panic|self[- ]harm|hopelessness|support group|resilience|burnout|well-being|mental health)",
    ),
    (
        "symptom",
        r"(insomnia|mood swings|irritability|concentration issues|memory problems|appetite changes|sleep disturbances|social withdrawal|fatigue|hopelessness)",
    ),
    (
        "treatment",
        r"(medication|therapy|cognitive behavioral therapy|CBT|dialectical behavior therapy|DBT|exposure therapy|medication management|psychiatric evaluation|support group|mindfulness training)",
    ),
    (
        "diagnosis",
        r"(bipolar disorder|schizophrenia|post-traumatic stress disorder|PTSD|obsessive[- ]compulsive disorder|OCD|generalized anxiety disorder|GAD|major depressive disorder|MDD|panic disorder|social anxiety disorder|SAD)",
    ),
    (
        "risk_factor",
        r"(genetic predisposition|family history|trauma|substance abuse|chronic illness|stressful life events|social isolation|poor coping skills|low resilience|lack of support)",
    ),
    (
        "intervention",
        r"(cognitive restructuring|exposure therapy|mindfulness meditation|relaxation techniques|stress management|problem-solving skills|assertiveness training|social skills training|self-care strategies|crisis intervention)",
    ),
];

/// Typo and abbreviation corrections applied during normalization.
pub const TYPO_CORRECTIONS: &[(&str, &str)] = &[
    (r"\bdepressed\b", "depression"),
    (r"\bim\b", "i'm"),
    (r"\bu\b", "you"),
    (r"\bur\b", "your"),
];

/// Topic keyword -> synonym cluster appended during query expansion.
pub const EXPANSIONS: &[(&str, &str)] = &[
    ("depression", "depression mood sadness hopelessness"),
    ("anxiety", "anxiety worry nervousness panic"),
    ("stress", "stress pressure tension burnout"),
    ("therapy", "therapy counseling psychotherapy CBT DBT"),
    ("suicide", "suicide self-harm hopelessness crisis"),
    ("support", "support group counseling help"),
];

/// Intent keyword groups, in priority order.
pub const INTENT_DEFINITION: &str = r"\b(what is|define|explain|describe|meaning of)\b";
pub const INTENT_TREATMENT: &str = r"\b(treat|therapy|medication|cure|manage|drug|prescription)\b";
pub const INTENT_DIAGNOSIS: &str = r"\b(diagnose|diagnostic|symptom|sign|identify|determine)\b";
pub const INTENT_PREVENTION: &str = r"\b(prevent|preventive|avoid|risk factor|reduction)\b";

/// Specialty keyword sets; first matching specialty wins.
pub const SPECIALTY_KEYWORDS: &[(&str, &[&str])] = &[(
    "psychiatry",
    &[
        "mental health",
        "depression",
        "anxiety",
        "psychiatric",
        "disorder",
        "schizophrenia",
        "bipolar",
        "therapy",
        "behavioral",
        "psychological",
        "stress",
        "counseling",
        "mindfulness",
        "panic",
        "self-harm",
        "support group",
        "resilience",
        "burnout",
        "well-being",
    ],
)];

/// Phrases indicating acute self-harm risk. Matching any of these
/// short-circuits routing to the crisis response.
pub const CRISIS_PHRASES: &[&str] = &[
    "suicide",
    "kill myself",
    "want to die",
    "hurt myself",
    "end my life",
];

/// First-person affect markers used for the personal-query confidence boost.
pub const PERSONAL_PHRASES: &[&str] = &["i am", "i feel", "i'm", "my", "me"];

/// Returns true when the query contains crisis language.
pub fn contains_crisis_language(query: &str) -> bool {
    let lower = query.to_lowercase();
    CRISIS_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Returns true when the query is phrased in the first person about the
/// speaker's own state.
pub fn is_personal_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    PERSONAL_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
