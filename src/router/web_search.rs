use crate::query::lexicon;
use crate::models::UserContext;

/// Last-resort responder: matches the query against a fixed topic table
/// and assembles a three-part reply from canned text. Needs no models and
/// never fails.
pub struct WebSearchResponder;

struct TopicEntry {
    keywords: &'static [&'static str],
    empathy: &'static str,
    solution: &'static str,
    recommendations: &'static str,
}

const TOPICS: &[TopicEntry] = &[
    TopicEntry {
        keywords: &["depressed", "depression", "sad"],
        empathy: "I can hear that you're going through a really difficult time with sadness and depression, {name}. Those feelings can be overwhelming and exhausting, and I want you to know that what you're experiencing is completely valid.",
        solution: "Depression often involves changes in brain chemistry that affect mood, energy, and motivation. Professional treatment through therapy and/or medication has proven very effective for most people experiencing depression.",
        recommendations: "I strongly recommend reaching out to a mental health professional who can provide proper assessment and treatment. In the meantime, try to maintain basic self-care routines, connect with supportive people in your life, and consider contacting the National Mental Health Program at 1717 if you need immediate support.",
    },
    TopicEntry {
        keywords: &["anxious", "anxiety", "worried", "panic"],
        empathy: "I understand that anxiety can feel incredibly overwhelming and scary, {name}. Those racing thoughts and physical sensations are very real and can be exhausting to deal with.",
        solution: "Anxiety is one of the most treatable mental health conditions. Techniques like deep breathing, grounding exercises, and cognitive behavioral therapy have strong research support for managing anxiety symptoms.",
        recommendations: "Try practicing 4-7-8 breathing (inhale 4, hold 7, exhale 8), limit caffeine intake, and consider speaking with a counselor who specializes in anxiety treatment. Regular exercise and mindfulness can also significantly help.",
    },
    TopicEntry {
        keywords: &["stress", "overwhelm", "pressure"],
        empathy: "It sounds like you're dealing with a lot of stress right now, {name}. That pressure can really take a toll on your mental and physical well-being.",
        solution: "Stress management involves both addressing the source of stress and building your capacity to handle pressure. Identifying specific stressors and developing coping strategies can make a significant difference.",
        recommendations: "Try breaking down overwhelming tasks into smaller steps, practice saying no to additional commitments, and schedule regular breaks. Consider stress-reduction techniques like meditation, exercise, or talking to a therapist.",
    },
    TopicEntry {
        keywords: &["lonely", "alone", "isolated"],
        empathy: "I hear that you're feeling lonely, {name}. Loneliness can be very difficult to experience, and you're showing strength by reaching out.",
        solution: "Loneliness is a common human experience that can be addressed through building meaningful connections and developing a support network.",
        recommendations: "Consider joining community groups, volunteering, or participating in activities you enjoy. Online support groups can also provide connection. If loneliness persists, talking to a counselor can help develop strategies for building relationships.",
    },
    TopicEntry {
        keywords: &["sleep", "tired", "exhausted", "insomnia"],
        empathy: "It sounds like you're having difficulties with sleep or feeling tired, {name}. Sleep issues can significantly impact mental health and daily functioning.",
        solution: "Sleep problems often have both physical and mental health components. Good sleep hygiene and addressing underlying stress or anxiety can improve sleep quality.",
        recommendations: "Try maintaining a consistent sleep schedule, limiting screen time before bed, and creating a relaxing bedtime routine. Avoid caffeine late in the day. If sleep problems persist, consider consulting a healthcare provider.",
    },
];

const DEFAULT_TOPIC: TopicEntry = TopicEntry {
    keywords: &[],
    empathy: "Thank you for reaching out and sharing what you're going through, {name}. I can sense that you're dealing with some challenges right now, and I want you to know that your experience matters.",
    solution: "There are evidence-based strategies and resources available that can help you manage these feelings and improve your mental health over time.",
    recommendations: "Consider speaking with a mental health professional for personalized support, practice daily self-care activities, and don't hesitate to reach out to trusted friends or family members for additional support.",
};

const CRISIS_BLOCK: &str = "Immediate support available: if you're having thoughts of self-harm, please contact the National Mental Health Program at 1717 (24/7) or Emergency Services at 112 immediately.";

impl WebSearchResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, query: &str, user: &UserContext) -> String {
        let query_lower = query.to_lowercase();
        let name = user.display_name();

        let topic = TOPICS
            .iter()
            .find(|entry| entry.keywords.iter().any(|kw| query_lower.contains(kw)))
            .unwrap_or(&DEFAULT_TOPIC);

        let mut response = format!(
            "{}\n\n{}\n\n{}",
            topic.empathy.replace("{name}", name),
            topic.solution,
            topic.recommendations
        );

        // Crisis resources ride along for severe users even at this tier.
        if user.is_severe() || lexicon::contains_crisis_language(&query_lower) {
            response.push_str("\n\n");
            response.push_str(CRISIS_BLOCK);
        }

        response
    }
}

impl Default for WebSearchResponder {
    fn default() -> Self {
        Self::new()
    }
}
