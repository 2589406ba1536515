//! Local reply synthesis used when no remote completion is available.
//!
//! Output is knowledge excerpts, then capability blocks, then a contextual
//! reply picked by keyword rules. Only the generic reply is randomized.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::capabilities::CapabilityResult;
use crate::persona::{Capabilities, PersonaConfig};

const KNOWLEDGE_HEADING: &str = "📚 **Knowledge Base Results:**";
const SEPARATOR: &str = "---";

// ─────────────────────────────────────────────────────────────────
// Lookup Tables
// ─────────────────────────────────────────────────────────────────

/// Persona-name fragments and the role they imply, first match wins.
static ROLE_TABLE: &[(&[&str], &str)] = &[
    (&["writer"], "writing assistant"),
    (&["scholar", "research"], "research assistant"),
    (&["code", "mentor"], "programming mentor"),
    (&["business", "advisor"], "business advisor"),
    (&["design", "creative"], "creative designer"),
    (&["data", "analyst"], "data analyst"),
];

const DEFAULT_ROLE: &str = "AI assistant";

/// Which contextual reply a message receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Greeting,
    Help,
    Question,
    Creation,
    Analysis,
    Generic,
}

/// Keywords per reply kind, in precedence order.
static REPLY_RULES: &[(ReplyKind, &[&str])] = &[
    (
        ReplyKind::Greeting,
        &[
            "hello",
            "hi",
            "hey",
            "greetings",
            "good morning",
            "good afternoon",
            "good evening",
        ],
    ),
    (ReplyKind::Help, &["help", "assist", "support"]),
    (ReplyKind::Question, &["what", "how", "why"]),
    (ReplyKind::Creation, &["create", "make", "build"]),
    (
        ReplyKind::Analysis,
        &["analyze", "analyse", "review", "check", "evaluate"],
    ),
];

// ─────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────

/// Role label derived from the persona name.
pub fn role_label(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    ROLE_TABLE
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| lowered.contains(f)))
        .map(|(_, role)| *role)
        .unwrap_or(DEFAULT_ROLE)
}

/// Enabled capabilities as a readable list, e.g. "web research and image creation".
pub fn specialties(capabilities: &Capabilities) -> String {
    let items: Vec<&str> = capabilities
        .enabled()
        .iter()
        .map(|kind| kind.specialty())
        .collect();

    match items.as_slice() {
        [] => "general assistance".to_string(),
        [one] => one.to_string(),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

/// Endings accepted on single-word keywords of at least [`MIN_INFLECTED_LEN`] letters.
const INFLECTIONS: &[&str] = &["s", "es", "d", "ed", "ing", "er", "ers", "ion", "ions"];

/// Shorter keywords ("hi", "how") only match exactly.
const MIN_INFLECTED_LEN: usize = 4;

/// First reply kind with a keyword in `message`, matched per word.
///
/// Longer keywords also match their inflections, so "reviewing" counts as
/// "review" and "creating" as "create". Multi-word keywords match as phrases.
pub fn classify(message: &str) -> ReplyKind {
    let normalized: String = message
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = normalized.split_whitespace().collect();
    let padded = format!(" {} ", words.join(" "));

    let hit = |keyword: &str| {
        if keyword.contains(' ') {
            padded.contains(&format!(" {} ", keyword))
        } else {
            words.iter().any(|word| matches_word(word, keyword))
        }
    };

    REPLY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| hit(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ReplyKind::Generic)
}

fn matches_word(word: &str, keyword: &str) -> bool {
    if word == keyword {
        return true;
    }
    if keyword.len() < MIN_INFLECTED_LEN {
        return false;
    }
    // "create" -> "creating", "creation"
    let stem = keyword.strip_suffix('e').unwrap_or(keyword);
    [keyword, stem].iter().any(|base| {
        word.strip_prefix(base)
            .map_or(false, |rest| INFLECTIONS.contains(&rest))
    })
}

// ─────────────────────────────────────────────────────────────────
// Composition
// ─────────────────────────────────────────────────────────────────

/// Compose the full local response.
pub fn compose(
    message: &str,
    persona: &PersonaConfig,
    excerpts: &[String],
    capability_results: &[CapabilityResult],
) -> String {
    compose_with(message, persona, excerpts, capability_results, &mut rand::thread_rng())
}

/// [`compose`] with an explicit random source for the generic reply.
pub fn compose_with<R: Rng + ?Sized>(
    message: &str,
    persona: &PersonaConfig,
    excerpts: &[String],
    capability_results: &[CapabilityResult],
    rng: &mut R,
) -> String {
    let mut out = String::new();

    if !excerpts.is_empty() {
        out.push_str(KNOWLEDGE_HEADING);
        out.push_str("\n\n");
        out.push_str(&excerpts.join("\n\n"));
        out.push_str("\n\n");
        out.push_str(SEPARATOR);
        out.push_str("\n\n");
    }

    for result in capability_results {
        out.push_str(&result.output);
        out.push_str("\n\n");
    }

    out.push_str(&contextual_reply(message, persona, rng));
    out.trim().to_string()
}

/// The free-text part of a local response.
pub fn contextual_reply<R: Rng + ?Sized>(
    message: &str,
    persona: &PersonaConfig,
    rng: &mut R,
) -> String {
    let name = persona.name.trim();
    let role = role_label(name);
    let skills = specialties(&persona.capabilities);

    match classify(message) {
        ReplyKind::Greeting => format!(
            "Hello! I'm {}, your {}. I can help with {}. What would you like to work on today?",
            name, role, skills
        ),
        ReplyKind::Help => format!(
            "I'm here to help! As your {}, I can assist with {}. \
             Tell me a bit more about what you need and I'll guide you through it.",
            role, skills
        ),
        ReplyKind::Question => format!(
            "That's a great question. As a {}, I'd approach it step by step. \
             Could you share any extra context so I can give you a more precise answer?",
            role
        ),
        ReplyKind::Creation => format!(
            "Let's build it together. As your {}, I can help you plan and create this, \
             drawing on {}. What requirements should I keep in mind?",
            role, skills
        ),
        ReplyKind::Analysis => format!(
            "I'd be glad to take a closer look. As a {}, I'll review the details carefully \
             and point out strengths and areas to improve. Please share what you'd like me to analyze.",
            role
        ),
        ReplyKind::Generic => generic_reply(name, role, &skills, &persona.description, rng),
    }
}

fn generic_reply<R: Rng + ?Sized>(
    name: &str,
    role: &str,
    skills: &str,
    description: &str,
    rng: &mut R,
) -> String {
    let about = sentence(description);
    let templates = [
        format!("I'm {}, your {}. {} How can I help you with that?", name, role, about),
        format!(
            "Thanks for your message! As your {}, I focus on {}. {} What would you like to explore next?",
            role, skills, about
        ),
        format!(
            "Interesting! {} Tell me more about what you have in mind and I'll do my best to help as your {}.",
            about, role
        ),
    ];

    templates
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| templates[0].clone())
}

/// Description as a complete sentence, or a neutral stand-in when blank.
fn sentence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "I'm here to help.".to_string()
    } else if trimmed.ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}
