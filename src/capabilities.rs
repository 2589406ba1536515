//! Capability simulator
//!
//! Each capability pairs a persona flag with a trigger vocabulary and a pure
//! formatter. Nothing here performs real searches, renders images or runs code.

use std::fmt;

use tracing::debug;

use crate::persona::Capabilities;

// ─────────────────────────────────────────────────────────────────
// Capability Kind
// ─────────────────────────────────────────────────────────────────

/// The four simulated tools, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    WebSearch,
    ImageGeneration,
    CodeInterpreter,
    Canvas,
}

impl CapabilityKind {
    /// All kinds in evaluation order.
    pub fn all() -> &'static [CapabilityKind] {
        &[
            CapabilityKind::WebSearch,
            CapabilityKind::ImageGeneration,
            CapabilityKind::CodeInterpreter,
            CapabilityKind::Canvas,
        ]
    }

    /// Tool name used in system prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            CapabilityKind::WebSearch => "Web Search",
            CapabilityKind::ImageGeneration => "Image Generation (DALL-E)",
            CapabilityKind::CodeInterpreter => "Code Interpreter",
            CapabilityKind::Canvas => "Canvas",
        }
    }

    /// Phrase used when describing what a persona is good at.
    pub fn specialty(&self) -> &'static str {
        match self {
            CapabilityKind::WebSearch => "web research",
            CapabilityKind::ImageGeneration => "image creation",
            CapabilityKind::CodeInterpreter => "code execution and data analysis",
            CapabilityKind::Canvas => "visual collaboration",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ─────────────────────────────────────────────────────────────────
// Rule Table
// ─────────────────────────────────────────────────────────────────

/// A trigger vocabulary and formatter for one capability.
struct CapabilityRule {
    kind: CapabilityKind,
    triggers: &'static [&'static str],
    execute: fn(&str) -> String,
}

impl CapabilityRule {
    fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|t| lowered.contains(t))
    }
}

/// Evaluated top to bottom; this order is the output order.
static RULES: &[CapabilityRule] = &[
    CapabilityRule {
        kind: CapabilityKind::WebSearch,
        triggers: &[
            "search", "find", "latest", "current", "news", "recent", "what is", "who is",
            "when did", "where is",
        ],
        execute: web_search,
    },
    CapabilityRule {
        kind: CapabilityKind::ImageGeneration,
        triggers: &[
            "image", "picture", "draw", "create", "generate", "show me", "visualize",
            "illustration",
        ],
        execute: generate_image,
    },
    CapabilityRule {
        kind: CapabilityKind::CodeInterpreter,
        triggers: &[
            "code", "python", "javascript", "calculate", "compute", "run", "execute", "script",
        ],
        execute: execute_code,
    },
    CapabilityRule {
        kind: CapabilityKind::Canvas,
        triggers: &["canvas", "collaborate", "visual", "diagram", "chart", "design"],
        execute: create_canvas,
    },
];

// ─────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────

/// Formatted output of one simulated tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResult {
    pub kind: CapabilityKind,
    pub output: String,
}

/// Run every enabled capability whose trigger matches `message`.
pub fn evaluate(message: &str, capabilities: &Capabilities) -> Vec<CapabilityResult> {
    let lowered = message.to_lowercase();

    let results: Vec<CapabilityResult> = RULES
        .iter()
        .filter(|rule| capabilities.is_enabled(rule.kind) && rule.matches(&lowered))
        .map(|rule| CapabilityResult {
            kind: rule.kind,
            output: (rule.execute)(message),
        })
        .collect();

    if !results.is_empty() {
        let fired: Vec<&str> = results.iter().map(|r| r.kind.display_name()).collect();
        debug!(capabilities = ?fired, "Capabilities fired");
    }
    results
}

// ─────────────────────────────────────────────────────────────────
// Executors
// ─────────────────────────────────────────────────────────────────

fn web_search(query: &str) -> String {
    let results = [
        (
            "Search Result 1",
            format!(
                "Information about \"{}\" from web search. This would contain relevant information found on the internet.",
                query
            ),
            "https://example.com/result1",
        ),
        (
            "Search Result 2",
            format!(
                "Additional details about \"{}\" from another source. Web search provides current information.",
                query
            ),
            "https://example.com/result2",
        ),
    ];

    let blocks: Vec<String> = results
        .iter()
        .map(|(title, snippet, url)| format!("**{}**\n{}\nSource: {}", title, snippet, url))
        .collect();

    format!(
        "🔍 **Web Search Results for \"{}\":**\n\n{}",
        query,
        blocks.join("\n\n")
    )
}

fn generate_image(prompt: &str) -> String {
    format!(
        "🎨 **Image Generated for:** \"{prompt}\"\n\n\
         [Generated Image Placeholder]\n\n\
         An image for \"{prompt}\" would be generated here. Image generation is simulated in this build.",
        prompt = prompt
    )
}

fn execute_code(code: &str) -> String {
    let language = if code.to_lowercase().contains("javascript") {
        "javascript"
    } else {
        "python"
    };
    format!(
        "💻 **Code Execution ({lang}):**\n\n\
         ```{lang}\n{code}\n```\n\n\
         **Output:**\n\
         Execution is simulated; no code was run.",
        lang = language,
        code = code
    )
}

fn create_canvas(content: &str) -> String {
    format!(
        "🎨 **Canvas Created:**\n\n\
         A canvas was created with the following content:\n\"{}\"\n\n\
         Interactive canvas editing is simulated in this build.",
        content
    )
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
