//! System prompt and knowledge-context assembly for remote completions.

use crate::persona::PersonaConfig;

/// Build the system prompt that puts the remote model in character.
pub fn build_system_prompt(persona: &PersonaConfig) -> String {
    let mut sections = Vec::new();

    let role = format!("You are {}. {}", persona.name.trim(), persona.description.trim());
    sections.push(role.trim_end().to_string());

    if !persona.instructions.trim().is_empty() {
        sections.push(format!("Instructions:\n{}", persona.instructions.trim()));
    }

    let tools: Vec<&str> = persona
        .capabilities
        .enabled()
        .iter()
        .map(|kind| kind.display_name())
        .collect();
    if !tools.is_empty() {
        sections.push(format!("Available Tools: {}", tools.join(", ")));
    }

    if !persona.knowledge_files.is_empty() {
        let names: Vec<&str> = persona
            .knowledge_files
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        sections.push(format!(
            "Knowledge Base: You have access to {} uploaded knowledge file(s): {}. \
             Use this information to give accurate, contextual answers, and cite the \
             source file whenever you rely on it.",
            names.len(),
            names.join(", ")
        ));
    }

    sections.push(format!(
        "Response Guidelines:\n\
         - Stay in character as {} and follow your instructions.\n\
         - Be accurate, and say so when you are unsure.\n\
         - Ask clarifying questions when a request is ambiguous.\n\
         - Cite knowledge base sources when you use them.",
        persona.name.trim()
    ));

    sections.join("\n\n")
}

/// The user turn sent to the remote model, prefixed with knowledge excerpts when any were found.
pub fn build_user_message(message: &str, excerpts: &[String]) -> String {
    if excerpts.is_empty() {
        return message.to_string();
    }
    format!(
        "Relevant information from knowledge base:\n{}\n\nUser question: {}",
        excerpts.join("\n\n"),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{ingest, FileUpload};

    fn persona() -> PersonaConfig {
        let mut p = PersonaConfig::new("Research Scholar");
        p.description = "Finds and explains papers.".into();
        p.instructions = "Always summarise findings first.".into();
        p
    }

    #[test]
    fn test_role_and_guidelines() {
        let prompt = build_system_prompt(&persona());
        assert!(prompt.starts_with("You are Research Scholar. Finds and explains papers."));
        assert!(prompt.contains("Instructions:\nAlways summarise findings first."));
        assert!(prompt.contains("Stay in character as Research Scholar"));
        assert!(prompt.contains("clarifying questions"));
    }

    #[test]
    fn test_tools_line_lists_enabled_only() {
        let mut p = persona();
        assert!(!build_system_prompt(&p).contains("Available Tools"));

        p.capabilities.canvas = true;
        p.capabilities.web_search = true;
        assert!(build_system_prompt(&p).contains("Available Tools: Web Search, Canvas"));
    }

    #[test]
    fn test_knowledge_notice() {
        let mut p = persona();
        assert!(!build_system_prompt(&p).contains("Knowledge Base:"));

        let file = ingest(&FileUpload::new("paper.txt", "text/plain", b"Abstract.".to_vec())).unwrap();
        p.add_knowledge_files(vec![file]);
        let prompt = build_system_prompt(&p);
        assert!(prompt.contains("Knowledge Base:"));
        assert!(prompt.contains("paper.txt"));
        assert!(prompt.contains("cite"));
    }

    #[test]
    fn test_blank_description_and_instructions() {
        let p = PersonaConfig::new("Bare");
        let prompt = build_system_prompt(&p);
        assert!(prompt.starts_with("You are Bare.\n\n"));
        assert!(!prompt.contains("Instructions:"));
    }

    #[test]
    fn test_user_message_context() {
        assert_eq!(build_user_message("hi", &[]), "hi");

        let excerpts = vec!["From a.txt:\nAlpha.".to_string(), "From b.txt:\nBeta.".to_string()];
        let msg = build_user_message("what?", &excerpts);
        assert_eq!(
            msg,
            "Relevant information from knowledge base:\nFrom a.txt:\nAlpha.\n\nFrom b.txt:\nBeta.\n\nUser question: what?"
        );
    }
}
