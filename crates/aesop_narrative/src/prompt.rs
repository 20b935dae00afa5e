//! Prompt composition for story modification.
//!
//! The system prompt pins the editor persona and output contract; the
//! modification prompt carries the working document, the user's request, the
//! per-category instruction, and a short summary of recent requests so the
//! model keeps multi-request sessions coherent.

use aesop_core::{ModificationRequest, ModificationType};

const SYSTEM_PROMPT: &str = "\
You are an editor for investment-learning stories aimed at ten-year-olds.

Your role:
1. Analyze and revise existing story data
2. Edit the requested part (characters, setting, events, dialogue)
3. Keep the language child-friendly
4. Preserve the educational purpose
5. Keep the JSON structure consistent

In scope: editing story content, adjusting difficulty, strengthening the lesson.
Out of scope: creating new games, real investment advice, technical questions.

Important: return the complete revised story as valid JSON only.";

/// The fixed system prompt for story editing.
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Per-category editing instruction.
fn instruction(category: ModificationType) -> &'static str {
    match category {
        ModificationType::Character => {
            "Edit character names, personalities, appearances, and lines."
        }
        ModificationType::Setting => {
            "Edit the backdrop: places, time, and environment."
        }
        ModificationType::Events => {
            "Edit game events, news items, and stock movements."
        }
        ModificationType::Dialogue => {
            "Edit character dialogue and descriptive text."
        }
        ModificationType::General => {
            "Edit whatever the request touches on."
        }
    }
}

/// Summarize recent edit requests for conversation continuity.
///
/// Only the last `window` requests are included; an empty history yields a
/// session-start line instead.
pub fn conversation_summary(recent_requests: &[String], window: usize) -> String {
    if recent_requests.is_empty() || window == 0 {
        return "This is a new editing session.".to_string();
    }
    let recent: Vec<&str> = recent_requests
        .iter()
        .rev()
        .take(window)
        .rev()
        .map(String::as_str)
        .collect();
    format!("Recent edit requests: {}", recent.join(", "))
}

/// Compose the full modification prompt.
///
/// `document_json` is the serialized working document; `history_summary`
/// comes from [`conversation_summary`].
pub fn modification_prompt(
    document_json: &str,
    request: &ModificationRequest,
    history_summary: &str,
) -> String {
    let mut prompt = format!(
        "Here is the existing story data to revise:\n\n{document_json}\n\n\
         User request: {}\n\n\
         Editing instruction: {}\n",
        request.raw_text,
        instruction(request.classified_type),
    );

    if let Some(turn) = request.target_turn {
        prompt.push_str(&format!(
            "Focus the changes on turn {turn}; leave other turns intact unless consistency requires it.\n"
        ));
    }

    prompt.push_str(&format!("\nSession context: {history_summary}\n"));

    prompt.push_str(
        "\nRevision rules:\n\
         1. Keep the overall structure and flow of the existing story\n\
         2. Change only what the request asks for\n\
         3. Use language a ten-year-old understands\n\
         4. Keep the investment lesson intact\n\
         5. Keep the JSON field names and shape exactly as given\n\n\
         Return the complete revised story as a JSON array only:\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(category: ModificationType, target_turn: Option<u32>) -> ModificationRequest {
        ModificationRequest {
            raw_text: "rename Bakery to Cafe".to_string(),
            classified_type: category,
            target_turn,
        }
    }

    #[test]
    fn prompt_carries_document_and_request() {
        let prompt = modification_prompt(
            r#"[{"turn": 1}]"#,
            &request(ModificationType::Character, None),
            "This is a new editing session.",
        );
        assert!(prompt.contains(r#"[{"turn": 1}]"#));
        assert!(prompt.contains("rename Bakery to Cafe"));
        assert!(prompt.contains("character names"));
        assert!(prompt.contains("JSON array only"));
    }

    #[test]
    fn narrow_request_names_the_turn() {
        let prompt = modification_prompt(
            "[]",
            &request(ModificationType::Events, Some(3)),
            "This is a new editing session.",
        );
        assert!(prompt.contains("turn 3"));
    }

    #[test]
    fn broad_request_has_no_focus_line() {
        let prompt = modification_prompt(
            "[]",
            &request(ModificationType::General, None),
            "This is a new editing session.",
        );
        assert!(!prompt.contains("Focus the changes"));
    }

    #[test]
    fn summary_takes_last_window_in_order() {
        let history = vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
            "fourth".to_string(),
        ];
        let summary = conversation_summary(&history, 3);
        assert_eq!(summary, "Recent edit requests: second, third, fourth");
    }

    #[test]
    fn empty_history_reads_as_new_session() {
        assert!(conversation_summary(&[], 3).contains("new editing session"));
    }

    #[test]
    fn system_prompt_pins_json_contract() {
        assert!(system_prompt().contains("valid JSON only"));
    }
}
