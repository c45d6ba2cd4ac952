//! Reply parsing and repair-prompt construction for the retry loop.

use std::fmt::Write;

use serde_json::Value;

/// Fixed instruction closing every repair prompt.
pub const REPAIR_INSTRUCTION: &str = "Return only valid JSON that matches the requested structure. \
Do not add explanations, commentary, or Markdown code fences.";

/// Parses a reply as JSON after trimming it and removing one surrounding
/// Markdown code fence.
///
/// ```
/// use lingua_extraction::extraction::parse_reply;
///
/// let value = parse_reply("```json\n{\"ok\": true}\n```").unwrap();
/// assert_eq!(value["ok"], true);
/// assert!(parse_reply("not json").is_err());
/// ```
pub fn parse_reply(reply: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(reply))
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    // The opening line may carry a language tag such as `json`.
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

/// What stays the same across every repair prompt of one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct RepairContext<'a> {
    /// The caller's original prompt; always repeated in full.
    pub original_prompt: &'a str,
    /// Extra caller guidance, appended last.
    pub repair_instructions: Option<&'a str>,
    /// Schema to restate, when enabled.
    pub schema: Option<&'a Value>,
    /// Longest excerpt of the invalid reply to quote.
    pub excerpt_chars: usize,
}

impl RepairContext<'_> {
    /// Builds the prompt for the next attempt from the rejected reply and
    /// the reason it was rejected.
    ///
    /// ```
    /// use lingua_extraction::extraction::RepairContext;
    ///
    /// let ctx = RepairContext {
    ///     original_prompt: "List three Spanish verbs as JSON.",
    ///     repair_instructions: Some("Use the infinitive form."),
    ///     schema: None,
    ///     excerpt_chars: 2000,
    /// };
    /// let prompt = ctx.build("verbs: ser, estar", "expected value at line 1 column 1");
    /// assert!(prompt.starts_with("List three Spanish verbs as JSON."));
    /// assert!(prompt.ends_with("Use the infinitive form."));
    /// ```
    #[must_use]
    pub fn build(&self, raw_reply: &str, problem: &str) -> String {
        let mut prompt = String::with_capacity(self.original_prompt.len() + raw_reply.len() + 256);

        prompt.push_str(self.original_prompt);
        prompt.push_str("\n\n---\nYour previous response could not be used.\n\n");

        let _ = write!(
            prompt,
            "Previous response:\n{}\n\nProblem:\n{problem}\n\n",
            excerpt(raw_reply, self.excerpt_chars)
        );

        if let Some(schema) = self.schema {
            let schema_str =
                serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
            let _ = write!(prompt, "Expected schema:\n{schema_str}\n\n");
        }

        prompt.push_str(REPAIR_INSTRUCTION);

        if let Some(extra) = self.repair_instructions.filter(|s| !s.trim().is_empty()) {
            prompt.push_str("\n\n");
            prompt.push_str(extra);
        }

        prompt
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
