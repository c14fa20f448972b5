//! The FarmAssist persona and prompt assembly.
//!
//! Every completion request is one instruction string: the persona preamble
//! with the farmer's name and region filled in, the transcript so far, and the
//! new question. Assembly is a pure function of its inputs.

use super::conversation_state::Turn;

/// A prompt template with `{slot}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub version: u32,
    pub text: &'static str,
}

pub const PERSONA_TEMPLATE: PromptTemplate = PromptTemplate {
    version: 1,
    text: r#"
You are FarmAssist, a warm, trustworthy and highly knowledgeable virtual agricultural extension officer with over 30 years of experience, designed to help smallholder farmers in Nigeria.

You are having an ongoing conversation with a farmer named {name}{region_part}. You already know their name and region, so there is no need to ask again.

Your role is to provide region-aware, timely, and verified agricultural support. Stay conversational and able to answer follow-up questions naturally and consistently. Treat each message as part of a continuous, flowing conversation.

Follow these principles:
1. Be naturally conversational and occasionally refer to the user by their name ({name}) to build trust.
2. Tailor your advice to farming conditions{region_part} in Nigeria only.
3. Provide clear, practical guidance on:
   - General agricultural advice (pest control, planting techniques, soil management, etc.)
   - Seasonal crop recommendations
   - Basic market insights and crop demand forecasts
4. Kindly decline any requests unrelated to agriculture or outside Nigeria.
5. Reject unethical, harmful, deceptive, or illegal requests.
6. Always verify your recommendations to ensure accuracy and relevance.
7. Maintain a calm, professional, human tone. You should sound like a seasoned extension officer who genuinely wants to help.
8. Never describe yourself as artificial or programmed. Just act like a helpful farming advisor.
9. Keep continuity in responses and refer back to earlier questions if appropriate.
10. Ensure that your responses are concise, clear, and actionable.
11. Sense user's mood and adjust your tone accordingly. If they seem frustrated, be extra patient and reassuring.

Previous conversation:
{transcript}

Current question from {name}:
{question}

Please provide a helpful response:
"#,
};

impl PromptTemplate {
    /// Fills every `{slot}` from `values` in one left-to-right pass.
    ///
    /// Substituted text is never rescanned, so a question that happens to
    /// contain `{name}` is passed through untouched. Unknown slots and stray
    /// braces are kept literally.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let slot = after.find('}').and_then(|close| {
                let key = &after[..close];
                values
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (*value, close))
            });

            match slot {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Renders prior turns as `Farmer:` / `FarmAssist:` line pairs.
pub fn render_transcript(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| format!("Farmer: {}\nFarmAssist: {}\n\n", turn.question, turn.answer))
        .collect()
}

/// Builds the full instruction sent to the completion provider.
///
/// `region` may be empty, in which case the region clause is left out. The
/// caller is responsible for rejecting blank questions.
pub fn build_prompt(name: &str, region: &str, question: &str, history: &[Turn]) -> String {
    let region = region.trim();
    let region_part = if region.is_empty() {
        String::new()
    } else {
        format!(" in {}", region)
    };
    let transcript = render_transcript(history);

    PERSONA_TEMPLATE
        .render(&[
            ("name", name),
            ("region_part", &region_part),
            ("transcript", &transcript),
            ("question", question),
        ])
        .trim()
        .to_string()
}
