use std::sync::OnceLock;

use chrono::{DateTime, Local};
use regex::{Captures, Regex};

/// Who the assistant is talking to. Set once per session from the profile
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub region: String,
}

/// One question/answer exchange.
#[derive(Debug, Clone)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub answered_at: DateTime<Local>,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            answered_at: Local::now(),
        }
    }
}

// Timestamps are display-only.
impl PartialEq for Turn {
    fn eq(&self, other: &Self) -> bool {
        self.question == other.question && self.answer == other.answer
    }
}

impl Eq for Turn {}

/// Per-session chat state: the optional profile and the transcript in
/// insertion order. Turns are only ever appended.
#[derive(Debug, Default)]
pub struct ConversationState {
    profile: Option<UserProfile>,
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: UserProfile) -> &UserProfile {
        self.profile.insert(profile)
    }

    pub fn push_turn(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_identified(&self) -> bool {
        self.profile.is_some()
    }

    pub fn clear(&mut self) {
        self.profile = None;
        self.turns.clear();
    }
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\p{Alphabetic}+").expect("static regex is valid"))
}

/// Capitalises the first letter of every run of letters and lowercases the
/// rest, so `"o'NEIL"` becomes `"O'Neil"`.
pub fn title_case(input: &str) -> String {
    word_regex()
        .replace_all(input, |caps: &Captures| {
            let mut chars = caps[0].chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .into_owned()
}
