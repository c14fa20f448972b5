/// Starter questions offered to a farmer with an empty transcript.
pub const SUGGESTIONS: [(&str, &str); 4] = [
    (
        "Best crops for my region",
        "What are the best crops to grow in my region considering the climate and soil?",
    ),
    (
        "Irrigation methods",
        "What are the most effective irrigation methods for small-scale farming in Nigeria?",
    ),
    (
        "Pest control strategies",
        "How can I protect my crops from common pests and diseases?",
    ),
    (
        "Crop market information",
        "What are the current market trends and prices for agricultural products?",
    ),
];

pub fn ask_usage() -> String {
    format!(
        "Usage: /ask <1-{}>. Type /faq to see the questions.",
        SUGGESTIONS.len()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History,
    Faq,
    /// Submit the numbered suggestion (1-based).
    Ask(usize),
    New,
    Quit,
    Question(String),
    Invalid(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let mut words = input.split_whitespace();

        match words.next() {
            Some("/help") => Command::Help,
            Some("/history") => Command::History,
            Some("/faq") => Command::Faq,
            Some("/new") => Command::New,
            Some("/quit") | Some("/exit") => Command::Quit,
            Some("/ask") => match words.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if (1..=SUGGESTIONS.len()).contains(&n) => Command::Ask(n),
                _ => Command::Invalid(ask_usage()),
            },
            Some(word) if word.starts_with('/') => {
                Command::Invalid(format!("Unknown command {}. Type /help for options.", word))
            }
            _ => Command::Question(input.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_commands() {
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("  /history "), Command::History);
        assert_eq!(Command::parse("/faq"), Command::Faq);
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/ask 3"), Command::Ask(3));
    }

    #[test]
    fn ask_rejects_out_of_range() {
        assert!(matches!(Command::parse("/ask 0"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/ask 5"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/ask two"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/ask"), Command::Invalid(_)));
    }

    #[test]
    fn unknown_slash_word_is_invalid() {
        assert!(matches!(Command::parse("/plant"), Command::Invalid(_)));
    }

    #[test]
    fn anything_else_is_a_question() {
        assert_eq!(
            Command::parse("  How do I store cassava?  "),
            Command::Question("How do I store cassava?".to_string())
        );
        assert_eq!(Command::parse(""), Command::Question(String::new()));
    }
}
