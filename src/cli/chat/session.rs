use thiserror::Error;
use tracing::{debug, info, warn};

use super::conversation_state::{title_case, ConversationState, Turn, UserProfile};
use super::persona::{build_prompt, PERSONA_TEMPLATE};
use crate::config::DEFAULT_REGION;
use crate::gemini_client::CompletionClient;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your name to continue.")]
    BlankName,
    #[error("Please type a question first.")]
    BlankQuestion,
    #[error("Please tell me your name before asking a question.")]
    NoProfile,
    #[error("You are already signed in. Type /new to start a new session.")]
    AlreadyIdentified,
}

/// Drives one conversation: validates input, builds the prompt and records
/// each answered turn. The state itself is owned by the caller.
pub struct SessionController {
    client: CompletionClient,
}

impl SessionController {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Sets the farmer's name and region. A blank region means "Nigeria".
    ///
    /// The profile is fixed once set; only [`reset`](Self::reset) clears it.
    pub fn set_profile<'a>(
        &self,
        state: &'a mut ConversationState,
        name: &str,
        region: &str,
    ) -> Result<&'a UserProfile, ValidationError> {
        if state.is_identified() {
            warn!("Rejected profile change on an active session");
            return Err(ValidationError::AlreadyIdentified);
        }

        let name = name.trim();
        if name.is_empty() {
            warn!("Rejected profile with blank name");
            return Err(ValidationError::BlankName);
        }

        let region = match region.trim() {
            "" => DEFAULT_REGION.to_string(),
            region => title_case(region),
        };

        let profile = state.set_profile(UserProfile {
            name: title_case(name),
            region,
        });
        info!(name = %profile.name, region = %profile.region, "Session started");
        Ok(profile)
    }

    /// Asks the assistant `question` and appends the answered turn.
    ///
    /// Fallback text from the completion client still counts as an answer.
    /// Taking the state mutably keeps one call in flight per session.
    pub async fn handle<'a>(
        &self,
        state: &'a mut ConversationState,
        question: &str,
    ) -> Result<&'a Turn, ValidationError> {
        let question = question.trim();
        if question.is_empty() {
            warn!("Rejected blank question");
            return Err(ValidationError::BlankQuestion);
        }

        let profile = state.profile().ok_or(ValidationError::NoProfile)?;
        let prompt = build_prompt(&profile.name, &profile.region, question, state.turns());
        debug!(
            template_version = PERSONA_TEMPLATE.version,
            turns = state.turns().len(),
            "Built prompt"
        );

        let answer = self.client.complete(&prompt).await;

        Ok(state.push_turn(Turn::new(question, answer)))
    }

    /// Returns the session to its initial, unidentified state.
    pub fn reset(&self, state: &mut ConversationState) {
        state.clear();
        info!("Session reset");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::gemini_client::{CompletionProvider, ProviderError, FALLBACK_REPLY};

    /// Replies with canned text and remembers every prompt it saw.
    #[derive(Clone, Default)]
    struct StubProvider {
        reply: Option<&'static str>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl StubProvider {
        fn replying(text: &'static str) -> Self {
            Self {
                reply: Some(text),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for StubProvider {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => Err(ProviderError::MalformedResponse("stub failure".to_string())),
            }
        }
    }

    fn controller(provider: StubProvider) -> SessionController {
        SessionController::new(CompletionClient::new(provider))
    }

    fn identified(controller: &SessionController) -> ConversationState {
        let mut state = ConversationState::new();
        controller.set_profile(&mut state, "musa", "kano").unwrap();
        state
    }

    #[test]
    fn set_profile_title_cases_name_and_region() {
        let controller = controller(StubProvider::default());
        let mut state = ConversationState::new();

        let profile = controller
            .set_profile(&mut state, "  adaobi  ", "enugu state")
            .unwrap();
        assert_eq!(profile.name, "Adaobi");
        assert_eq!(profile.region, "Enugu State");
    }

    #[test]
    fn set_profile_defaults_blank_region() {
        let controller = controller(StubProvider::default());
        for region in ["", "   ", "\t"] {
            let mut state = ConversationState::new();
            let profile = controller.set_profile(&mut state, "Musa", region).unwrap();
            assert_eq!(profile.region, "Nigeria");
        }
    }

    #[test]
    fn set_profile_rejects_blank_name() {
        let controller = controller(StubProvider::default());
        let mut state = ConversationState::new();

        let err = controller.set_profile(&mut state, "   ", "Kano").unwrap_err();
        assert_eq!(err, ValidationError::BlankName);
        assert!(state.profile().is_none());
    }

    #[tokio::test]
    async fn profile_cannot_change_mid_session() {
        let controller = controller(StubProvider::replying("Sure."));
        let mut state = identified(&controller);
        controller.handle(&mut state, "q1").await.unwrap();

        let err = controller.set_profile(&mut state, "ada", "lagos").unwrap_err();
        assert_eq!(err, ValidationError::AlreadyIdentified);

        let profile = state.profile().unwrap();
        assert_eq!(profile.name, "Musa");
        assert_eq!(profile.region, "Kano");
        assert_eq!(state.turns().len(), 1);

        controller.reset(&mut state);
        let profile = controller.set_profile(&mut state, "ada", "lagos").unwrap();
        assert_eq!(profile.name, "Ada");
    }

    #[tokio::test]
    async fn blank_questions_are_rejected_without_calling_provider() {
        let provider = StubProvider::replying("unused");
        let controller = controller(provider.clone());
        let mut state = identified(&controller);

        for question in ["", "   "] {
            let err = controller.handle(&mut state, question).await.unwrap_err();
            assert_eq!(err, ValidationError::BlankQuestion);
        }
        assert!(state.turns().is_empty());
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn answered_question_is_appended() {
        let controller = controller(StubProvider::replying("Plant maize and rice."));
        let mut state = identified(&controller);

        controller
            .handle(&mut state, "What crops suit the rainy season?")
            .await
            .unwrap();

        assert_eq!(state.turns().len(), 1);
        assert_eq!(
            state.turns().last().unwrap(),
            &Turn::new("What crops suit the rainy season?", "Plant maize and rice.")
        );
    }

    #[tokio::test]
    async fn provider_failure_records_fallback_answer() {
        let controller = controller(StubProvider::failing());
        let mut state = identified(&controller);

        let turn = controller.handle(&mut state, "Is it going to rain?").await.unwrap();
        assert_eq!(turn.answer, FALLBACK_REPLY);
        assert_eq!(state.turns().len(), 1);
    }

    #[tokio::test]
    async fn history_is_replayed_into_next_prompt() {
        let provider = StubProvider::replying("Use mulch.");
        let controller = controller(provider.clone());
        let mut state = identified(&controller);

        controller.handle(&mut state, "How do I keep soil moist?").await.unwrap();
        controller.handle(&mut state, "What else?").await.unwrap();

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("Farmer: How do I keep soil moist?"));
        assert!(prompts[1].contains("Farmer: How do I keep soil moist?\nFarmAssist: Use mulch.\n"));
        assert!(prompts[1].contains("a farmer named Musa in Kano."));
    }

    #[tokio::test]
    async fn question_without_profile_is_rejected() {
        let provider = StubProvider::replying("unused");
        let controller = controller(provider.clone());
        let mut state = ConversationState::new();

        let err = controller.handle(&mut state, "Hello?").await.unwrap_err();
        assert_eq!(err, ValidationError::NoProfile);
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn reset_behaves_like_a_fresh_session() {
        let controller = controller(StubProvider::replying("Sure."));
        let mut state = identified(&controller);
        controller.handle(&mut state, "Hello?").await.unwrap();

        controller.reset(&mut state);
        assert!(state.profile().is_none());
        assert!(state.turns().is_empty());

        let mut fresh = ConversationState::new();
        let after_reset = controller.handle(&mut state, "Hello?").await.unwrap_err();
        let from_fresh = controller.handle(&mut fresh, "Hello?").await.unwrap_err();
        assert_eq!(after_reset, from_fresh);
    }
}
