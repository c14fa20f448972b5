pub mod command;
pub mod conversation_state;
pub mod persona;
pub mod prompt;
pub mod session;

use std::io::Write;
use std::process::ExitCode;

use color_print::cformat;
use command::{ask_usage, Command, SUGGESTIONS};
use conversation_state::{ConversationState, Turn};
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use eyre::Result;
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use rustyline::Editor;
use session::SessionController;
use tracing::{debug, error};

use crate::config::{APP_TAGLINE, APP_TITLE, ASSISTANT_NAME};

const HELP_TEXT: &str = "
FarmAssist

/faq          Show frequently asked questions
/ask <n>      Ask frequently asked question number n
/history      Show the conversation so far
/new          Start a new session
/help         Show this help dialogue
/quit         Quit the application
";

const THINKING_TEXT: &str = "FarmAssist is thinking...";

/// What the command line asked for before the chat starts.
#[derive(Debug, Default)]
pub struct ChatOptions {
    pub name: Option<String>,
    pub region: Option<String>,
    /// Ask this one question and exit.
    pub input: Option<String>,
    pub interactive: bool,
}

pub struct ChatContext {
    output: Box<dyn Write>,
    options: ChatOptions,
    conversation_state: ConversationState,
    session: SessionController,
}

impl ChatContext {
    pub fn new(output: Box<dyn Write>, options: ChatOptions, session: SessionController) -> Self {
        Self {
            output,
            options,
            conversation_state: ConversationState::new(),
            session,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if let Some(name) = self.options.name.take() {
            let region = self.options.region.take().unwrap_or_default();
            if let Err(e) = self
                .session
                .set_profile(&mut self.conversation_state, &name, &region)
            {
                writeln!(self.output, "{}", e)?;
                if !self.options.interactive {
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        // Handle non-interactive mode (single query)
        if let Some(input) = self.options.input.take() {
            return match self
                .session
                .handle(&mut self.conversation_state, &input)
                .await
            {
                Ok(turn) => {
                    writeln!(self.output, "{}", turn.answer)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    writeln!(self.output, "{}", e)?;
                    Ok(ExitCode::FAILURE)
                }
            };
        }

        if self.options.interactive {
            self.print_banner()?;
            if self.conversation_state.is_identified() {
                self.print_greeting()?;
            }
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_banner(&mut self) -> Result<()> {
        writeln!(self.output, "{}", cformat!("\n<green,bold>🌿 {} 🌿</>", APP_TITLE))?;
        writeln!(self.output, "{}\n", APP_TAGLINE)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            if !self.conversation_state.is_identified() {
                if !self.collect_profile(&mut rl)? {
                    break;
                }
                self.print_greeting()?;
            }

            let prompt_text = generate_prompt(self.conversation_state.profile());
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if !self.handle_command(Command::parse(&line)).await? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Runs the name/region form until a valid profile is set. Returns false
    /// if the farmer closed the input instead.
    fn collect_profile(&mut self, rl: &mut Editor<()>) -> Result<bool> {
        writeln!(self.output, "Welcome! Let's get FARMiliar! 😜")?;
        writeln!(
            self.output,
            "Please provide your information to get personalized farming advice:\n"
        )?;

        loop {
            let name = match rl.readline("Your first name: ") {
                Ok(name) => name,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(false),
                Err(e) => return Err(e.into()),
            };
            let region = match rl.readline("Your region/state in Nigeria (optional, e.g. Lagos, Kano, Ogun): ") {
                Ok(region) => region,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(false),
                Err(e) => return Err(e.into()),
            };

            match self
                .session
                .set_profile(&mut self.conversation_state, &name, &region)
            {
                Ok(profile) => {
                    writeln!(
                        self.output,
                        "\nWelcome, {}! Ready to help with your farming questions.\n",
                        profile.name
                    )?;
                    return Ok(true);
                }
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    fn print_greeting(&mut self) -> Result<()> {
        if let Some(profile) = self.conversation_state.profile() {
            writeln!(self.output, "Hi {}! How may I assist you today?\n", profile.name)?;
        }
        self.print_suggestions()
    }

    fn print_suggestions(&mut self) -> Result<()> {
        writeln!(self.output, "Frequently Asked Questions (type /ask <n>):")?;
        for (i, (label, _)) in SUGGESTIONS.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, label)?;
        }
        writeln!(self.output, "\nType /help for more options.\n")?;
        Ok(())
    }

    /// Returns false when the loop should stop.
    async fn handle_command(&mut self, command: Command) -> Result<bool> {
        debug!(?command, "Handling input");
        match command {
            Command::Quit => return Ok(false),
            Command::Help => writeln!(self.output, "{}", HELP_TEXT)?,
            Command::Faq => self.print_suggestions()?,
            Command::History => self.print_history()?,
            Command::Ask(n) => match SUGGESTIONS.get(n.wrapping_sub(1)) {
                Some((_, question)) => self.ask(question).await?,
                None => writeln!(self.output, "{}", ask_usage())?,
            },
            Command::Question(question) => self.ask(&question).await?,
            Command::Invalid(message) => writeln!(self.output, "{}", message)?,
            Command::New => {
                self.session.reset(&mut self.conversation_state);
                if let Err(e) = execute!(self.output, Clear(ClearType::All), MoveTo(0, 0)) {
                    error!("Failed to clear the screen: {}", e);
                }
                self.print_banner()?;
            }
        }
        Ok(true)
    }

    async fn ask(&mut self, question: &str) -> Result<()> {
        writeln!(self.output, "{}", cformat!("<dim>{}</>", THINKING_TEXT))?;
        self.output.flush()?;

        match self
            .session
            .handle(&mut self.conversation_state, question)
            .await
        {
            Ok(turn) => {
                let turn = turn.clone();
                self.print_turn(&turn)?;
            }
            Err(e) => writeln!(self.output, "{}", e)?,
        }
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        if self.conversation_state.turns().is_empty() {
            writeln!(self.output, "No questions yet.")?;
            return Ok(());
        }
        let turns = self.conversation_state.turns().to_vec();
        for turn in &turns {
            self.print_turn(turn)?;
        }
        Ok(())
    }

    fn print_turn(&mut self, turn: &Turn) -> Result<()> {
        let farmer = self
            .conversation_state
            .profile()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let time = turn.answered_at.format("%H:%M");

        writeln!(self.output, "{}", cformat!("\n<green,bold>👤 {}</> <dim>{}</>", farmer, time))?;
        writeln!(self.output, "{}", turn.question)?;
        writeln!(self.output, "{}", cformat!("\n<green,bold>🌿 {}</>", ASSISTANT_NAME))?;
        writeln!(self.output, "{}\n", turn.answer)?;
        Ok(())
    }
}
