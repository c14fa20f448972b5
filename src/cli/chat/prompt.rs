use rustyline::{Config, Editor, Result};

use super::conversation_state::UserProfile;

pub fn generate_prompt(profile: Option<&UserProfile>) -> String {
    match profile {
        Some(profile) => format!("{}> ", profile.name),
        None => "> ".to_string(),
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .build();
    Editor::with_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_shows_farmer_name_once_known() {
        let profile = UserProfile {
            name: "Musa".to_string(),
            region: "Kano".to_string(),
        };
        assert_eq!(generate_prompt(Some(&profile)), "Musa> ");
        assert_eq!(generate_prompt(None), "> ");
    }
}
