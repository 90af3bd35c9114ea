//! Terminal prompts for release configuration
//!
//! The channel and release type are collected through selection lists,
//! so invalid values cannot be expressed by construction. CLI flags can
//! pre-answer individual prompts; `--yes` answers all of them.

use crate::core::config::{ReleaseChannel, ReleaseConfig, ReleaseType};
use crate::core::traits::ReleasePrompter;
use dialoguer::{Confirm, Input, Select};
use semver::Version;

/// Answers pre-filled from CLI flags; anything present skips its prompt
#[derive(Debug, Clone, Default)]
pub struct PresetAnswers {
    pub channel: Option<ReleaseChannel>,
    pub release_type: Option<ReleaseType>,
    pub message: Option<String>,
    /// Skip the confirmation gate (CI/CD); the caller must ensure the
    /// channel and release type are preset as well
    pub assume_yes: bool,
}

/// Interactive prompter backed by the terminal
pub struct TerminalPrompter {
    preset: PresetAnswers,
}

impl TerminalPrompter {
    pub fn new(preset: PresetAnswers) -> Self {
        Self { preset }
    }
}

impl ReleasePrompter for TerminalPrompter {
    fn configure(&self) -> anyhow::Result<ReleaseConfig> {
        let channel = match self.preset.channel {
            Some(channel) => channel,
            None => {
                let items: Vec<&str> =
                    ReleaseChannel::ALL.iter().map(|c| c.as_str()).collect();
                let index = Select::new()
                    .with_prompt("To which channel would you like to release?")
                    .items(&items)
                    .default(0)
                    .interact()?;
                ReleaseChannel::ALL[index]
            }
        };

        let message = match &self.preset.message {
            Some(message) => message.clone(),
            None => Input::<String>::new()
                .with_prompt("Short release message")
                .allow_empty(true)
                .interact_text()?,
        };

        let release_type = match self.preset.release_type {
            Some(release_type) => release_type,
            None => {
                let pre_release = Confirm::new()
                    .with_prompt("Is this a pre-release?")
                    .default(true)
                    .interact()?;

                if pre_release {
                    ReleaseType::Prerelease
                } else {
                    let items: Vec<&str> =
                        ReleaseType::STABLE.iter().map(|t| t.as_str()).collect();
                    let index = Select::new()
                        .with_prompt("What kind of release are you performing?")
                        .items(&items)
                        .default(0)
                        .interact()?;
                    ReleaseType::STABLE[index]
                }
            }
        };

        Ok(ReleaseConfig {
            channel,
            release_type,
            message,
        })
    }

    fn confirm_release(
        &self,
        version: &Version,
        channel: ReleaseChannel,
        message: &str,
    ) -> anyhow::Result<bool> {
        if self.preset.assume_yes {
            return Ok(true);
        }

        if !message.is_empty() {
            println!("📋 Release message: {}", message);
        }

        Ok(Confirm::new()
            .with_prompt(format!(
                "You are about to release v{} on channel {}. Proceed?",
                version, channel
            ))
            .default(false)
            .interact()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_preset() -> PresetAnswers {
        PresetAnswers {
            channel: Some(ReleaseChannel::Next),
            release_type: Some(ReleaseType::Minor),
            message: Some("ship it".to_string()),
            assume_yes: true,
        }
    }

    #[test]
    fn test_fully_preset_configure_skips_all_prompts() {
        let prompter = TerminalPrompter::new(full_preset());

        let config = prompter.configure().unwrap();
        assert_eq!(config.channel, ReleaseChannel::Next);
        assert_eq!(config.release_type, ReleaseType::Minor);
        assert_eq!(config.message, "ship it");
    }

    #[test]
    fn test_assume_yes_skips_confirmation() {
        let prompter = TerminalPrompter::new(full_preset());

        let confirmed = prompter
            .confirm_release(
                &Version::parse("1.3.0-next.0").unwrap(),
                ReleaseChannel::Next,
                "ship it",
            )
            .unwrap();
        assert!(confirmed);
    }
}
