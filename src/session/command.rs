use crate::effects::mode::{ModeKind, Opacity};
use crate::error::ModeError;

use super::settings::{SettingsStore, UserSettings};
use super::UserId;

/// Text command that changes a user's settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `mode:<name>`
    SetMode(ModeKind),
    /// `opacity:<n>`
    SetOpacity(Opacity),
    /// `reset`
    Reset,
}

impl Command {
    /// Recognizes a settings command in free text
    ///
    /// Returns `None` when `text` is not a command at all, and
    /// `Some(Err(_))` when it is one with a bad argument.
    pub fn parse(text: &str) -> Option<Result<Self, ModeError>> {
        let text = text.trim().to_lowercase();

        if text == "reset" {
            return Some(Ok(Self::Reset));
        }
        if let Some(name) = text.strip_prefix("mode:") {
            return Some(name.trim().parse().map(Self::SetMode));
        }
        if let Some(value) = text.strip_prefix("opacity:") {
            return Some(value.trim().parse().map(Self::SetOpacity));
        }
        None
    }

    /// Confirmation shown to the user once the command is applied
    pub fn reply(self) -> String {
        match self {
            Self::SetMode(mode) => format!("Mode set to {mode}\n{}", mode.description()),
            Self::SetOpacity(opacity) => format!("Opacity set to {opacity}"),
            Self::Reset => "Settings reset to default (full transparency)".to_string(),
        }
    }

    /// Applies the command to `user`'s entry and returns the new settings
    pub fn apply(self, store: &SettingsStore, user: UserId) -> UserSettings {
        tracing::info!(user, command = ?self, "Updating settings");
        match self {
            Self::SetMode(mode) => store.set_mode(user, mode),
            Self::SetOpacity(opacity) => store.set_opacity(user, opacity),
            Self::Reset => store.reset(user),
        }
    }
}
