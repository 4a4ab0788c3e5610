use std::collections::HashMap;
use std::sync::{Arc, LockResult, Mutex, MutexGuard, PoisonError};

use crate::effects::mode::{EffectMode, ModeKind, Opacity};
use crate::error::ModeError;

use super::UserId;

/// Opacity stored for users who never chose one
pub const DEFAULT_OPACITY: u8 = 100;

/// Per-user effect preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSettings {
    pub mode: ModeKind,
    pub opacity: u8,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            mode: ModeKind::Full,
            opacity: DEFAULT_OPACITY,
        }
    }
}

impl UserSettings {
    /// Resolves the stored preferences into an effect mode
    ///
    /// # Errors
    ///
    /// * `ModeError::OpacityOutOfRange` - When the mode is `custom` but no
    ///   opacity in `1..=99` has been set
    pub fn effect_mode(&self) -> Result<EffectMode, ModeError> {
        EffectMode::from_kind(self.mode, self.opacity)
    }
}

/// Settings keyed by user id
///
/// Each user's entry sits behind its own lock, so concurrent requests from
/// one user are serialized while different users never wait on each other
/// beyond the map lookup. Entries are created with explicit defaults the
/// first time a user changes a setting; reading or resetting the settings
/// of a user without an entry stores nothing.
#[derive(Debug, Default)]
pub struct SettingsStore {
    entries: Mutex<HashMap<UserId, Arc<Mutex<UserSettings>>>>,
}

fn recover<T>(guard: LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T> {
    guard.unwrap_or_else(PoisonError::into_inner)
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, user: UserId) -> Arc<Mutex<UserSettings>> {
        let mut entries = recover(self.entries.lock());
        Arc::clone(entries.entry(user).or_insert_with(|| {
            tracing::debug!(user, "Creating default settings");
            Arc::new(Mutex::new(UserSettings::default()))
        }))
    }

    fn update<R>(&self, user: UserId, f: impl FnOnce(&mut UserSettings) -> R) -> R {
        let entry = self.entry(user);
        let mut settings = recover(entry.lock());
        f(&mut settings)
    }

    pub fn get(&self, user: UserId) -> UserSettings {
        let entry = recover(self.entries.lock()).get(&user).map(Arc::clone);
        entry.map_or_else(UserSettings::default, |entry| {
            let settings = *recover(entry.lock());
            settings
        })
    }

    pub fn set_mode(&self, user: UserId, mode: ModeKind) -> UserSettings {
        self.update(user, |settings| {
            settings.mode = mode;
            *settings
        })
    }

    /// Stores an opacity and switches the user to `custom` mode
    pub fn set_opacity(&self, user: UserId, opacity: Opacity) -> UserSettings {
        self.update(user, |settings| {
            settings.opacity = opacity.percent();
            settings.mode = ModeKind::Custom;
            *settings
        })
    }

    /// Restores the defaults by forgetting the user's entry
    pub fn reset(&self, user: UserId) -> UserSettings {
        if recover(self.entries.lock()).remove(&user).is_some() {
            tracing::debug!(user, "Removed settings");
        }
        UserSettings::default()
    }

    /// Effect mode the next request from `user` should use
    ///
    /// # Errors
    ///
    /// See [`UserSettings::effect_mode`].
    pub fn effect_mode(&self, user: UserId) -> Result<EffectMode, ModeError> {
        self.get(user).effect_mode()
    }

    /// Number of users with stored settings
    pub fn len(&self) -> usize {
        recover(self.entries.lock()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
