use std::fmt;
use std::str::FromStr;

use crate::error::ModeError;

/// Background opacity for [`EffectMode::Custom`], in percent
///
/// Always within `1..=99`; the range is enforced at construction, so the
/// engine never sees an out-of-range value and does not clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opacity(u8);

impl Opacity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 99;

    /// Creates an opacity, rejecting values outside `1..=99`
    ///
    /// # Errors
    ///
    /// * `ModeError::OpacityOutOfRange` - When `percent` is 0 or above 99
    pub fn new(percent: u8) -> Result<Self, ModeError> {
        if (Self::MIN..=Self::MAX).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(ModeError::OpacityOutOfRange(u32::from(percent)))
        }
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Opacity {
    type Error = ModeError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl FromStr for Opacity {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: u32 = trimmed
            .parse()
            .map_err(|_| ModeError::InvalidOpacity(trimmed.to_string()))?;
        u8::try_from(value)
            .map_err(|_| ModeError::OpacityOutOfRange(value))
            .and_then(Self::new)
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Name of an effect without its parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModeKind {
    #[default]
    Full,
    Semi,
    Soft,
    Subject,
    Custom,
}

impl ModeKind {
    pub const ALL: [Self; 5] = [
        Self::Full,
        Self::Semi,
        Self::Soft,
        Self::Subject,
        Self::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Semi => "semi",
            Self::Soft => "soft",
            Self::Subject => "subject",
            Self::Custom => "custom",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Full => "Complete background removal (transparent)",
            Self::Semi => "Semi-transparent background (50% opacity)",
            Self::Soft => "Soft edge transparency (feathered)",
            Self::Subject => "Make subject semi-transparent",
            Self::Custom => "Custom opacity level",
        }
    }
}

impl FromStr for ModeKind {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or(ModeError::UnknownMode(name))
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transparency effect applied to an image
///
/// Every mode except `Soft` splits pixels into subject and background with
/// a hard threshold; `Soft` uses the blurred mask as a continuous ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectMode {
    /// Background removed, subject opaque
    #[default]
    Full,
    /// Background at half opacity
    Semi,
    /// Feathered edges from a blurred mask
    Soft,
    /// Subject translucent, background removed
    Subject,
    /// Background at a user-chosen opacity
    Custom(Opacity),
}

impl EffectMode {
    pub fn kind(self) -> ModeKind {
        match self {
            Self::Full => ModeKind::Full,
            Self::Semi => ModeKind::Semi,
            Self::Soft => ModeKind::Soft,
            Self::Subject => ModeKind::Subject,
            Self::Custom(_) => ModeKind::Custom,
        }
    }

    /// Builds a mode from its name and a percent value
    ///
    /// `opacity` is only consulted for [`ModeKind::Custom`].
    ///
    /// # Errors
    ///
    /// * `ModeError::OpacityOutOfRange` - When the kind is `Custom` and the
    ///   opacity is outside `1..=99`
    pub fn from_kind(kind: ModeKind, opacity: u8) -> Result<Self, ModeError> {
        Ok(match kind {
            ModeKind::Full => Self::Full,
            ModeKind::Semi => Self::Semi,
            ModeKind::Soft => Self::Soft,
            ModeKind::Subject => Self::Subject,
            ModeKind::Custom => Self::Custom(Opacity::new(opacity)?),
        })
    }

    /// File name used for the encoded result
    pub fn output_file_name(self) -> String {
        format!("transparent_{}.png", self.kind())
    }
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(opacity) => write!(f, "custom ({opacity})"),
            other => write!(f, "{}", other.kind()),
        }
    }
}
