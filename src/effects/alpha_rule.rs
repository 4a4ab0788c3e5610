use super::mode::EffectMode;

/// Mask intensity at or above which a pixel belongs to the subject
pub const FOREGROUND_THRESHOLD: u8 = 128;

/// Standard deviation of the Gaussian used to feather masks in `Soft` mode
pub const SOFT_EDGE_SIGMA: f32 = 3.0;

/// Background opacity of `Semi` mode, in percent
pub const SEMI_BACKGROUND_PERCENT: u8 = 50;

/// Subject opacity of `Subject` mode, in percent
pub const SUBJECT_PERCENT: u8 = 70;

/// Converts a percentage of full opacity into an 8-bit alpha value
///
/// Truncates toward zero: `floor(255 * percent / 100)`. Integer arithmetic
/// keeps the floor exact, so 50% is 127 and 70% is 178.
#[inline]
pub const fn alpha_from_percent(percent: u8) -> u8 {
    let percent = if percent > 100 { 100 } else { percent };
    (255 * percent as u16 / 100) as u8
}

/// How one mode turns mask intensity into alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaRule {
    /// Hard split at [`FOREGROUND_THRESHOLD`]
    Threshold { foreground: u8, background: u8 },
    /// Mask blurred with the given sigma becomes the alpha channel as-is
    Feathered { sigma: f32 },
}

impl AlphaRule {
    /// Alpha for a single mask intensity
    ///
    /// `Feathered` rules return the intensity unchanged; the blur is a
    /// neighbourhood operation applied to the whole mask beforehand.
    #[inline]
    pub fn alpha_for(self, intensity: u8) -> u8 {
        match self {
            Self::Threshold {
                foreground,
                background,
            } => {
                if intensity >= FOREGROUND_THRESHOLD {
                    foreground
                } else {
                    background
                }
            }
            Self::Feathered { .. } => intensity,
        }
    }
}

impl EffectMode {
    pub fn alpha_rule(self) -> AlphaRule {
        match self {
            Self::Full => AlphaRule::Threshold {
                foreground: u8::MAX,
                background: 0,
            },
            Self::Semi => AlphaRule::Threshold {
                foreground: u8::MAX,
                background: alpha_from_percent(SEMI_BACKGROUND_PERCENT),
            },
            Self::Soft => AlphaRule::Feathered {
                sigma: SOFT_EDGE_SIGMA,
            },
            Self::Subject => AlphaRule::Threshold {
                foreground: alpha_from_percent(SUBJECT_PERCENT),
                background: 0,
            },
            Self::Custom(opacity) => AlphaRule::Threshold {
                foreground: u8::MAX,
                background: alpha_from_percent(100 - opacity.percent()),
            },
        }
    }
}
