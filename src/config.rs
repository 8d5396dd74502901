use std::path::Path;

use crate::foundation::error::{PromptError, PromptResult};

/// Words-per-minute bounds for the pacing clock.
pub const WPM_MIN: u32 = 50;
pub const WPM_MAX: u32 = 1000;

/// Configured (pre-scaling) overlay font size bounds in pixels.
pub const FONT_SIZE_MIN: u32 = 40;
pub const FONT_SIZE_MAX: u32 = 300;

/// Non-core chrome theme. Carried for config compatibility; it has no
/// effect on pacing, compositing, or recording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Glass,
}

/// Operator-facing teleprompter configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PrompterConfig {
    /// Pacing rate in words per minute, `[50, 1000]`.
    pub wpm: u32,
    /// Overlay font size in pixels at the reference viewport width, `[40, 300]`.
    pub font_size_px: u32,
    /// Highlight the ORP character; when false the word is drawn plain.
    pub show_orp: bool,
    pub theme: Theme,
    /// Operator viewport width the overlay scale is computed against.
    pub reference_viewport_width: f32,
}

impl Default for PrompterConfig {
    fn default() -> Self {
        Self {
            wpm: 250,
            font_size_px: 120,
            show_orp: true,
            theme: Theme::Dark,
            reference_viewport_width: 1280.0,
        }
    }
}

impl PrompterConfig {
    pub fn validate(&self) -> PromptResult<()> {
        if !(WPM_MIN..=WPM_MAX).contains(&self.wpm) {
            return Err(PromptError::validation(format!(
                "wpm must be within [{WPM_MIN}, {WPM_MAX}], got {}",
                self.wpm
            )));
        }
        if !(FONT_SIZE_MIN..=FONT_SIZE_MAX).contains(&self.font_size_px) {
            return Err(PromptError::validation(format!(
                "font_size_px must be within [{FONT_SIZE_MIN}, {FONT_SIZE_MAX}], got {}",
                self.font_size_px
            )));
        }
        if !self.reference_viewport_width.is_finite() || self.reference_viewport_width <= 0.0 {
            return Err(PromptError::validation(
                "reference_viewport_width must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Return a copy with all bounded fields clamped into range.
    pub fn clamped(mut self) -> Self {
        self.wpm = self.wpm.clamp(WPM_MIN, WPM_MAX);
        self.font_size_px = self.font_size_px.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX);
        self
    }

    /// Load configuration from a JSON file.
    pub fn load_json(path: &Path) -> PromptResult<Self> {
        use anyhow::Context as _;
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .map_err(|e| PromptError::validation(format!("config parse failed: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        PrompterConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_catches_out_of_range() {
        let mut cfg = PrompterConfig::default();
        cfg.wpm = 10;
        assert!(cfg.validate().is_err());

        let mut cfg = PrompterConfig::default();
        cfg.font_size_px = 9999;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn clamped_pulls_into_bounds() {
        let cfg = PrompterConfig {
            wpm: 5000,
            font_size_px: 1,
            ..Default::default()
        }
        .clamped();
        assert_eq!(cfg.wpm, WPM_MAX);
        assert_eq!(cfg.font_size_px, FONT_SIZE_MIN);
        cfg.validate().unwrap();
    }

    #[test]
    fn json_roundtrip_with_defaults() {
        let cfg: PrompterConfig = serde_json::from_str(r#"{"wpm": 300, "theme": "glass"}"#).unwrap();
        assert_eq!(cfg.wpm, 300);
        assert_eq!(cfg.theme, Theme::Glass);
        assert_eq!(cfg.font_size_px, 120);

        let s = serde_json::to_string(&cfg).unwrap();
        let de: PrompterConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(de, cfg);
    }
}
