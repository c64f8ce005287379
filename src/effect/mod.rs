//! Keyframe-based colour effects.
//!
//! Effects are defined in TOML with keyframes that give a time (ms), a
//! brightness and an easing to the next keyframe. A colour written as
//! `$name` is a variable, filled in when the effect is resolved.
//!
//! ```toml
//! [breathe]
//! color = "$color"
//! keyframes = [
//!     { t = 0,    v = 0.0, easing = "EaseInOut" },
//!     { t = 1000, v = 1.0, easing = "EaseInOut" },
//!     { t = 2000, v = 0.0 },
//! ]
//! ```

use ckb_engine::RgbColor;
use keyframe::functions as ease;
use keyframe::EasingFunction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Effect library failures
#[derive(Error, Debug)]
pub enum EffectError {
    #[error("Failed to read effects file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid effects TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error("Unresolved variable: ${0}")]
    UnresolvedVariable(String),

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),
}

// ── Definitions ──────────────────────────────────────────────────────

/// Easing applied from one keyframe to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    /// Keep the previous value until the next keyframe
    #[serde(alias = "Step")]
    Hold,
    #[serde(alias = "EaseInQuad")]
    EaseIn,
    #[serde(alias = "EaseOutQuad")]
    EaseOut,
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
}

impl Easing {
    /// Map linear progress in [0, 1] through the easing curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Hold => 0.0,
            Self::EaseIn => ease::EaseIn.y(t),
            Self::EaseOut => ease::EaseOut.y(t),
            Self::EaseInOut => ease::EaseInOut.y(t),
            Self::EaseInCubic => ease::EaseInCubic.y(t),
            Self::EaseOutCubic => ease::EaseOutCubic.y(t),
            Self::EaseInOutCubic => ease::EaseInOutCubic.y(t),
            Self::EaseInQuart => ease::EaseInQuart.y(t),
            Self::EaseOutQuart => ease::EaseOutQuart.y(t),
            Self::EaseInOutQuart => ease::EaseInOutQuart.y(t),
            Self::EaseInQuint => ease::EaseInQuint.y(t),
            Self::EaseOutQuint => ease::EaseOutQuint.y(t),
            Self::EaseInOutQuint => ease::EaseInOutQuint.y(t),
        }
    }
}

/// One effect as written in TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectDef {
    /// Default colour, literal or `$variable`
    pub color: Option<String>,
    #[serde(default)]
    pub keyframes: Vec<KeyframeDef>,
    /// `"rainbow"` rotates the hue over the effect's duration
    pub mode: Option<String>,
    /// Hue turns per cycle in rainbow mode
    pub speed: Option<f32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyframeDef {
    /// Milliseconds from the start of the cycle
    pub t: f64,
    /// Brightness 0.0-1.0
    pub v: f64,
    /// Overrides the effect colour for this keyframe
    pub color: Option<String>,
    #[serde(default)]
    pub easing: Easing,
}

/// Named effects loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectLibrary {
    #[serde(flatten)]
    pub effects: BTreeMap<String, EffectDef>,
}

impl EffectLibrary {
    /// The effects shipped with the plugin.
    pub fn builtin() -> Result<Self, EffectError> {
        Self::from_toml(DEFAULT_EFFECTS_TOML)
    }

    pub fn from_toml(content: &str) -> Result<Self, EffectError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, EffectError> {
        let content = std::fs::read_to_string(path).map_err(|source| EffectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn get(&self, name: &str) -> Option<&EffectDef> {
        self.effects.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.effects.keys().map(String::as_str).collect()
    }

    /// Look up `name` and resolve it with `$color` bound to `color`.
    pub fn resolve_with_color(
        &self,
        name: &str,
        color: RgbColor,
    ) -> Result<ResolvedEffect, EffectError> {
        let def = self
            .get(name)
            .ok_or_else(|| EffectError::UnknownEffect(name.to_string()))?;
        let mut vars = BTreeMap::new();
        vars.insert(
            "color".to_string(),
            format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b),
        );
        resolve(def, &vars)
    }
}

// ── Resolved effects ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResolvedKeyframe {
    pub t_ms: f64,
    pub color: RgbColor,
    pub brightness: f64,
    pub easing: Easing,
}

/// An effect with every variable bound, ready to evaluate
#[derive(Debug, Clone)]
pub struct ResolvedEffect {
    pub keyframes: Vec<ResolvedKeyframe>,
    /// Cycle length in ms; 0 for a constant effect
    pub duration_ms: f64,
    /// Hue turns per cycle when in rainbow mode
    pub rainbow: Option<f32>,
}

impl ResolvedEffect {
    /// Colour at `elapsed_ms` into the cycle (wraps around).
    pub fn evaluate(&self, elapsed_ms: f64) -> RgbColor {
        let Some(first) = self.keyframes.first() else {
            return RgbColor::BLACK;
        };
        if self.duration_ms <= 0.0 || self.keyframes.len() == 1 {
            return match self.rainbow {
                Some(_) => RgbColor::from_hsv(0.0, 1.0, first.brightness as f32),
                None => first.color.scale(first.brightness as f32),
            };
        }

        let t = elapsed_ms.rem_euclid(self.duration_ms);
        let (a, b, progress) = self.segment(t);
        let eased = a.easing.apply(progress);
        let brightness = a.brightness + (b.brightness - a.brightness) * eased;

        match self.rainbow {
            Some(speed) => {
                let hue = (t / self.duration_ms) * 360.0 * speed as f64;
                RgbColor::from_hsv(hue as f32, 1.0, brightness as f32)
            }
            None => {
                let color = match a.easing {
                    Easing::Hold => a.color,
                    _ => RgbColor::lerp(a.color, b.color, progress as f32),
                };
                color.scale(brightness as f32)
            }
        }
    }

    /// Progress is linear in [0, 1] between the keyframes surrounding `t`.
    fn segment(&self, t: f64) -> (&ResolvedKeyframe, &ResolvedKeyframe, f64) {
        let last = &self.keyframes[self.keyframes.len() - 1];
        for pair in self.keyframes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t < b.t_ms {
                let span = b.t_ms - a.t_ms;
                let progress = if span > 0.0 {
                    ((t - a.t_ms) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                return (a, b, progress);
            }
        }
        (last, last, 0.0)
    }
}

/// Bind the variables of `def`.
///
/// A keyframe's own colour beats the effect colour; with neither the
/// keyframe is black.
pub fn resolve(
    def: &EffectDef,
    vars: &BTreeMap<String, String>,
) -> Result<ResolvedEffect, EffectError> {
    let rainbow = match def.mode.as_deref() {
        Some("rainbow") => Some(def.speed.unwrap_or(1.0)),
        _ => None,
    };

    if def.keyframes.is_empty() {
        let color = resolve_color(def.color.as_deref(), vars)?;
        return Ok(ResolvedEffect {
            keyframes: vec![ResolvedKeyframe {
                t_ms: 0.0,
                color,
                brightness: 1.0,
                easing: Easing::Linear,
            }],
            duration_ms: 0.0,
            rainbow,
        });
    }

    let keyframes = def
        .keyframes
        .iter()
        .map(|kf| {
            Ok(ResolvedKeyframe {
                t_ms: kf.t,
                color: resolve_color(kf.color.as_deref().or(def.color.as_deref()), vars)?,
                brightness: kf.v.clamp(0.0, 1.0),
                easing: kf.easing,
            })
        })
        .collect::<Result<Vec<_>, EffectError>>()?;
    let duration_ms = keyframes.last().map_or(0.0, |kf| kf.t_ms);

    Ok(ResolvedEffect {
        keyframes,
        duration_ms,
        rainbow,
    })
}

fn resolve_color(
    color: Option<&str>,
    vars: &BTreeMap<String, String>,
) -> Result<RgbColor, EffectError> {
    let Some(s) = color else {
        return Ok(RgbColor::BLACK);
    };
    let value = match s.strip_prefix('$') {
        Some(var) => vars
            .get(var)
            .ok_or_else(|| EffectError::UnresolvedVariable(var.to_string()))?,
        None => s,
    };
    RgbColor::parse(value).ok_or_else(|| EffectError::InvalidColor(value.to_string()))
}

// ── Built-in effects ─────────────────────────────────────────────────

pub const DEFAULT_EFFECTS_TOML: &str = r##"# ckb-anim effects
# Times are milliseconds within one cycle. The host's `time` value selects
# the position in the cycle, so the absolute length only sets the shape.

[breathe]
color = "$color"
description = "Smooth fade in/out"
keyframes = [
    { t = 0,    v = 0.0, easing = "EaseInOut" },
    { t = 1000, v = 1.0, easing = "EaseInOut" },
    { t = 2000, v = 0.0 },
]

[flash]
color = "$color"
description = "On/off blink"
keyframes = [
    { t = 0,    v = 1.0, easing = "Hold" },
    { t = 500,  v = 0.0, easing = "Hold" },
    { t = 1000, v = 1.0 },
]

[pulse]
color = "$color"
description = "Quick flash then slow fade"
keyframes = [
    { t = 0,   v = 0.0, easing = "EaseOutQuad" },
    { t = 80,  v = 1.0, easing = "EaseInQuint" },
    { t = 800, v = 0.0 },
]

[solid]
color = "$color"
description = "Constant color"

[police]
description = "Red/blue alternating flash"
keyframes = [
    { t = 0,   color = "red",  v = 1.0, easing = "Hold" },
    { t = 200, color = "blue", v = 1.0, easing = "Hold" },
    { t = 400, color = "red",  v = 1.0 },
]

[rainbow]
mode = "rainbow"
speed = 1.0
description = "Hue rotation"
keyframes = [
    { t = 0,    v = 1.0 },
    { t = 3000, v = 1.0 },
]
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> EffectLibrary {
        EffectLibrary::builtin().unwrap()
    }

    #[test]
    fn test_builtin_library() {
        let lib = builtin();
        assert_eq!(
            lib.names(),
            vec!["breathe", "flash", "police", "pulse", "rainbow", "solid"]
        );
        assert_eq!(lib.effects["breathe"].keyframes.len(), 3);
        assert_eq!(lib.effects["pulse"].keyframes[0].easing, Easing::EaseOut);
    }

    #[test]
    fn test_breathe_peaks_mid_cycle() {
        let effect = builtin()
            .resolve_with_color("breathe", RgbColor::WHITE)
            .unwrap();
        assert_eq!(effect.duration_ms, 2000.0);
        assert_eq!(effect.evaluate(0.0), RgbColor::BLACK);
        assert_eq!(effect.evaluate(1000.0), RgbColor::WHITE);
        // Wraps around
        assert_eq!(effect.evaluate(3000.0), RgbColor::WHITE);
    }

    #[test]
    fn test_solid_ignores_time() {
        let effect = builtin()
            .resolve_with_color("solid", RgbColor::GREEN)
            .unwrap();
        assert_eq!(effect.evaluate(0.0), RgbColor::GREEN);
        assert_eq!(effect.evaluate(12345.0), RgbColor::GREEN);
    }

    #[test]
    fn test_police_holds_colors() {
        let effect = builtin()
            .resolve_with_color("police", RgbColor::BLACK)
            .unwrap();
        assert_eq!(effect.evaluate(0.0), RgbColor::RED);
        assert_eq!(effect.evaluate(150.0), RgbColor::RED);
        assert_eq!(effect.evaluate(250.0), RgbColor::BLUE);
    }

    #[test]
    fn test_rainbow_starts_red() {
        let effect = builtin()
            .resolve_with_color("rainbow", RgbColor::BLACK)
            .unwrap();
        assert!(effect.rainbow.is_some());
        assert_eq!(effect.evaluate(0.0), RgbColor::RED);
        assert_eq!(effect.evaluate(1000.0), RgbColor::GREEN);
    }

    #[test]
    fn test_missing_variable() {
        let lib = builtin();
        let err = resolve(lib.get("breathe").unwrap(), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, EffectError::UnresolvedVariable(ref v) if v == "color"));
    }

    #[test]
    fn test_unknown_effect() {
        assert!(matches!(
            builtin().resolve_with_color("disco", RgbColor::RED),
            Err(EffectError::UnknownEffect(_))
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            EffectLibrary::from_toml("[x]\nkeyframes = [{ t = 0, v = 1.0, easing = \"Wobble\" }]"),
            Err(EffectError::Parse(_))
        ));
    }

    #[test]
    fn test_hold_easing() {
        assert_eq!(Easing::Hold.apply(0.5), 0.0);
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
        assert_eq!(Easing::Linear.apply(3.0), 1.0);
    }
}
