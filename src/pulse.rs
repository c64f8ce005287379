//! Example animation: plays a keyframe effect on every key.
//!
//! With `trigger` on, keys stay dark until pressed and then play one cycle
//! of the effect from the moment of the press.

use crate::config::PluginConfig;
use crate::effect::{EffectError, EffectLibrary, ResolvedEffect};
use anyhow::Context;
use ckb_engine::{Animation, AnimationDescriptor, EngineError, Frame, RgbColor};
use std::collections::HashMap;
use tracing::{debug, info, warn};

const MANIFEST: &str = r#"
name = "Keyframe Pulse"
author = "ckb-anim"
version = "0.1"
year = "2016"
license = "GPLv2"
guid = "{6C1A8B2E-3F4D-4E5A-9B7C-2D8E0F1A3B4C}"
description = "Plays a keyframe effect across the keyboard"
kpmode = "position"
time = "duration"
parammode = "live"
preempt = "on"

[[params]]
kind = "string"
name = "effect"
args = ["Effect:", "breathe"]

[[params]]
kind = "argb"
name = "color"
args = ["Color:", "ffffffff"]

[[params]]
kind = "bool"
name = "trigger"
args = ["Restart on key press", "0"]

[[presets]]
name = "Shimmer"
values = ["effect=breathe", "color=ffffffff", "duration=2.0"]

[[presets]]
name = "Rainbow"
values = ["effect=rainbow", "duration=2.0"]

[[presets]]
name = "Police"
values = ["effect=police", "duration=1.0"]

[[presets]]
name = "Typing"
values = ["effect=pulse", "color=ff00ffff", "trigger=1", "duration=0.5"]
"#;

pub struct PulseAnimation {
    descriptor: AnimationDescriptor,
    library: EffectLibrary,
    effect_name: String,
    color: RgbColor,
    effect: ResolvedEffect,
    trigger: bool,
    active: bool,
    /// Host time in units of the animation's duration
    phase: f64,
    /// Phase at which each triggered key was pressed
    key_starts: HashMap<String, f64>,
}

impl PulseAnimation {
    pub fn new(
        library: EffectLibrary,
        effect_name: &str,
        color: RgbColor,
    ) -> Result<Self, EffectError> {
        let descriptor = toml::from_str(MANIFEST)?;
        let effect = library.resolve_with_color(effect_name, color)?;
        Ok(Self {
            descriptor,
            library,
            effect_name: effect_name.to_string(),
            color,
            effect,
            trigger: false,
            active: true,
            phase: 0.0,
            key_starts: HashMap::new(),
        })
    }

    /// Build from the startup config, loading a custom effects file if set.
    pub fn from_config(config: &PluginConfig) -> anyhow::Result<Self> {
        let library = match &config.effects_file {
            Some(path) => EffectLibrary::load(path)?,
            None => EffectLibrary::builtin()?,
        };
        let color = RgbColor::parse(&config.color)
            .with_context(|| format!("invalid color in config: {:?}", config.color))?;
        Ok(Self::new(library, &config.effect, color)?)
    }

    pub fn effect_name(&self) -> &str {
        &self.effect_name
    }

    pub fn color(&self) -> RgbColor {
        self.color
    }

    pub fn trigger(&self) -> bool {
        self.trigger
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn color_for(&self, key: &str) -> RgbColor {
        if !self.active {
            return RgbColor::BLACK;
        }
        let cycle = if self.trigger {
            match self.key_starts.get(key) {
                Some(start) if (0.0..1.0).contains(&(self.phase - start)) => self.phase - start,
                _ => return RgbColor::BLACK,
            }
        } else {
            self.phase.rem_euclid(1.0)
        };
        self.effect.evaluate(cycle * self.effect.duration_ms)
    }
}

impl Animation for PulseAnimation {
    fn descriptor(&self) -> &AnimationDescriptor {
        &self.descriptor
    }

    fn on_param_changed(&mut self, name: &str, value: &str) {
        match name {
            "effect" => match self.library.resolve_with_color(value, self.color) {
                Ok(effect) => {
                    info!("Effect: {value}");
                    self.effect = effect;
                    self.effect_name = value.to_string();
                }
                Err(e) => warn!("Keeping effect {}: {e}", self.effect_name),
            },
            "color" => match RgbColor::parse(value) {
                Some(color) => {
                    self.color = color;
                    match self.library.resolve_with_color(&self.effect_name, color) {
                        Ok(effect) => self.effect = effect,
                        Err(e) => warn!("Re-resolving {}: {e}", self.effect_name),
                    }
                }
                None => warn!("Ignoring invalid color {value:?}"),
            },
            "trigger" => {
                self.trigger = matches!(value, "1" | "true");
                self.key_starts.clear();
            }
            _ => debug!("Unhandled param {name}={value}"),
        }
    }

    fn on_start(&mut self) {
        self.active = true;
        self.phase = 0.0;
        self.key_starts.clear();
    }

    fn on_stop(&mut self) {
        self.active = false;
    }

    fn on_tick(&mut self, delta: &str) {
        match delta.trim().parse::<f64>() {
            Ok(t) if t.is_finite() => self.phase = t,
            _ => warn!("Ignoring time {delta:?}"),
        }
    }

    fn on_frame(&mut self, frame: &mut Frame<'_>) -> Result<bool, EngineError> {
        let keymap = frame.keymap();
        for key in keymap.keys() {
            frame.emit_key_color(key, self.color_for(key))?;
        }
        Ok(true)
    }

    fn on_key_press(&mut self, key: &str, x: i32, y: i32, state: &str) {
        debug!("{key} {x} {y} {state}");
        if self.trigger && state == "down" {
            self.key_starts.insert(key.to_string(), self.phase);
        }
    }
}
