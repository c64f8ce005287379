// ckb-anim - Keyframe lighting animation plugin for ckb
// Effect library, configuration and the bundled example animation

pub mod cli;
pub mod config;
pub mod effect;
pub mod logging;
pub mod pulse;

pub use config::PluginConfig;
pub use effect::{EffectError, EffectLibrary};
pub use pulse::PulseAnimation;
