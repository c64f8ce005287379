//! Protocol engine for ckb keyboard animation plugins
//!
//! Sits on top of `ckb-transport` and provides:
//!
//! - `KeyMap` and the nearest-key `resolver`
//! - the `Animation` contract and the `Frame` write handle
//! - `AnimationDescriptor`, the info-mode self description
//! - `Engine`, the handshake and run state machines
//!
//! ```no_run
//! use ckb_engine::{AnimationDescriptor, Animation, Engine};
//! use ckb_transport::StdioTransport;
//!
//! struct Idle(AnimationDescriptor);
//!
//! impl Animation for Idle {
//!     fn descriptor(&self) -> &AnimationDescriptor {
//!         &self.0
//!     }
//! }
//!
//! let mut engine = Engine::new(StdioTransport::stdio(), Idle(AnimationDescriptor::default()));
//! let outcome = engine.run()?;
//! std::process::exit(outcome.exit_code().into());
//! # Ok::<(), ckb_engine::EngineError>(())
//! ```

pub mod animation;
pub mod color;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod keymap;
pub mod resolver;

pub use animation::{Animation, Frame};
pub use color::RgbColor;
pub use descriptor::{
    AnimationDescriptor, KeyPositionMode, ParamKind, ParamMode, ParamSpec, Preempt, Preset,
    TimeMode,
};
pub use engine::{Engine, RunOutcome, RunState, DEFAULT_KEY_STATE};
pub use error::{EngineError, ResolutionError};
pub use keymap::{KeyMap, Point};
