//! The contract between the engine and a concrete animation.

use crate::color::RgbColor;
use crate::descriptor::AnimationDescriptor;
use crate::error::EngineError;
use crate::keymap::KeyMap;
use ckb_transport::{Transport, TransportError};

/// Lifecycle callbacks of a lighting animation
///
/// The engine owns the keymap and the protocol state; an animation only
/// reacts to callbacks. Every callback except `descriptor` has a no-op
/// default so simple animations only implement what they need.
pub trait Animation {
    /// Identity and metadata reported in info mode
    fn descriptor(&self) -> &AnimationDescriptor;

    /// A `param <name> <value>` line arrived inside a params phase
    fn on_param_changed(&mut self, _name: &str, _value: &str) {}

    /// The host requested a new animation event (often at startup)
    fn on_start(&mut self) {}

    /// The host stopped the event started by `on_start`
    fn on_stop(&mut self) {}

    /// Host time update. The value is passed through unparsed; its unit
    /// depends on the descriptor's `TimeMode`.
    fn on_tick(&mut self, _delta: &str) {}

    /// Render one frame. Return `Ok(false)` to end the run.
    fn on_frame(&mut self, _frame: &mut Frame<'_>) -> Result<bool, EngineError> {
        Ok(true)
    }

    /// A key event resolved to the nearest mapped key
    ///
    /// `state` is the host's state string, `"up"` when the host sent none.
    fn on_key_press(&mut self, _key: &str, _x: i32, _y: i32, _state: &str) {}
}

/// Write handle given to `Animation::on_frame`
///
/// Borrows the engine's keymap read-only and its transport for `argb`
/// output. Lines written here land between `begin frame` and `end frame`.
pub struct Frame<'a> {
    keymap: &'a KeyMap,
    transport: &'a mut dyn Transport,
    emitted: usize,
}

impl<'a> Frame<'a> {
    pub fn new(keymap: &'a KeyMap, transport: &'a mut dyn Transport) -> Self {
        Self {
            keymap,
            transport,
            emitted: 0,
        }
    }

    pub fn keymap(&self) -> &'a KeyMap {
        self.keymap
    }

    /// Layout extent as `(max_x, max_y)`
    pub fn bounds(&self) -> (i32, i32) {
        (self.keymap.max_x(), self.keymap.max_y())
    }

    /// Number of `argb` lines written so far in this frame
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Send an opaque color for `key`.
    pub fn emit_key_color(&mut self, key: &str, color: RgbColor) -> Result<(), TransportError> {
        self.emit_argb(key, color.r, color.g, color.b, 255)
    }

    /// Send `argb <key> <aarrggbb>`.
    pub fn emit_argb(&mut self, key: &str, r: u8, g: u8, b: u8, a: u8) -> Result<(), TransportError> {
        let argb = RgbColor::new(r, g, b).to_argb_hex(a);
        self.transport.send_command(&["argb", key, argb.as_str()])?;
        self.emitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Point;
    use ckb_transport::LineTransport;
    use std::io::Cursor;

    #[test]
    fn test_frame_emits_argb_lines() {
        let mut keymap = KeyMap::new();
        keymap.insert("esc", Point::new(0, 0));
        keymap.insert("enter", Point::new(180, 30));
        let mut transport = LineTransport::new(Cursor::new(Vec::new()), Vec::new());

        let mut frame = Frame::new(&keymap, &mut transport);
        assert_eq!(frame.bounds(), (180, 30));
        assert_eq!(frame.emitted(), 0);
        frame.emit_key_color("esc", RgbColor::RED).unwrap();
        frame.emit_argb("enter", 1, 2, 3, 0x80).unwrap();
        assert_eq!(frame.emitted(), 2);

        let out = String::from_utf8(transport.into_writer()).unwrap();
        assert_eq!(out, "argb esc ffff0000\nargb enter 80010203\n");
    }
}
